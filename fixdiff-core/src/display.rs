//! Printable forms for edits and edit scripts, for diagnostics and tests.

use std::fmt;

use crate::edit::{Edit, EditScript};
use crate::symbols;

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match &self.rename {
            Some(r) => format!("{} ({} -> {})", self.node_id, r.old_name, r.new_name),
            None => format!("{}", self.node_id),
        };
        write!(f, "{}", symbols::render(self.action, &text))
    }
}

impl fmt::Display for EditScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for edit in &self.edits {
            writeln!(f, "{edit}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::Action;
    use crate::node::NodeId;

    #[test]
    fn renders_one_edit_per_line() {
        let mut script = EditScript::default();
        script.push(Edit::update(NodeId(1), NodeId(2)));
        let rendered = script.to_string();
        assert_eq!(rendered.lines().count(), 1);
        assert!(rendered.contains('~'));
        let _ = Action::Update;
    }
}
