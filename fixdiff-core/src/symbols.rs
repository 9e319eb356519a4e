//! Prefix characters and colors for rendering edits, mirroring the
//! teacher's `ElementChange` convention: value-only coloring, one glyph per
//! change kind.

use owo_colors::{OwoColorize, Style};

use crate::edit::Action;

/// The glyph an edit's action renders with.
pub const fn prefix(action: Action) -> char {
    match action {
        Action::Delete => '-',
        Action::Insert => '+',
        Action::Update => '~',
        Action::Move => '→',
    }
}

/// The style an edit's action renders with. Coloring applies to the value
/// text only, never to surrounding structure/punctuation.
pub fn style(action: Action) -> Style {
    match action {
        Action::Delete => Style::new().red(),
        Action::Insert => Style::new().green(),
        Action::Update => Style::new().yellow(),
        Action::Move => Style::new().blue(),
    }
}

/// Render `text` with the color for `action`, prefixed by its glyph.
pub fn render(action: Action, text: &str) -> String {
    format!("{} {}", prefix(action), text.style(style(action)))
}
