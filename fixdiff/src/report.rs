//! Human-readable description of a `RuntimeComparison` and of how it
//! improves or regresses relative to a baseline. Presentation of already-
//! computed data, not a rendering subsystem: no CLI framing lives here.

use std::fmt;

use crate::ordering::Effect;
use crate::runtime::RuntimeComparison;

impl fmt::Display for RuntimeComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.completed() {
            return write!(f, "{}: did not complete", self.test);
        }
        if self.passed() {
            return write!(f, "{}: passed", self.test);
        }
        match self.get_last_matching_expression() {
            Some(expr) => write!(f, "{}: failed, matched the reference up to {expr}", self.test),
            None => write!(f, "{}: failed, diverged from the first tracked expression", self.test),
        }
    }
}

impl RuntimeComparison {
    /// A short English description of how `self` compares to `baseline`.
    pub fn describe_improvement_or_regression(&self, baseline: &RuntimeComparison) -> String {
        match self.cmp_quality(baseline) {
            std::cmp::Ordering::Greater => self.describe_improvement(baseline),
            std::cmp::Ordering::Less => format!(
                "regressed: {} now {}",
                self.test,
                if !self.completed() { "does not complete" } else { "matches the reference less closely" }
            ),
            std::cmp::Ordering::Equal => format!("no change for {}", self.test),
        }
    }

    fn describe_improvement(&self, baseline: &RuntimeComparison) -> String {
        if self.passed() {
            return format!("fixed: {} now passes", self.test);
        }
        match (baseline.get_last_matching_expression(), self.get_last_matching_expression()) {
            (_, Some(expr)) => format!("improved: {} now matches the reference up to {expr}", self.test),
            _ => format!("improved: {} gets further before diverging", self.test),
        }
    }
}

/// A one-line summary of an `Effect`, for a repair-ranking report.
pub fn describe_effect(effect: Effect) -> &'static str {
    match effect {
        Effect::Better => "better",
        Effect::Worse => "worse",
        Effect::Mixed => "mixed",
        Effect::Same => "the same",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ExecutionTrace, RunOutcome};
    use fixdiff_core::Mapping;

    #[test]
    fn identical_comparison_reports_no_change() {
        let mapping = Mapping::new();
        let cmp = RuntimeComparison::from_traces(
            "f(3)==6",
            ExecutionTrace { ops: vec![], outcome: RunOutcome::Completed, passed: false },
            ExecutionTrace { ops: vec![], outcome: RunOutcome::Completed, passed: true },
            &mapping,
        );
        assert_eq!(cmp.describe_improvement_or_regression(&cmp), format!("no change for {}", cmp.test));
    }
}
