//! A total order on `RuntimeComparison`s (closer to the reference is
//! "greater"), and the aggregate verdict over a whole test battery.

use std::cmp::Ordering;

use crate::runtime::RuntimeComparison;

impl RuntimeComparison {
    /// Quality key used for `cmp_quality`: completion, then test pass,
    /// then how far the deviation point reaches into the reference trace.
    /// Two comparisons tie when both pass (the deviation point stops
    /// mattering once the candidate is already correct) or when all three
    /// keys are equal.
    fn quality_key(&self) -> (u8, u8, Option<usize>) {
        let deviation = if self.passed() { None } else { self.deviation_point_dest() };
        (self.completed() as u8, self.passed() as u8, deviation)
    }

    /// Compares two comparisons of the same destination and test: `self`
    /// is "better" (greater) the closer it gets to the reference.
    pub fn cmp_quality(&self, other: &Self) -> Ordering {
        self.quality_key().cmp(&other.quality_key())
    }
}

/// The aggregate effect of a candidate repair across a battery of tests,
/// each compared pairwise against a baseline.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Worse,
    Same,
    Mixed,
    Better,
}

/// Compares two equal-length lists of per-test `RuntimeComparison`s (same
/// destination and tests, different candidate source trees) and reports
/// the aggregate effect of switching from `old` to `new`.
pub fn compare_comparisons(old: &[RuntimeComparison], new: &[RuntimeComparison]) -> Effect {
    let mut better = 0usize;
    let mut worse = 0usize;
    for (o, n) in old.iter().zip(new.iter()) {
        match n.cmp_quality(o) {
            Ordering::Greater => better += 1,
            Ordering::Less => worse += 1,
            Ordering::Equal => {}
        }
    }
    match (better > 0, worse > 0) {
        (true, true) => Effect::Mixed,
        (true, false) => Effect::Better,
        (false, true) => Effect::Worse,
        (false, false) => Effect::Same,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ExecutionTrace, RunOutcome};
    use fixdiff_core::Mapping;

    fn comparison(passed: bool, deviation: Option<usize>) -> RuntimeComparison {
        let mapping = Mapping::new();
        let ops = vec![];
        let mut cmp = RuntimeComparison::from_traces(
            "t",
            ExecutionTrace {
                ops: ops.clone(),
                outcome: RunOutcome::Completed,
                passed,
            },
            ExecutionTrace {
                ops,
                outcome: RunOutcome::Completed,
                passed: true,
            },
            &mapping,
        );
        // Directly force the deviation cursor for tests that don't need a
        // full traced example.
        cmp.force_deviation_for_test(deviation);
        cmp
    }

    #[test]
    fn passing_beats_failing() {
        let failing = comparison(false, Some(0));
        let passing = comparison(true, None);
        assert_eq!(passing.cmp_quality(&failing), Ordering::Greater);
    }

    #[test]
    fn deeper_deviation_point_is_better_among_failures() {
        let shallow = comparison(false, Some(1));
        let deep = comparison(false, Some(5));
        assert_eq!(deep.cmp_quality(&shallow), Ordering::Greater);
    }

    #[test]
    fn aggregate_effect_requires_no_regressions_for_better() {
        let baseline = vec![comparison(false, Some(1)), comparison(false, Some(2))];
        let improved = vec![comparison(false, Some(3)), comparison(false, Some(2))];
        assert_eq!(compare_comparisons(&baseline, &improved), Effect::Better);

        let mixed = vec![comparison(false, Some(0)), comparison(false, Some(9))];
        assert_eq!(compare_comparisons(&baseline, &mixed), Effect::Mixed);
    }
}
