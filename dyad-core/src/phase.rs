/// Per-trial presentation phases.
///
/// Every trial walks Baseline -> Decision -> Feedback -> Complete. Input is
/// polled only during Decision, and only Decision may end before its frame
/// budget is spent (a captured response closes the window early). The other
/// phases always run their full budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    Baseline,
    Decision,
    Feedback,
    Complete,
}

impl Default for TrialPhase {
    fn default() -> Self {
        TrialPhase::Baseline
    }
}

impl TrialPhase {
    pub fn next(self) -> TrialPhase {
        use TrialPhase::*;
        match self {
            Baseline => Decision,
            Decision => Feedback,
            Feedback => Complete,
            Complete => Complete,
        }
    }

    /// Whether the acting participant's button box is polled in this phase.
    pub fn polls_input(self) -> bool {
        matches!(self, TrialPhase::Decision)
    }

    /// Whether a captured response ends the phase before its budget runs out.
    pub fn may_end_early(self) -> bool {
        matches!(self, TrialPhase::Decision)
    }
}

/// How long a phase is presented: a literal frame count, or a wall-clock
/// interval converted to frames at the session refresh rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseBudget {
    Frames(u64),
    Seconds(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order_and_complete_is_terminal() {
        let mut phase = TrialPhase::default();
        assert_eq!(phase, TrialPhase::Baseline);
        phase = phase.next();
        assert_eq!(phase, TrialPhase::Decision);
        phase = phase.next();
        assert_eq!(phase, TrialPhase::Feedback);
        phase = phase.next();
        assert_eq!(phase, TrialPhase::Complete);
        assert_eq!(phase.next(), TrialPhase::Complete);
    }

    #[test]
    fn only_decision_polls_and_ends_early() {
        for phase in [
            TrialPhase::Baseline,
            TrialPhase::Decision,
            TrialPhase::Feedback,
            TrialPhase::Complete,
        ] {
            assert_eq!(phase.polls_input(), phase == TrialPhase::Decision);
            assert_eq!(phase.may_end_early(), phase == TrialPhase::Decision);
        }
    }
}
