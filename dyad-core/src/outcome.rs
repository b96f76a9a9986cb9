use crate::response::Response;
use crate::stimulus::Condition;

/// Signal-detection outcome of one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Hit,
    Miss,
    FalseAlarm,
    CorrectReject,
    NoResponse,
}

impl Outcome {
    /// Total classification over (condition, response).
    ///
    /// A press of the signal-matching button ("yes") on a signal trial is a
    /// hit; on a noise trial, a false alarm. Any other press counts against
    /// the signal. An expired window classifies as `NoResponse` regardless of
    /// condition.
    pub fn classify(condition: Condition, response: Response) -> Outcome {
        match (condition, response) {
            (_, Response::NoResponse) => Outcome::NoResponse,
            (Condition::Signal, Response::Yes) => Outcome::Hit,
            (Condition::Signal, _) => Outcome::Miss,
            (Condition::Noise, Response::Yes) => Outcome::FalseAlarm,
            (Condition::Noise, _) => Outcome::CorrectReject,
        }
    }

    /// Hits and correct rejects are the correct outcomes; everything else is
    /// not. Overall accuracy is the fraction of correct outcomes.
    pub fn is_correct(self) -> bool {
        matches!(self, Outcome::Hit | Outcome::CorrectReject)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Hit => "hit",
            Outcome::Miss => "miss",
            Outcome::FalseAlarm => "false-alarm",
            Outcome::CorrectReject => "correct-reject",
            Outcome::NoResponse => "no-response",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        assert_eq!(
            Outcome::classify(Condition::Signal, Response::Yes),
            Outcome::Hit
        );
        assert_eq!(
            Outcome::classify(Condition::Signal, Response::No),
            Outcome::Miss
        );
        assert_eq!(
            Outcome::classify(Condition::Noise, Response::Yes),
            Outcome::FalseAlarm
        );
        assert_eq!(
            Outcome::classify(Condition::Noise, Response::No),
            Outcome::CorrectReject
        );
        assert_eq!(
            Outcome::classify(Condition::Signal, Response::NoResponse),
            Outcome::NoResponse
        );
        assert_eq!(
            Outcome::classify(Condition::Noise, Response::NoResponse),
            Outcome::NoResponse
        );
    }

    #[test]
    fn classification_is_total() {
        let conditions = [Condition::Signal, Condition::Noise];
        let responses = [
            Response::Yes,
            Response::No,
            Response::Left,
            Response::Right,
            Response::NoResponse,
        ];
        for c in conditions {
            for r in responses {
                // must not panic for any combination
                let _ = Outcome::classify(c, r);
            }
        }
    }

    #[test]
    fn only_hit_and_correct_reject_count_as_correct() {
        assert!(Outcome::Hit.is_correct());
        assert!(Outcome::CorrectReject.is_correct());
        assert!(!Outcome::Miss.is_correct());
        assert!(!Outcome::FalseAlarm.is_correct());
        assert!(!Outcome::NoResponse.is_correct());
    }

    #[test]
    fn display_matches_analysis_labels() {
        assert_eq!(Outcome::FalseAlarm.to_string(), "false-alarm");
        assert_eq!(Outcome::NoResponse.to_string(), "no-response");
    }
}
