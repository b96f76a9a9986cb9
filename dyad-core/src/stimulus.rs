use serde::{Deserialize, Serialize};

use crate::response::Response;

/// Signal-detection condition for the grating task: a vertical grating is
/// either embedded in the noise patch or absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Signal,
    Noise,
}

/// Net motion direction of the dot field in the random-dot task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn as_response(self) -> Response {
        match self {
            Direction::Left => Response::Left,
            Direction::Right => Response::Right,
        }
    }
}

/// What the decision interval shows, per trial. Rendering is delegated to the
/// frontend; this only carries the trial-level parameters it needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StimulusSpec {
    /// Dynamic noise circle, with or without the embedded grating.
    Grating { condition: Condition },
    /// Moving dot field. `patch` selects one of the frontend's pre-built
    /// interchangeable dot fields for this interval.
    RandomDots { direction: Direction, patch: usize },
}

impl StimulusSpec {
    pub fn condition(&self) -> Option<Condition> {
        match self {
            StimulusSpec::Grating { condition } => Some(*condition),
            StimulusSpec::RandomDots { .. } => None,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            StimulusSpec::Grating { .. } => None,
            StimulusSpec::RandomDots { direction, .. } => Some(*direction),
        }
    }

    /// The response that counts as correct for this stimulus.
    pub fn expected_response(&self) -> Response {
        match self {
            StimulusSpec::Grating {
                condition: Condition::Signal,
            } => Response::Yes,
            StimulusSpec::Grating {
                condition: Condition::Noise,
            } => Response::No,
            StimulusSpec::RandomDots { direction, .. } => direction.as_response(),
        }
    }

    pub fn is_correct(&self, response: Response) -> bool {
        response == self.expected_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_response_per_stimulus() {
        let signal = StimulusSpec::Grating {
            condition: Condition::Signal,
        };
        let noise = StimulusSpec::Grating {
            condition: Condition::Noise,
        };
        let left = StimulusSpec::RandomDots {
            direction: Direction::Left,
            patch: 0,
        };
        assert_eq!(signal.expected_response(), Response::Yes);
        assert_eq!(noise.expected_response(), Response::No);
        assert_eq!(left.expected_response(), Response::Left);
    }

    #[test]
    fn no_response_is_never_correct() {
        let stim = StimulusSpec::RandomDots {
            direction: Direction::Right,
            patch: 1,
        };
        assert!(stim.is_correct(Response::Right));
        assert!(!stim.is_correct(Response::Left));
        assert!(!stim.is_correct(Response::NoResponse));
    }
}
