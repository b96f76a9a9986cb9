use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use dyad_core::{ParticipantId, RolePair};

/// Pre-drawn acting order for a run of trials.
///
/// The whole sequence is drawn before the first trial so the turn order is
/// fixed once the block starts. Lookup is total: asking past the planned
/// length wraps around instead of running out, which keeps a trial-count
/// mismatch from killing a session mid-block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSchedule {
    actors: Vec<ParticipantId>,
}

impl TurnSchedule {
    /// Independent fair coin per trial.
    pub fn random<R: Rng>(rng: &mut R, len: usize) -> Result<Self, ScheduleError> {
        if len == 0 {
            return Err(ScheduleError::EmptyTurns);
        }
        let actors = (0..len)
            .map(|_| {
                if rng.random_bool(0.5) {
                    ParticipantId::One
                } else {
                    ParticipantId::Two
                }
            })
            .collect();
        Ok(Self { actors })
    }

    /// Equal turn counts per side, order shuffled.
    pub fn balanced<R: Rng>(rng: &mut R, len: usize) -> Result<Self, ScheduleError> {
        if len == 0 {
            return Err(ScheduleError::EmptyTurns);
        }
        if len % 2 != 0 {
            return Err(ScheduleError::UnbalancedTurns(len));
        }
        let mut actors = Vec::with_capacity(len);
        actors.extend(std::iter::repeat_n(ParticipantId::One, len / 2));
        actors.extend(std::iter::repeat_n(ParticipantId::Two, len / 2));
        actors.shuffle(rng);
        Ok(Self { actors })
    }

    /// Number of trials the schedule was drawn for.
    pub fn planned_len(&self) -> usize {
        self.actors.len()
    }

    /// Whether `trial` lies past the planned length and will reuse an entry.
    pub fn wraps_at(&self, trial: usize) -> bool {
        trial >= self.actors.len()
    }

    /// Role assignment for a trial index, wrapping past the planned length.
    pub fn roles_for(&self, trial: usize) -> RolePair {
        RolePair::with_actor(self.actors[trial % self.actors.len()])
    }

    /// Acting turns given to participant one; the rest go to participant two.
    pub fn turns_for_one(&self) -> usize {
        self.actors
            .iter()
            .filter(|&&a| a == ParticipantId::One)
            .count()
    }
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("a turn schedule needs at least one trial")]
    EmptyTurns,
    #[error("{0} trials cannot split into equal turns; use an even count")]
    UnbalancedTurns(usize),
    #[error("{0} trials cannot balance the two stimulus classes; use an even count")]
    UnbalancedTrials(usize),
    #[error("the motion task needs at least one dot patch configured")]
    MissingPatches,
}
