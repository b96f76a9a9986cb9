use rand::Rng;
use rand::seq::SliceRandom;

use dyad_core::{Condition, Direction, StimulusSpec};

use crate::config::{SessionConfig, Task};
use crate::turns::ScheduleError;

/// Immutable parameters of one trial, drawn before the block starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialPlan {
    pub stimulus: StimulusSpec,
    /// Sampled baseline length for this trial, seconds.
    pub baseline_s: f64,
    /// Patch held stationary during feedback and into the next trial's
    /// baseline, motion task only.
    pub feedback_patch: Option<usize>,
}

/// Draws the trial plans for one run of `n` trials.
///
/// Stimulus classes are balanced within the run: half signal/noise for the
/// grating task, half left/right for the motion task, order shuffled.
/// Baselines are sampled uniformly from the configured range per trial.
pub fn plan_block<R: Rng>(
    rng: &mut R,
    config: &SessionConfig,
    n: usize,
) -> Result<Vec<TrialPlan>, ScheduleError> {
    if n == 0 || n % 2 != 0 {
        return Err(ScheduleError::UnbalancedTrials(n));
    }
    let (lo, hi) = config.baseline_range_s;
    match config.task {
        Task::Grating => {
            let mut conditions = Vec::with_capacity(n);
            conditions.extend(std::iter::repeat_n(Condition::Signal, n / 2));
            conditions.extend(std::iter::repeat_n(Condition::Noise, n / 2));
            conditions.shuffle(rng);
            Ok(conditions
                .into_iter()
                .map(|condition| TrialPlan {
                    stimulus: StimulusSpec::Grating { condition },
                    baseline_s: rng.random_range(lo..hi),
                    feedback_patch: None,
                })
                .collect())
        }
        Task::RandomDots => {
            let patches = config
                .n_patches
                .filter(|&p| p > 0)
                .ok_or(ScheduleError::MissingPatches)?;
            let mut directions = Vec::with_capacity(n);
            directions.extend(std::iter::repeat_n(Direction::Left, n / 2));
            directions.extend(std::iter::repeat_n(Direction::Right, n / 2));
            directions.shuffle(rng);
            Ok(directions
                .into_iter()
                .map(|direction| TrialPlan {
                    stimulus: StimulusSpec::RandomDots {
                        direction,
                        patch: rng.random_range(0..patches),
                    },
                    baseline_s: rng.random_range(lo..hi),
                    feedback_patch: Some(rng.random_range(0..patches)),
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn grating_blocks_balance_signal_and_noise() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = SessionConfig::grating();
        let plans = plan_block(&mut rng, &config, 80).unwrap();

        let signals = plans
            .iter()
            .filter(|p| p.stimulus.condition() == Some(Condition::Signal))
            .count();
        assert_eq!(plans.len(), 80);
        assert_eq!(signals, 40);
        assert!(plans.iter().all(|p| p.feedback_patch.is_none()));
    }

    #[test]
    fn dot_blocks_balance_directions_and_pick_valid_patches() {
        let mut rng = StdRng::seed_from_u64(2);
        let config = SessionConfig::random_dots();
        let plans = plan_block(&mut rng, &config, 40).unwrap();

        let lefts = plans
            .iter()
            .filter(|p| p.stimulus.direction() == Some(Direction::Left))
            .count();
        assert_eq!(lefts, 20);
        for plan in &plans {
            match plan.stimulus {
                StimulusSpec::RandomDots { patch, .. } => assert!(patch < 3),
                StimulusSpec::Grating { .. } => panic!("grating plan in a dot block"),
            }
            assert!(plan.feedback_patch.unwrap() < 3);
        }
    }

    #[test]
    fn baselines_stay_inside_the_configured_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = SessionConfig::grating();
        let plans = plan_block(&mut rng, &config, 40).unwrap();
        for plan in &plans {
            assert!(plan.baseline_s >= 2.0 && plan.baseline_s < 4.0, "{}", plan.baseline_s);
        }
    }

    #[test]
    fn odd_block_lengths_are_rejected() {
        let mut rng = StdRng::seed_from_u64(4);
        let config = SessionConfig::grating();
        assert!(matches!(
            plan_block(&mut rng, &config, 7),
            Err(ScheduleError::UnbalancedTrials(7))
        ));
    }

    #[test]
    fn dot_blocks_need_patches() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut config = SessionConfig::random_dots();
        config.n_patches = None;
        assert!(matches!(
            plan_block(&mut rng, &config, 4),
            Err(ScheduleError::MissingPatches)
        ));
    }
}
