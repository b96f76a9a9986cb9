use rand::Rng;
use rand::rngs::StdRng;
use tracing::debug;

use dyad_core::{
    BreakCommand, ButtonMap, CuePlayer, CueSpec, Frontend, FrontendError, Key, ParticipantId,
    Response, Scene, StereoBalance, StimulusSpec,
};
use dyad_experiment::Participants;
use dyad_timing::{FrameClock, PrecisionTimer, Timer};

/// Behaviour of the simulated pair.
#[derive(Debug, Clone, Copy)]
pub struct SimModel {
    /// Probability an answered window gets the correct label.
    pub accuracy: f64,
    /// Probability a window lapses with no press at all.
    pub lapse: f64,
    /// Uniform range simulated reaction times are drawn from, seconds.
    pub rt_range_s: (f64, f64),
}

impl Default for SimModel {
    fn default() -> Self {
        Self {
            accuracy: 0.8,
            lapse: 0.05,
            rt_range_s: (0.3, 1.2),
        }
    }
}

/// What the pair will do with the currently open window.
struct PlannedPress {
    after_frames: u64,
    /// `None` lets the window lapse.
    label: Option<Response>,
}

/// Headless stand-in for the chamber displays and button boxes. Draws
/// nothing; answers decision windows from the accuracy/lapse model, pressing
/// whichever key carries the planned label on the polled side's box.
pub struct SimFrontend {
    rng: StdRng,
    maps: [ButtonMap; 2],
    model: SimModel,
    paced: bool,
    clock: FrameClock,
    pacer: PrecisionTimer,
    window: Option<PlannedPress>,
    in_decision: bool,
    frames_in_window: u64,
}

impl SimFrontend {
    pub fn new(
        pair: &Participants,
        model: SimModel,
        paced: bool,
        refresh_hz: f64,
        rng: StdRng,
    ) -> Self {
        Self {
            rng,
            maps: [pair.one.buttons, pair.two.buttons],
            model,
            paced,
            clock: FrameClock::new(refresh_hz),
            pacer: PrecisionTimer::new(),
            window: None,
            in_decision: false,
            frames_in_window: 0,
        }
    }

    fn plan_window(&mut self, stimulus: &StimulusSpec) -> PlannedPress {
        if self.rng.random_bool(self.model.lapse) {
            return PlannedPress {
                after_frames: 0,
                label: None,
            };
        }
        let expected = stimulus.expected_response();
        let label = if self.rng.random_bool(self.model.accuracy) {
            expected
        } else {
            opposite(expected)
        };
        let (lo, hi) = self.model.rt_range_s;
        let rt = self.rng.random_range(lo..hi);
        PlannedPress {
            after_frames: self.clock.frames_for(rt).max(1),
            label: Some(label),
        }
    }
}

fn opposite(label: Response) -> Response {
    match label {
        Response::Yes => Response::No,
        Response::No => Response::Yes,
        Response::Left => Response::Right,
        Response::Right => Response::Left,
        Response::NoResponse => Response::NoResponse,
    }
}

impl Frontend for SimFrontend {
    fn render(&mut self, scene: &Scene) -> Result<(), FrontendError> {
        match scene {
            Scene::Decision { stimulus } => {
                if !self.in_decision {
                    let planned = self.plan_window(stimulus);
                    self.window = Some(planned);
                    self.in_decision = true;
                    self.frames_in_window = 0;
                }
            }
            _ => {
                self.in_decision = false;
                self.window = None;
            }
        }
        Ok(())
    }

    fn flip(&mut self) -> Result<(), FrontendError> {
        if self.in_decision {
            self.frames_in_window += 1;
        }
        if self.paced {
            self.pacer.sleep(self.clock.frame_duration());
        }
        Ok(())
    }

    fn poll_response(&mut self, who: ParticipantId) -> Option<Key> {
        let window = self.window.as_ref()?;
        let label = window.label?;
        if self.frames_in_window < window.after_frames {
            return None;
        }
        let map = match who {
            ParticipantId::One => self.maps[0],
            ParticipantId::Two => self.maps[1],
        };
        map.key_for(label)
    }

    fn clear_input(&mut self) {}

    fn wait_ack(&mut self) -> Result<(), FrontendError> {
        debug!("screen acknowledged");
        Ok(())
    }

    fn wait_experimenter(&mut self) -> Result<BreakCommand, FrontendError> {
        debug!("break continued");
        Ok(BreakCommand::Continue)
    }
}

/// Logs the cue schedule instead of driving a sound card and mixer.
#[derive(Default)]
pub struct SimCue;

impl CuePlayer for SimCue {
    fn set_balance(&mut self, balance: StereoBalance) -> Result<(), FrontendError> {
        debug!(%balance, "mixer balance set");
        Ok(())
    }

    fn play_at(&mut self, cue: &CueSpec, when_ns: u64) {
        debug!(note = %cue.note, when_ns, "cue scheduled");
    }

    fn stop(&mut self) {}
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use dyad_core::Condition;
    use dyad_experiment::SessionConfig;

    use super::*;

    fn sim(accuracy: f64, lapse: f64) -> SimFrontend {
        let config = SessionConfig::grating();
        let pair = Participants::for_session(&config, 5, [0.5, 0.5]);
        let model = SimModel {
            accuracy,
            lapse,
            rt_range_s: (0.05, 0.1),
        };
        SimFrontend::new(&pair, model, false, 60.0, StdRng::seed_from_u64(9))
    }

    #[test]
    fn perfect_pair_presses_the_expected_key() {
        let mut sim = sim(1.0, 0.0);
        let scene = Scene::Decision {
            stimulus: StimulusSpec::Grating {
                condition: Condition::Signal,
            },
        };
        sim.render(&scene).unwrap();
        let mut key = None;
        for _ in 0..60 {
            sim.flip().unwrap();
            if let Some(k) = sim.poll_response(ParticipantId::One) {
                key = Some(k);
                break;
            }
        }
        // pair 5 carries yes on key '2'
        assert_eq!(key, Some(Key('2')));
    }

    #[test]
    fn lapsing_pair_stays_silent() {
        let mut sim = sim(1.0, 1.0);
        let scene = Scene::Decision {
            stimulus: StimulusSpec::Grating {
                condition: Condition::Noise,
            },
        };
        sim.render(&scene).unwrap();
        for _ in 0..120 {
            sim.flip().unwrap();
            assert_eq!(sim.poll_response(ParticipantId::One), None);
        }
    }

    #[test]
    fn leaving_the_decision_scene_closes_the_window() {
        let mut sim = sim(1.0, 0.0);
        let scene = Scene::Decision {
            stimulus: StimulusSpec::Grating {
                condition: Condition::Signal,
            },
        };
        sim.render(&scene).unwrap();
        sim.render(&Scene::Baseline {
            stationary_patch: None,
        })
        .unwrap();
        for _ in 0..60 {
            sim.flip().unwrap();
        }
        assert_eq!(sim.poll_response(ParticipantId::One), None);
    }

    #[test]
    fn opposite_swaps_within_the_label_pair() {
        assert_eq!(opposite(Response::Yes), Response::No);
        assert_eq!(opposite(Response::Left), Response::Right);
        assert_eq!(opposite(opposite(Response::Right)), Response::Right);
    }
}
