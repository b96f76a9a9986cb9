use std::time::Duration;

use tracing::debug;

use dyad_core::{
    CuePlayer, FeedbackView, Frontend, FrontendError, PhaseBudget, Response, RtFlag, Scene,
    TrialPhase,
};
use dyad_timing::{FrameClock, Timer};

use crate::config::{RtFlagBounds, SessionConfig};
use crate::participant::Participant;
use crate::schedule::TrialPlan;

/// Mutable collaborators for one trial, borrowed from the session.
pub struct TrialIo<'a, F, C, T> {
    pub frontend: &'a mut F,
    pub cue: &'a mut C,
    pub timer: &'a mut T,
}

/// What one trial produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialCapture {
    pub response: Response,
    /// Seconds from decision onset to the accepted press, if any.
    pub rt: Option<f64>,
    pub rt_flag: RtFlag,
    /// Frames the decision scene was actually on screen.
    pub decision_frames: u64,
}

/// Outcome of presenting one phase.
struct PhaseRun {
    frames_shown: u64,
    /// Accepted press: label and capture timestamp.
    press: Option<(Response, u64)>,
}

/// Drives single trials through the fixed phase order
/// Baseline -> Decision -> Feedback.
///
/// Every phase renders its scene once per frame against the flip-paced
/// frontend. The decision phase additionally polls the acting participant's
/// button box after each flip and closes as soon as a mapped key arrives;
/// the other phases always spend their whole frame budget.
pub struct TrialSequencer {
    clock: FrameClock,
    decision: PhaseBudget,
    feedback: PhaseBudget,
    rt_flags: Option<RtFlagBounds>,
}

impl TrialSequencer {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            clock: FrameClock::new(config.refresh_hz),
            decision: PhaseBudget::Seconds(config.decision_s),
            feedback: PhaseBudget::Seconds(config.feedback_s),
            rt_flags: config.rt_flags,
        }
    }

    pub fn clock(&self) -> FrameClock {
        self.clock
    }

    fn frames(&self, budget: PhaseBudget) -> u64 {
        match budget {
            PhaseBudget::Frames(n) => n,
            PhaseBudget::Seconds(s) => self.clock.frames_for(s),
        }
    }

    /// Runs one trial and captures the actor's decision.
    ///
    /// `baseline_patch` is the stationary dot patch carried over from the
    /// previous trial's feedback; the grating task passes `None`.
    pub fn run_trial<F, C, T>(
        &self,
        plan: &TrialPlan,
        actor: &Participant,
        baseline_patch: Option<usize>,
        io: &mut TrialIo<'_, F, C, T>,
    ) -> Result<TrialCapture, FrontendError>
    where
        F: Frontend,
        C: CuePlayer,
        T: Timer,
    {
        let mut last_flip = None;

        let baseline = Scene::Baseline {
            stationary_patch: baseline_patch,
        };
        self.present(
            TrialPhase::Baseline,
            &baseline,
            self.frames(PhaseBudget::Seconds(plan.baseline_s)),
            actor,
            io,
            &mut last_flip,
        )?;

        // Decision prologue: drop stale presses, then schedule the cue on the
        // predicted onset flip so tone and first stimulus frame coincide.
        io.frontend.clear_input();
        let onset_ns = match last_flip {
            Some(ts) => self.clock.next_flip_after(ts),
            None => io.timer.now_ns(),
        };
        io.cue.play_at(&actor.cue, onset_ns);
        let decision_start = io.timer.now_ns();

        let decision = Scene::Decision {
            stimulus: plan.stimulus,
        };
        let run = self.present(
            TrialPhase::Decision,
            &decision,
            self.frames(self.decision),
            actor,
            io,
            &mut last_flip,
        )?;
        io.cue.stop();

        let (response, rt) = match run.press {
            Some((label, at_ns)) => {
                let rt_s = at_ns.saturating_sub(decision_start) as f64 / 1e9;
                (label, Some(rt_s))
            }
            None => (Response::NoResponse, None),
        };
        let rt_flag = self.flag_for(rt);
        debug!(%response, rt_s = ?rt, frames = run.frames_shown, "decision window closed");

        let view = FeedbackView {
            stationary_patch: plan.feedback_patch,
            actor: actor.id,
            response,
            rt_flag,
        };
        self.present(
            TrialPhase::Feedback,
            &Scene::Feedback(view),
            self.frames(self.feedback),
            actor,
            io,
            &mut last_flip,
        )?;

        Ok(TrialCapture {
            response,
            rt,
            rt_flag,
            decision_frames: run.frames_shown,
        })
    }

    /// Renders a neutral scene for `frames` flips so the timer collects real
    /// flip intervals before anything is at stake.
    pub fn warmup<F, C, T>(
        &self,
        frames: u64,
        io: &mut TrialIo<'_, F, C, T>,
    ) -> Result<(), FrontendError>
    where
        F: Frontend,
        C: CuePlayer,
        T: Timer,
    {
        let scene = Scene::Baseline {
            stationary_patch: None,
        };
        let mut last_flip = None;
        for _ in 0..frames {
            io.frontend.render(&scene)?;
            flip_measured(io, &mut last_flip)?;
        }
        Ok(())
    }

    /// Presents one scene for up to `budget` frames. Phases that poll accept
    /// only keys mapped in the actor's button table; foreign presses are
    /// dropped and the window stays open.
    fn present<F, C, T>(
        &self,
        phase: TrialPhase,
        scene: &Scene,
        budget: u64,
        actor: &Participant,
        io: &mut TrialIo<'_, F, C, T>,
        last_flip: &mut Option<u64>,
    ) -> Result<PhaseRun, FrontendError>
    where
        F: Frontend,
        C: CuePlayer,
        T: Timer,
    {
        let mut press = None;
        let mut frames_shown = 0;
        for _ in 0..budget {
            io.frontend.render(scene)?;
            flip_measured(io, last_flip)?;
            frames_shown += 1;

            if phase.polls_input() {
                if let Some(key) = io.frontend.poll_response(actor.id) {
                    if let Some(label) = actor.buttons.response_for(key) {
                        press = Some((label, io.timer.now_ns()));
                        if phase.may_end_early() {
                            break;
                        }
                    }
                }
            }
        }
        Ok(PhaseRun { frames_shown, press })
    }

    /// Flags implausibly slow or fast decisions; NA without bounds or press.
    fn flag_for(&self, rt: Option<f64>) -> RtFlag {
        match (self.rt_flags, rt) {
            (Some(bounds), Some(rt)) if rt > bounds.slow_s => RtFlag::Slow,
            (Some(bounds), Some(rt)) if rt < bounds.fast_s => RtFlag::Fast,
            _ => RtFlag::Na,
        }
    }
}

/// Swap buffers and feed the measured flip-to-flip interval into the timer.
fn flip_measured<F, C, T>(
    io: &mut TrialIo<'_, F, C, T>,
    last_flip: &mut Option<u64>,
) -> Result<u64, FrontendError>
where
    F: Frontend,
    T: Timer,
{
    io.frontend.flip()?;
    let now = io.timer.now_ns();
    if let Some(prev) = *last_flip {
        io.timer.record_frame(Duration::from_nanos(now.saturating_sub(prev)));
    }
    *last_flip = Some(now);
    Ok(now)
}
