use std::path::PathBuf;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use dyad_core::{BreakCommand, BreakKind, CuePlayer, Frontend, FrontendError, Scene, Screen};
use dyad_timing::{RefreshStats, Timer};

use crate::config::{ConfigError, CueRouting, SessionConfig, Task, TurnPolicy};
use crate::output::{LogError, SessionLog, SessionSummary, TrialRecord};
use crate::participant::Participants;
use crate::schedule::{TrialPlan, plan_block};
use crate::sequencer::{TrialCapture, TrialIo, TrialSequencer};
use crate::turns::{ScheduleError, TurnSchedule};

/// Practice digest. Practice rows never reach the data file, but the
/// experimenter wants to know whether the pair understood the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticeSummary {
    pub trials: usize,
    pub correct: usize,
}

/// What a finished or terminated session hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub summary: SessionSummary,
    pub practice: Option<PracticeSummary>,
    pub log_path: PathBuf,
    pub completed_blocks: usize,
    /// True when the experimenter quit at a mandatory break.
    pub terminated_early: bool,
    pub refresh: RefreshStats,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Frontend(#[from] FrontendError),
    #[error(transparent)]
    Log(#[from] LogError),
}

/// One full dyadic session: instruction screens, practice, the trial blocks
/// with their breaks, and the data file.
///
/// Generic over its collaborators so the same machinery runs under the real
/// chamber frontend and the simulated one used by tests.
pub struct Session<F, C, T, R> {
    config: SessionConfig,
    pair_id: u32,
    participants: Participants,
    sequencer: TrialSequencer,
    frontend: F,
    cue: C,
    timer: T,
    rng: R,
    log: SessionLog,
    records: Vec<TrialRecord>,
}

impl<F, C, T, R> Session<F, C, T, R>
where
    F: Frontend,
    C: CuePlayer,
    T: Timer,
    R: Rng,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SessionConfig,
        pair_id: u32,
        participants: Participants,
        frontend: F,
        cue: C,
        timer: T,
        rng: R,
        log: SessionLog,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let sequencer = TrialSequencer::from_config(&config);
        Ok(Self {
            config,
            pair_id,
            participants,
            sequencer,
            frontend,
            cue,
            timer,
            rng,
            log,
            records: Vec::new(),
        })
    }

    /// Runs the session to completion. Trial rows are flushed as they
    /// happen, so an error or an early termination loses nothing logged.
    pub fn run(mut self) -> Result<SessionReport, SessionError> {
        info!(
            pair = self.pair_id,
            task = ?self.config.task,
            blocks = self.config.blocks,
            trials_per_block = self.config.trials_per_block,
            "session start"
        );
        self.show_screen(Screen::Welcome)?;

        if self.config.verify_refresh {
            self.verify_refresh()?;
        }

        let practice = self.run_practice()?;
        self.show_screen(Screen::ExperimentInstructions)?;

        let mut completed_blocks = 0;
        let mut terminated_early = false;
        for block in 1..=self.config.blocks {
            self.run_block(block)?;
            completed_blocks = block;
            if let Some(kind) =
                break_after(block, self.config.blocks, self.config.mandatory_break_every)
            {
                if self.hold_break(kind)? == BreakCommand::Quit {
                    warn!(block, "experimenter ended the session at the break");
                    terminated_early = true;
                    break;
                }
            }
        }

        self.frontend.render(&Scene::End)?;
        self.frontend.flip()?;

        let summary = SessionSummary::from_records(&self.records);
        info!(
            trials = summary.trials,
            responded = summary.responded,
            correct = summary.correct,
            mean_rt_s = ?summary.mean_rt_s,
            "session finished"
        );
        Ok(SessionReport {
            summary,
            practice,
            log_path: self.log.path().to_owned(),
            completed_blocks,
            terminated_early,
            refresh: self.timer.refresh_stats(),
        })
    }

    fn run_practice(&mut self) -> Result<Option<PracticeSummary>, SessionError> {
        let n = self.config.practice_trials;
        if n == 0 {
            return Ok(None);
        }
        self.show_screen(Screen::PracticeInstructions)?;
        // practice turns are balanced regardless of the block policy so
        // each side acts before the experiment starts
        let turns = TurnSchedule::balanced(&mut self.rng, n)?;
        let plans = plan_block(&mut self.rng, &self.config, n)?;
        let mut correct = 0;
        let mut carried_patch = None;
        for (index, plan) in plans.iter().enumerate() {
            let capture = self.run_one_trial(index, plan, &turns, &mut carried_patch)?;
            if plan.stimulus.is_correct(capture.response) {
                correct += 1;
            }
        }
        info!(trials = n, correct, "practice finished");
        Ok(Some(PracticeSummary { trials: n, correct }))
    }

    fn run_block(&mut self, block: usize) -> Result<(), SessionError> {
        let n = self.config.trials_per_block;
        let turns = self.draw_turns(n)?;
        let plans = plan_block(&mut self.rng, &self.config, n)?;
        info!(
            block,
            trials = n,
            turns_for_one = turns.turns_for_one(),
            "block start"
        );

        let mut carried_patch = None;
        for (index, plan) in plans.iter().enumerate() {
            let capture = self.run_one_trial(index, plan, &turns, &mut carried_patch)?;
            let trial = index + 1;
            let total_trial = (block - 1) * n + trial;
            let record = TrialRecord::new(
                self.pair_id,
                block,
                trial,
                total_trial,
                self.participants.roles(),
                plan,
                &capture,
            );
            self.log.append(&record)?;
            self.records.push(record);
        }
        Ok(())
    }

    fn run_one_trial(
        &mut self,
        index: usize,
        plan: &TrialPlan,
        turns: &TurnSchedule,
        carried_patch: &mut Option<usize>,
    ) -> Result<TrialCapture, SessionError> {
        if turns.wraps_at(index) {
            warn!(
                trial = index + 1,
                planned = turns.planned_len(),
                "turn schedule exhausted, reusing it from the start"
            );
        }
        self.participants.assign(turns.roles_for(index));
        let actor = self.participants.acting();

        if self.config.cue_routing == CueRouting::Balance {
            if let Err(err) = self.cue.set_balance(actor.acting_balance) {
                warn!(%err, "mixer balance not applied, cue stays centered");
            }
        }

        // the motion task replays the last feedback patch through the next
        // baseline; the very first baseline shows patch zero
        let baseline_patch = match self.config.task {
            Task::RandomDots => Some(carried_patch.unwrap_or(0)),
            Task::Grating => None,
        };

        debug!(trial = index + 1, actor = %actor.id, "trial start");
        let mut io = TrialIo {
            frontend: &mut self.frontend,
            cue: &mut self.cue,
            timer: &mut self.timer,
        };
        let capture = self.sequencer.run_trial(plan, actor, baseline_patch, &mut io)?;
        *carried_patch = plan.feedback_patch;
        Ok(capture)
    }

    fn draw_turns(&mut self, n: usize) -> Result<TurnSchedule, ScheduleError> {
        match self.config.turn_policy {
            TurnPolicy::Balanced => TurnSchedule::balanced(&mut self.rng, n),
            TurnPolicy::Random => TurnSchedule::random(&mut self.rng, n),
        }
    }

    fn show_screen(&mut self, screen: Screen) -> Result<(), SessionError> {
        self.frontend.render(&Scene::Instructions(screen))?;
        self.frontend.flip()?;
        self.frontend.wait_ack()?;
        Ok(())
    }

    fn hold_break(&mut self, kind: BreakKind) -> Result<BreakCommand, SessionError> {
        self.frontend.render(&Scene::Break(kind))?;
        self.frontend.flip()?;
        match kind {
            BreakKind::Subject => {
                debug!("subject break");
                self.frontend.wait_ack()?;
                Ok(BreakCommand::Continue)
            }
            BreakKind::Mandatory => {
                info!("mandatory break, waiting for the experimenter");
                Ok(self.frontend.wait_experimenter()?)
            }
        }
    }

    /// Samples real flip intervals for two seconds and compares them with
    /// the configured rate. A mismatch invalidates every frame-counted
    /// duration, so it is loud, but the session still runs.
    fn verify_refresh(&mut self) -> Result<(), SessionError> {
        let frames = self.sequencer.clock().frames_for(2.0);
        let mut io = TrialIo {
            frontend: &mut self.frontend,
            cue: &mut self.cue,
            timer: &mut self.timer,
        };
        self.sequencer.warmup(frames, &mut io)?;
        let stats = self.timer.refresh_stats();
        if stats.matches_refresh(self.config.refresh_hz, 5.0) {
            info!(
                fps = stats.effective_fps,
                jitter_ns = stats.jitter_ns,
                "refresh rate verified"
            );
        } else {
            warn!(
                configured_hz = self.config.refresh_hz,
                measured_fps = stats.effective_fps,
                samples = stats.samples,
                "display does not run at the configured refresh rate"
            );
        }
        Ok(())
    }
}

/// Break policy between blocks: none after the last block, an
/// experimenter-gated break after every `every`th block, a self-paced one
/// otherwise.
fn break_after(block: usize, total_blocks: usize, every: usize) -> Option<BreakKind> {
    if block == total_blocks {
        None
    } else if block % every == 0 {
        Some(BreakKind::Mandatory)
    } else {
        Some(BreakKind::Subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_block_session_alternates_break_kinds() {
        assert_eq!(break_after(1, 4, 2), Some(BreakKind::Subject));
        assert_eq!(break_after(2, 4, 2), Some(BreakKind::Mandatory));
        assert_eq!(break_after(3, 4, 2), Some(BreakKind::Subject));
        assert_eq!(break_after(4, 4, 2), None);
    }

    #[test]
    fn no_break_after_the_final_block() {
        assert_eq!(break_after(2, 2, 2), None);
        assert_eq!(break_after(1, 1, 2), None);
    }

    #[test]
    fn cadence_of_one_gates_every_break() {
        assert_eq!(break_after(1, 3, 1), Some(BreakKind::Mandatory));
        assert_eq!(break_after(2, 3, 1), Some(BreakKind::Mandatory));
        assert_eq!(break_after(3, 3, 1), None);
    }
}
