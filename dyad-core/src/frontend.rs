use thiserror::Error;

use crate::participant::{CueSpec, ParticipantId, StereoBalance};
use crate::response::{Key, Response, RtFlag};
use crate::stimulus::StimulusSpec;

/// What the display collaborator draws for the current frame. The sequencer
/// re-issues the scene every frame; animation within a scene (noise drift,
/// dot motion, patch interleaving) is the frontend's own business.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scene {
    /// Pre-trial interval. The dot task shows a stationary patch carried over
    /// from the previous feedback interval; the grating task ignores it.
    Baseline { stationary_patch: Option<usize> },
    /// Decision interval with the trial stimulus on screen.
    Decision { stimulus: StimulusSpec },
    /// Post-decision interval showing the actor's response to the observer.
    Feedback(FeedbackView),
    Instructions(Screen),
    Break(BreakKind),
    End,
}

/// Everything the feedback interval needs: who acted, what they answered,
/// and whether the answer was suspiciously fast or slow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackView {
    pub stationary_patch: Option<usize>,
    pub actor: ParticipantId,
    pub response: Response,
    pub rt_flag: RtFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    PracticeInstructions,
    ExperimentInstructions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    /// Participants resume on their own acknowledgement.
    Subject,
    /// Only the experimenter ends the break.
    Mandatory,
}

/// Experimenter decision at a mandatory break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakCommand {
    Continue,
    /// Terminate the session; logged data stays on disk.
    Quit,
}

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("display error: {0}")]
    Display(String),
    #[error("input device error: {0}")]
    Input(String),
    #[error("audio error: {0}")]
    Audio(String),
}

/// Display and input collaborator. Implementations own the window, the
/// stimulus drawing, and the button boxes; the sequencer only ever issues
/// these calls, once per frame or once per wait.
pub trait Frontend {
    fn render(&mut self, scene: &Scene) -> Result<(), FrontendError>;

    /// Swap the display buffer. Real frontends block here until the vertical
    /// retrace; the frame-budget arithmetic assumes this paces the loop.
    fn flip(&mut self) -> Result<(), FrontendError>;

    /// Non-blocking poll of one participant's button box. Returns a raw key
    /// or `None` when nothing was pressed since the last poll.
    fn poll_response(&mut self, who: ParticipantId) -> Option<Key>;

    /// Drop any buffered presses from both boxes.
    fn clear_input(&mut self);

    /// Block until the participants acknowledge the current screen.
    fn wait_ack(&mut self) -> Result<(), FrontendError>;

    /// Block until the experimenter continues or terminates the session.
    fn wait_experimenter(&mut self) -> Result<BreakCommand, FrontendError>;
}

/// Audio-cue collaborator. Playback is fire-and-forget: `play_at` schedules
/// the cue against a predicted flip timestamp and returns immediately.
pub trait CuePlayer {
    /// Route the cue to the acting participant's ear via the shared mixer.
    fn set_balance(&mut self, balance: StereoBalance) -> Result<(), FrontendError>;

    fn play_at(&mut self, cue: &CueSpec, when_ns: u64);

    /// Rewind the cue so the next trial starts it from the beginning.
    fn stop(&mut self);
}
