pub mod frontend;
pub mod outcome;
pub mod participant;
pub mod phase;
pub mod response;
pub mod stimulus;

pub use frontend::{
    BreakCommand, BreakKind, CuePlayer, FeedbackView, Frontend, FrontendError, Scene, Screen,
};
pub use outcome::Outcome;
pub use participant::{CueSpec, ParticipantId, Role, RolePair, StereoBalance};
pub use phase::{PhaseBudget, TrialPhase};
pub use response::{ButtonMap, Key, Response, RtFlag};
pub use stimulus::{Condition, Direction, StimulusSpec};
