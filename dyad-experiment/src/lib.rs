pub mod calibration;
pub mod config;
pub mod output;
pub mod participant;
pub mod schedule;
pub mod sequencer;
pub mod session;
pub mod turns;

pub use calibration::{CalibrationError, Titration, chamber_file, load_titration};
pub use config::{ConfigError, CueRouting, RtFlagBounds, SessionConfig, Task, TurnPolicy};
pub use output::{LogError, OutcomeCounts, SessionLog, SessionSummary, TrialRecord};
pub use participant::{Participant, Participants};
pub use schedule::{TrialPlan, plan_block};
pub use sequencer::{TrialCapture, TrialIo, TrialSequencer};
pub use session::{PracticeSummary, Session, SessionError, SessionReport};
pub use turns::{ScheduleError, TurnSchedule};
