pub mod frames;
pub mod timer;

pub use frames::FrameClock;
pub use timer::{PrecisionTimer, RefreshStats, Timer};
