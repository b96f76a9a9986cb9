use std::time::Duration;

/// Frame arithmetic for a fixed-refresh display. Phase durations given in
/// seconds are budgeted as whole frames at this rate, and the audio cue is
/// scheduled against the predicted next buffer swap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    refresh_hz: f64,
}

impl FrameClock {
    /// `refresh_hz` must be positive; the lab displays run at 60 Hz.
    pub fn new(refresh_hz: f64) -> Self {
        debug_assert!(refresh_hz > 0.0);
        Self { refresh_hz }
    }

    pub fn refresh_hz(&self) -> f64 {
        self.refresh_hz
    }

    /// Round a wall-clock interval to the nearest whole frame count.
    /// Non-positive intervals budget zero frames.
    pub fn frames_for(&self, seconds: f64) -> u64 {
        (seconds * self.refresh_hz).max(0.0).round() as u64
    }

    pub fn frame_ns(&self) -> u64 {
        (1e9 / self.refresh_hz).round() as u64
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_nanos(self.frame_ns())
    }

    /// Predicted timestamp of the flip after the one at `last_flip_ns`. Cue
    /// onset is aligned to this so sound and first stimulus frame coincide.
    pub fn next_flip_after(&self, last_flip_ns: u64) -> u64 {
        last_flip_ns + self.frame_ns()
    }
}
