use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Monotonic session clock. Timestamps are nanoseconds since an arbitrary
/// per-timer origin; only differences are meaningful.
pub trait Timer: Clone + Send + Sync {
    fn now_ns(&self) -> u64;
    fn elapsed(&self, since_ns: u64) -> Duration;
    fn sleep(&self, d: Duration);
    /// Feed one measured flip-to-flip interval into the refresh estimate.
    fn record_frame(&mut self, d: Duration);
    fn refresh_stats(&self) -> RefreshStats;
}

/// Summary of recorded frame intervals, used to verify the display actually
/// runs at the configured refresh rate before trials start.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshStats {
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
    pub samples: usize,
}

impl RefreshStats {
    pub fn empty() -> Self {
        Self {
            average_frame_time_ns: 0.0,
            jitter_ns: 0.0,
            min_frame_time_ns: 0.0,
            max_frame_time_ns: 0.0,
            effective_fps: 0.0,
            samples: 0,
        }
    }

    /// Whether the measured rate is within `tol_hz` of the configured one.
    pub fn matches_refresh(&self, hz: f64, tol_hz: f64) -> bool {
        self.samples > 0 && (self.effective_fps - hz).abs() <= tol_hz
    }
}

/// `Timer` backed by `Instant` plus a platform precise-sleep path, with a
/// bounded window of frame-interval samples.
#[derive(Debug, Clone)]
pub struct PrecisionTimer {
    start: Instant,
    frame_times: VecDeque<Duration>,
    max_samples: usize,
}

impl PrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frame_times: VecDeque::with_capacity(1000),
            max_samples: 1000,
        }
    }

    fn precise_sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(windows)]
        self.windows_sleep(duration);
        #[cfg(target_os = "macos")]
        self.macos_sleep(duration);
        #[cfg(not(any(target_os = "linux", windows, target_os = "macos")))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{CLOCK_MONOTONIC, clock_nanosleep, timespec};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };
        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }

    #[cfg(windows)]
    fn windows_sleep(&self, duration: Duration) {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{
            CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject,
        };

        // Negative due time = relative interval in 100 ns units.
        let due_time = -(duration.as_nanos() as i64 / 100);
        unsafe {
            let Ok(timer) = CreateWaitableTimerW(None, true, None) else {
                std::thread::sleep(duration);
                return;
            };
            if SetWaitableTimer(timer, &due_time, 0, None, None, false).is_ok() {
                WaitForSingleObject(timer, u32::MAX);
            }
            let _ = CloseHandle(timer);
        }
    }

    #[cfg(target_os = "macos")]
    fn macos_sleep(&self, duration: Duration) {
        use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};

        // Spin for sub-100 us waits; timer slack dwarfs them otherwise.
        if duration.as_nanos() < 100_000 {
            unsafe {
                let start = mach_absolute_time();
                let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
                mach_timebase_info(&mut timebase);
                let target_ticks =
                    duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;
                while mach_absolute_time() - start < target_ticks {
                    std::hint::spin_loop();
                }
            }
        } else {
            std::thread::sleep(duration);
        }
    }
}

impl Timer for PrecisionTimer {
    fn now_ns(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn elapsed(&self, since_ns: u64) -> Duration {
        Duration::from_nanos(self.now_ns().saturating_sub(since_ns))
    }

    fn sleep(&self, d: Duration) {
        self.precise_sleep(d);
    }

    fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(d);
    }

    fn refresh_stats(&self) -> RefreshStats {
        let times: Vec<f64> = self
            .frame_times
            .iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        if times.is_empty() {
            return RefreshStats::empty();
        }
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        RefreshStats {
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
            samples: times.len(),
        }
    }
}

impl Default for PrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}
