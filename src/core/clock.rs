//! Frame clock and the time sources it reads.

use std::cell::Cell;
use std::rc::Rc;

/// A monotonic source of wall time, in seconds.
pub trait TimeSource {
    /// Current time in seconds. Must never decrease.
    fn now(&self) -> f64;
}

/// `std::time::Instant` backed time for native targets.
#[cfg(not(target_arch = "wasm32"))]
pub struct InstantTime {
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl InstantTime {
    /// Start measuring from now.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for InstantTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl TimeSource for InstantTime {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// `performance.now()` backed time for the browser.
#[cfg(all(feature = "web", target_arch = "wasm32"))]
#[derive(Default)]
pub struct PerformanceTime;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
impl TimeSource for PerformanceTime {
    fn now(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now() / 1000.0)
            .unwrap_or(0.0)
    }
}

/// Hand-driven time, shared between clones. Used by tests and by hosts that
/// already own a frame timestamp.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    seconds: Rc<Cell<f64>>,
}

impl ManualTime {
    /// Start at zero seconds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward. Negative steps are ignored.
    pub fn advance(&self, seconds: f64) {
        if seconds > 0.0 {
            self.seconds.set(self.seconds.get() + seconds);
        }
    }

    /// Jump to an absolute time. Moving backwards is ignored.
    pub fn set(&self, seconds: f64) {
        if seconds > self.seconds.get() {
            self.seconds.set(seconds);
        }
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> f64 {
        self.seconds.get()
    }
}

/// The default time source for the current target.
pub fn default_time_source() -> Box<dyn TimeSource> {
    #[cfg(all(feature = "web", target_arch = "wasm32"))]
    {
        Box::new(PerformanceTime)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Box::new(InstantTime::new())
    }

    #[cfg(all(not(feature = "web"), target_arch = "wasm32"))]
    {
        Box::new(ManualTime::new())
    }
}

/// A clock for measuring elapsed time and delta time.
///
/// Like the three.js clock it starts lazily: the first call to
/// [`Clock::get_delta`] starts it and returns `0.0`.
pub struct Clock {
    source: Box<dyn TimeSource>,
    /// Whether the clock is running.
    running: bool,
    /// Start time in seconds.
    start_time: f64,
    /// Time of the last update in seconds.
    old_time: f64,
    /// Total elapsed time while running.
    elapsed_time: f64,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// Create a new clock (not started) on the default time source.
    pub fn new() -> Self {
        Self::with_source(default_time_source())
    }

    /// Create a new clock (not started) reading the given source.
    pub fn with_source(source: Box<dyn TimeSource>) -> Self {
        Self {
            source,
            running: false,
            start_time: 0.0,
            old_time: 0.0,
            elapsed_time: 0.0,
        }
    }

    /// Start the clock.
    pub fn start(&mut self) {
        self.start_time = self.source.now();
        self.old_time = self.start_time;
        self.elapsed_time = 0.0;
        self.running = true;
    }

    /// Stop the clock.
    pub fn stop(&mut self) {
        self.get_elapsed_time();
        self.running = false;
    }

    /// Get the elapsed time since the clock started (in seconds).
    pub fn get_elapsed_time(&mut self) -> f64 {
        self.get_delta();
        self.elapsed_time
    }

    /// Get the time since the last call to get_delta (in seconds, never negative).
    pub fn get_delta(&mut self) -> f64 {
        if !self.running {
            self.start();
            return 0.0;
        }

        let new_time = self.source.now();
        let diff = (new_time - self.old_time).max(0.0);
        self.old_time = new_time;
        self.elapsed_time += diff;

        diff
    }

    /// Check if the clock is running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_starts_stopped() {
        let clock = Clock::with_source(Box::new(ManualTime::new()));
        assert!(!clock.is_running());
    }

    #[test]
    fn test_first_delta_is_zero() {
        let time = ManualTime::new();
        time.advance(5.0);
        let mut clock = Clock::with_source(Box::new(time.clone()));
        assert_eq!(clock.get_delta(), 0.0);
        assert!(clock.is_running());
    }

    #[test]
    fn test_delta_tracks_source() {
        let time = ManualTime::new();
        let mut clock = Clock::with_source(Box::new(time.clone()));
        clock.get_delta();

        time.advance(0.25);
        assert_eq!(clock.get_delta(), 0.25);
        time.advance(0.5);
        assert_eq!(clock.get_delta(), 0.5);
        assert_eq!(clock.get_delta(), 0.0);
        assert_eq!(clock.get_elapsed_time(), 0.75);
    }

    #[test]
    fn test_manual_time_never_goes_back() {
        let time = ManualTime::new();
        time.set(2.0);
        time.set(1.0);
        time.advance(-1.0);
        assert_eq!(time.now(), 2.0);
    }
}
