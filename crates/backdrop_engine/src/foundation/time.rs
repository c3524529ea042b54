//! Time management utilities

use std::time::{Duration, Instant};

/// Frame clock driven by host timestamps
///
/// The host hands every frame callback a monotonic timestamp in seconds.
/// `FrameClock` turns consecutive timestamps into frame deltas, the way a
/// browser animation loop derives them from `requestAnimationFrame`.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_timestamp: Option<f64>,
    max_delta: f32,
    total_time: f64,
    frame_count: u64,
}

impl FrameClock {
    /// Create a clock whose deltas are capped at `max_delta` seconds
    ///
    /// The cap keeps a long stall (backgrounded tab, debugger pause) from
    /// turning into one giant animation step.
    pub fn new(max_delta: f32) -> Self {
        Self {
            last_timestamp: None,
            max_delta: max_delta.max(0.0),
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance to `timestamp` and return the elapsed seconds since the last tick
    ///
    /// The first tick returns 0. Timestamps that go backwards or are not
    /// finite also yield 0 and do not move the clock.
    pub fn tick(&mut self, timestamp: f64) -> f32 {
        self.frame_count += 1;

        if !timestamp.is_finite() {
            return 0.0;
        }

        let delta = match self.last_timestamp {
            Some(last) if timestamp >= last => (timestamp - last) as f32,
            Some(_) => {
                log::warn!("Frame timestamp went backwards; treating as a zero-length frame");
                0.0
            }
            None => 0.0,
        };

        if self.last_timestamp.map_or(true, |last| timestamp >= last) {
            self.last_timestamp = Some(timestamp);
        }

        let delta = delta.min(self.max_delta);
        self.total_time += f64::from(delta);
        delta
    }

    /// Total (capped) time accumulated by this clock
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Number of ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Simple stopwatch for measuring elapsed wall-clock time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }
}
