//! The audio clock seam.
//!
//! Playback position is owned by the audio output, not by this crate. The transport only samples
//! the clock and asks it to start or stop output; it never writes the clock directly.

use gametime::{TimeSpan, TimeStamp};
use thiserror::Error;

/// Failure reported by an audio clock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    /// The clock cannot be read or driven right now, e.g. the output device is gone.
    #[error("audio clock unavailable: {0}")]
    Unavailable(String),
}

/// An independently advancing clock with transport control over the audio output.
pub trait AudioClock {
    /// Current clock time in seconds. Monotonic while output is running.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the clock cannot be read.
    fn now_seconds(&self) -> Result<f64, ClockError>;

    /// Starts audio output at `offset_seconds` into the song.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if output cannot be started.
    fn start(&mut self, offset_seconds: f64) -> Result<(), ClockError>;

    /// Stops audio output.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if output cannot be stopped.
    fn stop(&mut self) -> Result<(), ClockError>;
}

/// A wall clock measuring seconds since it was created. Start and stop only track state.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: TimeStamp,
    output_offset: Option<f64>,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Creates a clock whose zero is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: TimeStamp::now(),
            output_offset: None,
        }
    }

    /// Song offset passed to the last `start`, `None` while stopped.
    #[must_use]
    pub const fn output_offset(&self) -> Option<f64> {
        self.output_offset
    }
}

impl AudioClock for SystemClock {
    fn now_seconds(&self) -> Result<f64, ClockError> {
        let elapsed = TimeStamp::now()
            .checked_elapsed_since(self.origin)
            .unwrap_or(TimeSpan::ZERO);
        Ok(elapsed.as_secs_f64().max(0.0))
    }

    fn start(&mut self, offset_seconds: f64) -> Result<(), ClockError> {
        self.output_offset = Some(offset_seconds);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ClockError> {
        self.output_offset = None;
        Ok(())
    }
}

/// A clock advanced by hand, for tests and headless drivers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualClock {
    now: f64,
    output_offset: Option<f64>,
    unavailable: bool,
    starts: usize,
    stops: usize,
}

impl ManualClock {
    /// Creates a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance(&mut self, seconds: f64) {
        self.now += seconds;
    }

    /// Sets the clock to `seconds`.
    pub const fn set_now(&mut self, seconds: f64) {
        self.now = seconds;
    }

    /// Makes every following call fail (or succeed again).
    pub const fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Song offset passed to the last `start`, `None` while stopped.
    #[must_use]
    pub const fn output_offset(&self) -> Option<f64> {
        self.output_offset
    }

    /// Whether audio output is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.output_offset.is_some()
    }

    /// Number of successful `start` calls.
    #[must_use]
    pub const fn starts(&self) -> usize {
        self.starts
    }

    /// Number of successful `stop` calls.
    #[must_use]
    pub const fn stops(&self) -> usize {
        self.stops
    }

    fn check(&self) -> Result<(), ClockError> {
        if self.unavailable {
            Err(ClockError::Unavailable("manual clock disabled".into()))
        } else {
            Ok(())
        }
    }
}

impl AudioClock for ManualClock {
    fn now_seconds(&self) -> Result<f64, ClockError> {
        self.check()?;
        Ok(self.now)
    }

    fn start(&mut self, offset_seconds: f64) -> Result<(), ClockError> {
        self.check()?;
        self.output_offset = Some(offset_seconds);
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ClockError> {
        self.check()?;
        self.output_offset = None;
        self.stops += 1;
        Ok(())
    }
}
