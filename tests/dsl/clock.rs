//! A clock double failing chosen operations only.

use fnf_chart::clock::{AudioClock, ClockError, ManualClock};

/// Clock operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockOp {
    Now,
    Start,
    Stop,
}

/// A [`ManualClock`] whose selected operations fail while the rest keep working.
#[derive(Debug, Clone, Default)]
pub struct FlakyClock {
    inner: ManualClock,
    failing: Vec<ClockOp>,
}

impl FlakyClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `op` fail from now on.
    pub fn fail(&mut self, op: ClockOp) {
        if !self.failing.contains(&op) {
            self.failing.push(op);
        }
    }

    /// Makes every operation succeed again.
    pub fn recover(&mut self) {
        self.failing.clear();
    }

    pub fn manual(&self) -> &ManualClock {
        &self.inner
    }

    pub fn manual_mut(&mut self) -> &mut ManualClock {
        &mut self.inner
    }

    fn check(&self, op: ClockOp) -> Result<(), ClockError> {
        if self.failing.contains(&op) {
            Err(ClockError::Unavailable(format!("{op:?} refused")))
        } else {
            Ok(())
        }
    }
}

impl AudioClock for FlakyClock {
    fn now_seconds(&self) -> Result<f64, ClockError> {
        self.check(ClockOp::Now)?;
        self.inner.now_seconds()
    }

    fn start(&mut self, offset_seconds: f64) -> Result<(), ClockError> {
        self.check(ClockOp::Start)?;
        self.inner.start(offset_seconds)
    }

    fn stop(&mut self) -> Result<(), ClockError> {
        self.check(ClockOp::Stop)?;
        self.inner.stop()
    }
}
