//! The transport driver.

use std::{cell::RefCell, rc::Rc};

use fnf_chart::{
    chart::ChartData, clock::ManualClock, config::PlayerConfig, sync::Notification,
    transport::TransportController,
};
use gametime::TimeSpan;

use super::time_step::{TimeStep, TimeStepBuilder, Transport};

/// Loads a chart, starts playback and runs frames over a manual clock.
pub struct TestTransportDriver {
    transport: Option<Transport>,
    received: Rc<RefCell<Vec<Notification>>>,
    autoplay: bool,
    pub(super) time_steps: Vec<TimeStep>,
}

impl TestTransportDriver {
    /// Creates a driver over `chart` with the default config.
    ///
    /// # Panics
    ///
    /// Panics if the chart is rejected.
    pub fn new(chart: ChartData) -> Self {
        Self::with_config(chart, PlayerConfig::default())
    }

    /// Creates a driver over `chart` with `config`.
    ///
    /// # Panics
    ///
    /// Panics if the chart is rejected.
    pub fn with_config(chart: ChartData, config: PlayerConfig) -> Self {
        let mut transport = TransportController::new(ManualClock::new(), config);
        transport.load(chart).expect("chart must load");
        let received = Rc::new(RefCell::new(Vec::new()));
        {
            let received = Rc::clone(&received);
            transport.subscribe(move |notification| received.borrow_mut().push(*notification));
        }
        Self {
            transport: Some(transport),
            received,
            autoplay: true,
            time_steps: Vec::new(),
        }
    }

    /// Does not call `play` before the first step.
    #[must_use]
    pub const fn paused(mut self) -> Self {
        self.autoplay = false;
        self
    }

    /// Adds a step advancing the clock by `duration`.
    pub fn past(&mut self, duration: TimeSpan) -> TimeStepBuilder<'_> {
        self.time_steps.push(TimeStep::new(duration));
        TimeStepBuilder::new(self)
    }

    /// Adds a step advancing the clock by `millis`.
    pub fn past_ms(&mut self, millis: i64) -> TimeStepBuilder<'_> {
        self.past(TimeSpan::MILLISECOND * millis)
    }

    /// Adds a step advancing the clock by `secs`.
    pub fn past_sec(&mut self, secs: i64) -> TimeStepBuilder<'_> {
        self.past(TimeSpan::SECOND * secs)
    }

    /// Runs every step.
    pub fn run(mut self) {
        self.run_mut();
    }

    pub(super) fn run_mut(&mut self) {
        let mut transport = self.transport.take().expect("driver already ran");
        if self.autoplay {
            transport.play().expect("play must succeed");
        }

        for step in &mut self.time_steps {
            for action in std::mem::take(&mut step.control_actions) {
                action(&mut transport);
            }
            self.received.borrow_mut().clear();

            let seconds = step.duration.as_secs_f64();
            transport.clock_mut().advance(seconds);
            let flow = transport.frame().expect("frame must succeed");

            for assertion in &step.state_assertions {
                assertion(&transport);
            }
            let received = self.received.borrow();
            for assertion in &step.notification_assertions {
                assertion(&received);
            }
            for assertion in &step.flow_assertions {
                assertion(flow);
            }
        }
    }
}
