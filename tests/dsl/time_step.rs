//! Steps of a [`TestTransportDriver`] run and their builder.

use std::ops::ControlFlow;

use fnf_chart::{clock::ManualClock, sync::Notification, transport::TransportController};
use gametime::TimeSpan;

use super::driver::TestTransportDriver;

pub type Transport = TransportController<ManualClock>;

type StateAssertion = Box<dyn Fn(&Transport)>;
type NotificationAssertion = Box<dyn Fn(&[Notification])>;
type FlowAssertion = Box<dyn Fn(ControlFlow<()>)>;
type ControlAction = Box<dyn FnOnce(&mut Transport)>;

/// One clock advance followed by one frame.
pub struct TimeStep {
    pub duration: TimeSpan,
    pub state_assertions: Vec<StateAssertion>,
    pub notification_assertions: Vec<NotificationAssertion>,
    pub flow_assertions: Vec<FlowAssertion>,
    /// Executed before the clock advances.
    pub control_actions: Vec<ControlAction>,
}

impl TimeStep {
    pub fn new(duration: TimeSpan) -> Self {
        Self {
            duration,
            state_assertions: Vec::new(),
            notification_assertions: Vec::new(),
            flow_assertions: Vec::new(),
            control_actions: Vec::new(),
        }
    }
}

/// Adds assertions and actions to the last step of a driver.
pub struct TimeStepBuilder<'a> {
    driver: &'a mut TestTransportDriver,
}

impl<'a> TimeStepBuilder<'a> {
    pub(super) const fn new(driver: &'a mut TestTransportDriver) -> Self {
        Self { driver }
    }

    fn step(&mut self) -> &mut TimeStep {
        self.driver
            .time_steps
            .last_mut()
            .expect("a step builder always has a step")
    }

    /// Checks the transport after the frame.
    #[must_use]
    pub fn view(mut self, assertion: impl Fn(&Transport) + 'static) -> Self {
        self.step().state_assertions.push(Box::new(assertion));
        self
    }

    /// Checks the notifications delivered during the frame.
    #[must_use]
    pub fn notifications(mut self, assertion: impl Fn(&[Notification]) + 'static) -> Self {
        self.step().notification_assertions.push(Box::new(assertion));
        self
    }

    /// Checks whether the frame asked to be rescheduled.
    #[must_use]
    pub fn flow(mut self, expected: ControlFlow<()>) -> Self {
        self.step()
            .flow_assertions
            .push(Box::new(move |flow| assert_eq!(flow, expected, "frame flow")));
        self
    }

    /// Drives the transport before the clock advances.
    #[must_use]
    pub fn control(mut self, action: impl FnOnce(&mut Transport) + 'static) -> Self {
        self.step().control_actions.push(Box::new(action));
        self
    }

    /// Starts the next step.
    pub fn past(self, duration: TimeSpan) -> TimeStepBuilder<'a> {
        self.driver.past(duration)
    }

    /// Starts the next step, advancing by `millis`.
    pub fn past_ms(self, millis: i64) -> TimeStepBuilder<'a> {
        self.driver.past_ms(millis)
    }

    /// Runs every step.
    pub fn run(self) {
        self.driver.run_mut();
    }
}
