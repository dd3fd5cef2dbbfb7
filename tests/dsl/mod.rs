//! Frame-stepping driver for transport tests.
//!
//! A [`TestTransportDriver`] loads a chart into a transport over a manual clock, starts playback
//! and then runs a list of steps. Each step optionally drives the transport, advances the clock,
//! processes one frame and checks the transport and the notifications of that frame.
//!
//! ```ignore
//! TestTransportDriver::new(chart)
//!     .past_ms(2500)
//!         .notifications(|ns| assert_eq!(section_changes(ns), vec![1]))
//!     .past_ms(100)
//!         .view(|t| assert_eq!(t.cursor().current_section, 1))
//!     .run();
//! ```

#![allow(dead_code)]

mod clock;
mod driver;
mod time_step;

use fnf_chart::sync::Notification;

pub use clock::{ClockOp, FlakyClock};
pub use driver::TestTransportDriver;
pub use time_step::TimeStepBuilder;

/// Time precision for assertions, in milliseconds.
pub const EPSILON_MS: f64 = 1e-6;

/// Asserts that two millisecond values are equal within [`EPSILON_MS`].
#[track_caller]
pub fn assert_ms_close(expected: f64, actual: f64, msg: &str) {
    let diff = (expected - actual).abs();
    assert!(
        diff < EPSILON_MS,
        "{msg}: expected {expected:.6}ms, got {actual:.6}ms, diff {diff:.9}ms (allowed: {EPSILON_MS}ms)",
    );
}

/// Section indices of the `SectionChanged` notifications, in order.
pub fn section_changes(notifications: &[Notification]) -> Vec<usize> {
    notifications
        .iter()
        .filter_map(|notification| match notification {
            Notification::SectionChanged(change) => Some(change.section),
            _ => None,
        })
        .collect()
}

/// Number of `SongEnded` notifications.
pub fn song_ends(notifications: &[Notification]) -> usize {
    notifications
        .iter()
        .filter(|notification| matches!(notification, Notification::SongEnded))
        .count()
}
