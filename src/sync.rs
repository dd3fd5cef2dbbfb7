//! Per-frame reconciliation of the audio clock with discrete chart sections.
//!
//! The synchronizer keeps the bounds of the section under the playhead. Each tick compares the
//! sampled song position with those bounds: inside them the frame only moves the playhead,
//! outside them the section is resolved again straight from the timeline (never stepping through
//! the sections in between) and a transition is reported.

use std::ops::ControlFlow;

use crate::{
    chart::bpm::Bpm,
    config::PlayerConfig,
    timeline::{SectionTimeline, SectionTiming},
};

/// Reported once per section transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionChange {
    /// New section index.
    pub section: usize,
    /// Start of the new section in milliseconds.
    pub start_ms: f64,
    /// Duration of the new section in milliseconds.
    pub duration_ms: f64,
    /// Tempo of the new section.
    pub bpm: Bpm,
    /// Whether the chart has tempo changes, in which case a [`Notification::TempoChanged`]
    /// follows in the same tick.
    pub tempo_changed: bool,
}

/// Reported on every running tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Sampled song position in seconds.
    pub elapsed_seconds: f64,
    /// Section under the playhead.
    pub section: usize,
    /// Progress through the section, in `[0, 1)`.
    pub scroll_offset: f64,
    /// Grid row under the playhead.
    pub active_row: u32,
    /// Whether the cached section background must be drawn again this frame.
    pub redraw_background: bool,
}

/// Playback notifications, delivered in this order within one tick:
/// `SectionChanged`, `TempoChanged`, `Tick`. `SongEnded` is always alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    /// The playhead entered another section, or was repositioned.
    SectionChanged(SectionChange),
    /// The tempo was resolved again for the new section.
    TempoChanged {
        /// Tempo before the transition.
        previous_bpm: Bpm,
        /// Tempo after the transition.
        bpm: Bpm,
    },
    /// A frame was processed.
    Tick(FrameInfo),
    /// The song position reached the end of the chart. Sent once.
    SongEnded,
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    /// Notifications produced by the tick.
    pub notifications: Vec<Notification>,
    /// `Continue` to schedule another tick, `Break` to stop rescheduling.
    pub flow: ControlFlow<()>,
}

impl TickOutput {
    const fn stopped(notifications: Vec<Notification>) -> Self {
        Self {
            notifications,
            flow: ControlFlow::Break(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Window {
    section: usize,
    start: f64,
    end: f64,
    duration: f64,
    current_bpm: Bpm,
    stale: bool,
}

impl Window {
    const fn new(section: usize, timing: SectionTiming) -> Self {
        Self {
            section,
            start: timing.start,
            end: timing.end,
            duration: timing.duration,
            current_bpm: timing.bpm,
            stale: false,
        }
    }

    /// Whether `position_ms` leaves the window. Positions before zero belong to section 0.
    fn needs_lookup(&self, position_ms: f64) -> bool {
        let position_ms = position_ms.max(0.0);
        !(self.start <= position_ms && position_ms < self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Running(Window),
    Ended,
}

/// Converts sampled song positions into section state and transition notifications.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSynchronizer {
    phase: Phase,
    song_duration_ms: f64,
}

impl Default for PlaybackSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSynchronizer {
    /// Creates an idle synchronizer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            song_duration_ms: 0.0,
        }
    }

    /// Starts tracking at `section`, taking its bounds from `timeline`.
    ///
    /// A section past the end of the timeline is clamped to the last one.
    pub fn start(&mut self, timeline: &SectionTimeline, section: usize) {
        let section = section.min(timeline.len().saturating_sub(1));
        self.song_duration_ms = timeline.song_duration_ms();
        self.phase = match timeline.timing(section) {
            Some(timing) => Phase::Running(Window::new(section, timing)),
            None => Phase::Idle,
        };
    }

    /// Moves tracking to `section` and forces the next tick to report it.
    ///
    /// Unlike [`start`](Self::start) followed by [`invalidate`](Self::invalidate), the tempo of
    /// the outgoing section is kept, so the next [`Notification::TempoChanged`] carries it as
    /// `previous_bpm`. Starts tracking when idle.
    pub fn reposition(&mut self, timeline: &SectionTimeline, section: usize) {
        let previous_bpm = self.current_bpm();
        self.start(timeline, section);
        if let Phase::Running(window) = &mut self.phase {
            if let Some(bpm) = previous_bpm {
                window.current_bpm = bpm;
            }
            window.stale = true;
        }
    }

    /// Stops tracking. Following ticks are no-ops.
    pub const fn stop(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Forces the next tick to resolve the section again and report it, even if the position
    /// stays inside the current bounds.
    pub const fn invalidate(&mut self) {
        if let Phase::Running(window) = &mut self.phase {
            window.stale = true;
        }
    }

    /// Whether ticks are being processed.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    /// Whether the song end was reported.
    #[must_use]
    pub const fn has_ended(&self) -> bool {
        matches!(self.phase, Phase::Ended)
    }

    /// Section currently tracked, if running.
    #[must_use]
    pub const fn section(&self) -> Option<usize> {
        match &self.phase {
            Phase::Running(window) => Some(window.section),
            _ => None,
        }
    }

    /// Tempo of the tracked section, if running.
    #[must_use]
    pub const fn current_bpm(&self) -> Option<Bpm> {
        match &self.phase {
            Phase::Running(window) => Some(window.current_bpm),
            _ => None,
        }
    }

    /// Processes one frame at song position `elapsed_seconds`.
    pub fn tick(
        &mut self,
        timeline: &SectionTimeline,
        elapsed_seconds: f64,
        config: &PlayerConfig,
    ) -> TickOutput {
        let Phase::Running(mut window) = self.phase else {
            return TickOutput::stopped(Vec::new());
        };

        let position_ms = elapsed_seconds * 1000.0;
        if position_ms >= self.song_duration_ms {
            tracing::info!(position_ms, "song ended");
            self.phase = Phase::Ended;
            return TickOutput::stopped(vec![Notification::SongEnded]);
        }

        let mut notifications = Vec::with_capacity(3);
        let mut redraw_background = false;
        if window.stale || window.needs_lookup(position_ms) {
            let section = timeline.section_at_clamped(position_ms);
            if let Some(timing) = timeline
                .timing(section)
                .filter(|_| window.stale || section != window.section)
            {
                let previous_bpm = window.current_bpm;
                window = Window::new(section, timing);
                let tempo_changed = timeline.is_dynamic();
                notifications.push(Notification::SectionChanged(SectionChange {
                    section,
                    start_ms: timing.start,
                    duration_ms: timing.duration,
                    bpm: timing.bpm,
                    tempo_changed,
                }));
                if tempo_changed {
                    notifications.push(Notification::TempoChanged {
                        previous_bpm,
                        bpm: timing.bpm,
                    });
                }
                redraw_background = true;
                tracing::trace!(section, position_ms, "section changed");
            }
        }

        let rows = config.rows();
        let scroll_offset =
            ((position_ms - window.start) / window.duration).clamp(0.0, 1.0 - f64::EPSILON);
        let active_row =
            ((scroll_offset * rows).floor() as u32).min(config.rows_per_section.get() - 1);
        notifications.push(Notification::Tick(FrameInfo {
            elapsed_seconds,
            section: window.section,
            scroll_offset,
            active_row,
            redraw_background,
        }));

        self.phase = Phase::Running(window);
        TickOutput {
            notifications,
            flow: ControlFlow::Continue(()),
        }
    }
}
