//! Play, pause, stop, seek and section stepping over one loaded chart.
//!
//! [`TransportController`] is the only writer of [`PlaybackCursor`]. It samples the audio clock,
//! drives the [`PlaybackSynchronizer`] from [`TransportController::frame`] and fans its
//! notifications out to the subscribers.

use std::ops::ControlFlow;

use thiserror::Error;

use crate::{
    chart::{ChartData, ValidationError},
    clock::{AudioClock, ClockError},
    config::{ControlEvent, PlayerConfig},
    layout::SectionLayout,
    load::LoadedChart,
    notify::{Subscribers, SubscriptionId},
    sync::{Notification, PlaybackSynchronizer},
    util::wrap_index,
};

/// Where playback is, or would resume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackCursor {
    /// Section shown by the renderer.
    pub current_section: usize,
    /// Song position to resume from, `None` while playing.
    pub paused_at_ms: Option<f64>,
    /// Clock reading that corresponds to song position zero, `None` while paused.
    pub started_at_clock_time: Option<f64>,
}

impl Default for PlaybackCursor {
    fn default() -> Self {
        Self {
            current_section: 0,
            paused_at_ms: Some(0.0),
            started_at_clock_time: None,
        }
    }
}

/// Whether audio output is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportState {
    /// Audio is running and frames advance the synchronizer.
    Playing,
    /// Audio is stopped. Also the state of a stopped or empty transport.
    Paused,
}

/// Failure of a transport operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The audio clock refused to be read or driven.
    #[error(transparent)]
    Clock(#[from] ClockError),
    /// The chart given to [`TransportController::load`] was rejected.
    #[error(transparent)]
    Chart(#[from] ValidationError),
}

/// Owns the loaded chart, the cursor and the synchronizer, and drives them from an
/// [`AudioClock`].
///
/// Every operation is a no-op while no chart is loaded.
#[derive(Debug)]
pub struct TransportController<C> {
    chart: Option<LoadedChart>,
    cursor: PlaybackCursor,
    sync: PlaybackSynchronizer,
    subscribers: Subscribers,
    config: PlayerConfig,
    clock: C,
}

impl<C: AudioClock> TransportController<C> {
    /// Creates an empty transport over `clock`.
    #[must_use]
    pub fn new(clock: C, config: PlayerConfig) -> Self {
        Self {
            chart: None,
            cursor: PlaybackCursor::default(),
            sync: PlaybackSynchronizer::new(),
            subscribers: Subscribers::new(),
            config,
            clock,
        }
    }

    /// Replaces the current chart with `data`, stopped at section 0.
    ///
    /// A rejected chart leaves the transport untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Chart`] if `data` is invalid, or [`TransportError::Clock`] if
    /// the previous song could not be stopped.
    pub fn load(&mut self, data: ChartData) -> Result<(), TransportError> {
        let loaded = LoadedChart::load(data, &self.config)?;
        self.stop()?;
        self.chart = Some(loaded);
        self.cursor = PlaybackCursor::default();
        Ok(())
    }

    /// Stops playback and drops the chart.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Clock`] if audio could not be stopped.
    pub fn unload(&mut self) -> Result<(), TransportError> {
        self.stop()?;
        self.chart = None;
        Ok(())
    }

    /// Starts audio from the paused position. Does nothing if already playing.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Clock`] if the clock could not be read or started.
    pub fn play(&mut self) -> Result<(), TransportError> {
        let Some(chart) = &self.chart else {
            return Ok(());
        };
        if self.state() == TransportState::Playing {
            return Ok(());
        }
        let offset_seconds = self.cursor.paused_at_ms.unwrap_or(0.0) / 1000.0;
        let now = self.clock.now_seconds()?;
        self.clock.start(offset_seconds)?;
        self.cursor.started_at_clock_time = Some(now - offset_seconds);
        self.cursor.paused_at_ms = None;
        self.sync.start(chart.timeline(), self.cursor.current_section);
        tracing::info!(offset_seconds, section = self.cursor.current_section, "play");
        Ok(())
    }

    /// Stops audio and keeps the position. Does nothing if already paused.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Clock`] if the clock could not be read or stopped.
    pub fn pause(&mut self) -> Result<(), TransportError> {
        let (Some(chart), Some(started_at)) = (&self.chart, self.cursor.started_at_clock_time)
        else {
            return Ok(());
        };
        let elapsed_ms = (self.clock.now_seconds()? - started_at) * 1000.0;
        self.clock.stop()?;
        let paused_at_ms = elapsed_ms.clamp(0.0, chart.song_duration_ms());
        self.cursor = PlaybackCursor {
            current_section: chart.timeline().section_at_clamped(paused_at_ms),
            paused_at_ms: Some(paused_at_ms),
            started_at_clock_time: None,
        };
        self.sync.stop();
        tracing::info!(paused_at_ms, section = self.cursor.current_section, "pause");
        Ok(())
    }

    /// Stops audio and rewinds to the first section, whatever the current state.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Clock`] if audio could not be stopped.
    pub fn stop(&mut self) -> Result<(), TransportError> {
        if self.chart.is_none() {
            return Ok(());
        }
        if self.state() == TransportState::Playing {
            self.clock.stop()?;
        }
        self.sync.stop();
        self.cursor = PlaybackCursor::default();
        tracing::info!("stop");
        Ok(())
    }

    /// Moves to `position_ms`, clamped into the song.
    ///
    /// While playing, audio is restarted at the new position and the next frame reports exactly
    /// one section change, carrying the tempo that was playing before the seek. A seek to the
    /// very end reports [`Notification::SongEnded`] instead. While paused, only the resume
    /// position and section move.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Clock`] if the clock could not be driven. If audio was already
    /// stopped when the restart failed, the transport is left paused at the new position.
    pub fn seek(&mut self, position_ms: f64) -> Result<(), TransportError> {
        let Some(chart) = &self.chart else {
            return Ok(());
        };
        let position_ms = if position_ms.is_nan() {
            0.0
        } else {
            position_ms.clamp(0.0, chart.song_duration_ms())
        };
        let section = chart.timeline().section_at_clamped(position_ms);

        if self.state() == TransportState::Playing {
            let offset_seconds = position_ms / 1000.0;
            let now = self.clock.now_seconds()?;
            self.clock.stop()?;
            if let Err(err) = self.clock.start(offset_seconds) {
                self.cursor = PlaybackCursor {
                    current_section: section,
                    paused_at_ms: Some(position_ms),
                    started_at_clock_time: None,
                };
                self.sync.stop();
                tracing::warn!(%err, position_ms, section, "seek could not restart audio");
                return Err(err.into());
            }
            self.cursor.started_at_clock_time = Some(now - offset_seconds);
            self.sync.reposition(chart.timeline(), section);
        } else {
            self.cursor.paused_at_ms = Some(position_ms);
        }
        self.cursor.current_section = section;
        tracing::debug!(position_ms, section, "seek");
        Ok(())
    }

    /// Seeks to the start of the next section, wrapping after the last one.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Clock`] if the clock could not be read or driven.
    pub fn next(&mut self) -> Result<(), TransportError> {
        self.step(1)
    }

    /// Seeks to the start of the previous section, wrapping before the first one.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Clock`] if the clock could not be read or driven.
    pub fn previous(&mut self) -> Result<(), TransportError> {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> Result<(), TransportError> {
        let Some(chart) = &self.chart else {
            return Ok(());
        };
        let current = match self.cursor.started_at_clock_time {
            Some(started_at) => chart
                .timeline()
                .section_at_clamped((self.clock.now_seconds()? - started_at) * 1000.0),
            None => self.cursor.current_section,
        };
        let target = wrap_index(current as isize + delta, chart.section_count());
        match chart.timeline().position_of(target) {
            Some(position_ms) => self.seek(position_ms),
            None => Ok(()),
        }
    }

    /// Processes one display frame, returning whether another frame should be scheduled.
    ///
    /// Notifications are dispatched to the subscribers before this returns. When the song ends
    /// the transport stops and rewinds.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Clock`] if the clock could not be read, or stopped at the end
    /// of the song. In the latter case `SongEnded` was already dispatched and the transport stays
    /// playing until [`stop`](Self::stop) succeeds.
    pub fn frame(&mut self) -> Result<ControlFlow<()>, TransportError> {
        let (Some(chart), Some(started_at)) = (&self.chart, self.cursor.started_at_clock_time)
        else {
            return Ok(ControlFlow::Break(()));
        };
        let elapsed_seconds = self.clock.now_seconds()? - started_at;
        let output = self.sync.tick(chart.timeline(), elapsed_seconds, &self.config);

        let mut ended = false;
        for notification in &output.notifications {
            match notification {
                Notification::SectionChanged(change) => {
                    self.cursor.current_section = change.section;
                }
                Notification::SongEnded => ended = true,
                Notification::TempoChanged { .. } | Notification::Tick(_) => {}
            }
            self.subscribers.dispatch(notification);
        }
        if ended {
            self.stop()?;
        }
        Ok(output.flow)
    }

    /// Applies control events in order.
    pub fn post_events(&mut self, events: impl IntoIterator<Item = ControlEvent>) {
        for event in events {
            match event {
                ControlEvent::SetViewportHeight { height } => {
                    if height.is_finite() && height > 0.0 {
                        self.config.viewport_height = height;
                    } else {
                        tracing::warn!(height, "ignoring invalid viewport height");
                    }
                }
                ControlEvent::SetRowsPerSection { rows } => {
                    self.config.rows_per_section = rows;
                    if let Some(chart) = &mut self.chart {
                        chart.rebuild_overlaps(&self.config);
                    }
                }
            }
        }
    }

    /// Registers a notification listener.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&Notification) + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Current transport state.
    #[must_use]
    pub const fn state(&self) -> TransportState {
        if self.cursor.started_at_clock_time.is_some() {
            TransportState::Playing
        } else {
            TransportState::Paused
        }
    }

    /// Song position in milliseconds: sampled from the clock while playing, the resume
    /// position otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Clock`] if the clock could not be read.
    pub fn elapsed_ms(&self) -> Result<f64, TransportError> {
        match self.cursor.started_at_clock_time {
            Some(started_at) => Ok((self.clock.now_seconds()? - started_at) * 1000.0),
            None => Ok(self.cursor.paused_at_ms.unwrap_or(0.0)),
        }
    }

    /// Layout of the section under the cursor.
    #[must_use]
    pub fn layout(&self) -> Option<SectionLayout> {
        let chart = self.chart.as_ref()?;
        SectionLayout::compute(chart, self.cursor.current_section, &self.config)
    }

    /// The cursor.
    #[must_use]
    pub const fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    /// The loaded chart.
    #[must_use]
    pub const fn chart(&self) -> Option<&LoadedChart> {
        self.chart.as_ref()
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// The clock.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// The clock, mutably. Headless drivers advance a manual clock through this.
    pub const fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
