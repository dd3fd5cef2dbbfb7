//! Which slice of a pre-rendered waveform to draw next to a section.
//!
//! The waveform is resampled once so that one sample maps to one pixel at the fastest tempo of
//! the chart. Slower sections cover more audio per screen, so they read `1 / step` samples per
//! pixel row, where `step = bpm / max_bpm`.

use crate::{config::PlayerConfig, timeline::SectionTimeline};

/// Pixels per second of audio at the fastest section of `timeline`.
#[must_use]
pub fn pixels_per_second(timeline: &SectionTimeline, viewport_height: f64) -> f64 {
    let fastest_section_seconds = timeline.max_bpm().section_duration_ms() / 1000.0;
    viewport_height / fastest_section_seconds
}

/// The waveform slice of one section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaveformWindow {
    /// The section starts after the audio ends. Draw a placeholder instead.
    PastEnd,
    /// Draw `count` samples starting at `offset`, advancing `step` pixels per sample.
    Samples {
        /// First sample index.
        offset: usize,
        /// Number of samples to draw.
        count: usize,
        /// Vertical distance in pixels between consecutive samples.
        step: f64,
    },
}

impl WaveformWindow {
    /// Computes the window of section `section`.
    ///
    /// * `sample_count` - length of the resampled waveform
    /// * `audio_duration_seconds` - length of the audio itself
    ///
    /// Offsets are rounded to the nearest sample, and clamped so that the window ends at the
    /// last sample when the section runs past it.
    #[must_use]
    pub fn for_section(
        timeline: &SectionTimeline,
        section: usize,
        config: &PlayerConfig,
        sample_count: usize,
        audio_duration_seconds: f64,
    ) -> Option<Self> {
        let timing = timeline.timing(section)?;
        let position_seconds = timing.start / 1000.0;
        if position_seconds > audio_duration_seconds {
            return Some(Self::PastEnd);
        }

        let height = config.viewport_height;
        let pps = pixels_per_second(timeline, height);
        let step = if timeline.is_dynamic() {
            timing.bpm.as_f64() / timeline.max_bpm().as_f64()
        } else {
            1.0
        };

        let last_window_start = (sample_count as f64 - height * step).floor().max(0.0) as usize;
        let offset = ((pps * position_seconds).round().max(0.0) as usize).min(last_window_start);
        let count = (height / step).round() as usize;

        Some(Self::Samples {
            offset,
            count,
            step,
        })
    }
}
