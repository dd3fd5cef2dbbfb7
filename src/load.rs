//! A validated chart together with everything derived from it.

use crate::{
    chart::{ChartData, ValidationError, bpm::Bpm},
    config::PlayerConfig,
    overlap::OverlapIndex,
    timeline::SectionTimeline,
};

/// A chart accepted for playback.
///
/// The chart data, its timeline and its overlap index are built together and are read-only
/// afterwards. Loading another song replaces the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedChart {
    data: ChartData,
    timeline: SectionTimeline,
    overlaps: OverlapIndex,
}

impl LoadedChart {
    /// Validates `data` and builds its timeline and overlap index.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] that rejected the chart.
    pub fn load(data: ChartData, config: &PlayerConfig) -> Result<Self, ValidationError> {
        data.validate()?;
        let timeline = SectionTimeline::new(&data)?;
        let overlaps = OverlapIndex::build(&data, &timeline, config);
        tracing::debug!(
            name = data.name.as_deref().unwrap_or("<unnamed>"),
            sections = timeline.len(),
            song_duration_ms = timeline.song_duration_ms(),
            "loaded chart"
        );
        Ok(Self {
            data,
            timeline,
            overlaps,
        })
    }

    /// Rebuilds the overlap index for a new grid resolution.
    pub(crate) fn rebuild_overlaps(&mut self, config: &PlayerConfig) {
        self.overlaps = OverlapIndex::build(&self.data, &self.timeline, config);
    }

    /// The raw chart.
    #[must_use]
    pub const fn data(&self) -> &ChartData {
        &self.data
    }

    /// Section timing.
    #[must_use]
    pub const fn timeline(&self) -> &SectionTimeline {
        &self.timeline
    }

    /// Sustain overlap index.
    #[must_use]
    pub const fn overlaps(&self) -> &OverlapIndex {
        &self.overlaps
    }

    /// Total length in milliseconds.
    #[must_use]
    pub const fn song_duration_ms(&self) -> f64 {
        self.timeline.song_duration_ms()
    }

    /// The fastest tempo of the chart.
    #[must_use]
    pub const fn max_bpm(&self) -> Bpm {
        self.timeline.max_bpm()
    }

    /// Number of sections.
    #[must_use]
    pub const fn section_count(&self) -> usize {
        self.timeline.len()
    }
}
