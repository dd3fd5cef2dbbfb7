//! Tempo-aware mapping between section indices and milliseconds.
//!
//! Every section spans four beats, so its duration is `4 * 60000 / bpm` milliseconds. When no
//! section changes the tempo, all sections share one duration and nothing is stored per section.
//! Otherwise the timeline walks the chart once, carrying the current tempo forward, and keeps a
//! contiguous list of [`SectionTiming`]s.

use thiserror::Error;

use crate::chart::{ChartData, ValidationError, bpm::Bpm};

/// Absolute timing of one section.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SectionTiming {
    /// Start position in milliseconds.
    pub start: f64,
    /// End position in milliseconds, exclusive.
    pub end: f64,
    /// Duration in milliseconds.
    pub duration: f64,
    /// Tempo active during the section.
    pub bpm: Bpm,
}

impl SectionTiming {
    /// Whether `position_ms` lies in `start..end`.
    #[must_use]
    pub fn contains(&self, position_ms: f64) -> bool {
        self.start <= position_ms && position_ms < self.end
    }
}

/// A position that does not fall inside any section.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("position {position_ms}ms is outside the song (0..{song_duration_ms}ms)")]
pub struct OutOfRangeError {
    /// Requested position in milliseconds.
    pub position_ms: f64,
    /// Song duration in milliseconds.
    pub song_duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum Tempo {
    Constant { bpm: Bpm, duration_ms: f64 },
    Variable { timings: Vec<SectionTiming>, max_bpm: Bpm },
}

/// Ordered, contiguous timing of every section in a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionTimeline {
    tempo: Tempo,
    section_count: usize,
    song_duration_ms: f64,
}

impl SectionTimeline {
    /// Builds the timeline of `chart`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the chart has no sections or any active tempo is not
    /// positive and finite.
    pub fn new(chart: &ChartData) -> Result<Self, ValidationError> {
        let section_count = chart.section_count();
        if section_count == 0 {
            return Err(ValidationError::NoSections);
        }
        let song_bpm = chart.song_bpm()?;

        let timeline = if chart.has_tempo_changes() {
            let mut timings = Vec::with_capacity(section_count);
            let mut current_bpm = song_bpm;
            let mut max_bpm: Option<Bpm> = None;
            let mut start = 0.0;
            for index in 0..section_count {
                if let Some(bpm) = chart.section_bpm(index)? {
                    current_bpm = bpm;
                }
                // the song tempo counts only while section 0 keeps it
                max_bpm = Some(max_bpm.map_or(current_bpm, |max| max.max(current_bpm)));
                let duration = current_bpm.section_duration_ms();
                let end = start + duration;
                timings.push(SectionTiming {
                    start,
                    end,
                    duration,
                    bpm: current_bpm,
                });
                start = end;
            }
            Self {
                tempo: Tempo::Variable {
                    timings,
                    max_bpm: max_bpm.unwrap_or(song_bpm),
                },
                section_count,
                song_duration_ms: start,
            }
        } else {
            let duration_ms = song_bpm.section_duration_ms();
            Self {
                tempo: Tempo::Constant {
                    bpm: song_bpm,
                    duration_ms,
                },
                section_count,
                song_duration_ms: duration_ms * section_count as f64,
            }
        };

        tracing::debug!(
            sections = section_count,
            dynamic = timeline.is_dynamic(),
            song_duration_ms = timeline.song_duration_ms,
            max_bpm = timeline.max_bpm().as_f64(),
            "built section timeline"
        );
        Ok(timeline)
    }

    /// Number of sections.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.section_count
    }

    /// Always `false`, a timeline has at least one section.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.section_count == 0
    }

    /// Whether any section changes the tempo.
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        matches!(self.tempo, Tempo::Variable { .. })
    }

    /// Total length of the chart in milliseconds.
    #[must_use]
    pub const fn song_duration_ms(&self) -> f64 {
        self.song_duration_ms
    }

    /// The fastest tempo active at any point of the chart.
    #[must_use]
    pub const fn max_bpm(&self) -> Bpm {
        match &self.tempo {
            Tempo::Constant { bpm, .. } => *bpm,
            Tempo::Variable { max_bpm, .. } => *max_bpm,
        }
    }

    /// Timing of section `index`.
    #[must_use]
    pub fn timing(&self, index: usize) -> Option<SectionTiming> {
        match &self.tempo {
            Tempo::Constant { bpm, duration_ms } => (index < self.section_count).then(|| {
                let start = duration_ms * index as f64;
                SectionTiming {
                    start,
                    end: duration_ms * (index + 1) as f64,
                    duration: *duration_ms,
                    bpm: *bpm,
                }
            }),
            Tempo::Variable { timings, .. } => timings.get(index).copied(),
        }
    }

    /// Start position of section `index` in milliseconds.
    #[must_use]
    pub fn position_of(&self, index: usize) -> Option<f64> {
        self.timing(index).map(|timing| timing.start)
    }

    /// Duration of section `index` in milliseconds.
    #[must_use]
    pub fn duration_of(&self, index: usize) -> Option<f64> {
        self.timing(index).map(|timing| timing.duration)
    }

    /// Tempo active during section `index`.
    #[must_use]
    pub fn bpm_of(&self, index: usize) -> Option<Bpm> {
        self.timing(index).map(|timing| timing.bpm)
    }

    /// Iterates over all section timings in order.
    pub fn iter(&self) -> impl Iterator<Item = SectionTiming> + '_ {
        (0..self.section_count).filter_map(|index| self.timing(index))
    }

    /// Finds the section containing `position_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] for negative positions, positions at or after the song end,
    /// and NaN.
    pub fn section_at(&self, position_ms: f64) -> Result<usize, OutOfRangeError> {
        let out_of_range = OutOfRangeError {
            position_ms,
            song_duration_ms: self.song_duration_ms,
        };
        match &self.tempo {
            Tempo::Constant { duration_ms, .. } => {
                if !(0.0..self.song_duration_ms).contains(&position_ms) {
                    return Err(out_of_range);
                }
                let mut section = (position_ms / duration_ms) as usize;
                // the quotient may land one off next to a boundary `duration * i`
                if position_ms < duration_ms * section as f64 {
                    section = section.saturating_sub(1);
                } else if position_ms >= duration_ms * (section + 1) as f64 {
                    section += 1;
                }
                Ok(section.min(self.section_count.saturating_sub(1)))
            }
            Tempo::Variable { timings, .. } => {
                let after = timings.partition_point(|timing| timing.start <= position_ms);
                after
                    .checked_sub(1)
                    .filter(|&index| {
                        timings
                            .get(index)
                            .is_some_and(|timing| timing.contains(position_ms))
                    })
                    .ok_or(out_of_range)
            }
        }
    }

    /// Finds the section containing `position_ms`, clamping to the first or last section when
    /// the position lies outside the song.
    #[must_use]
    pub fn section_at_clamped(&self, position_ms: f64) -> usize {
        self.section_at(position_ms).unwrap_or_else(|err| {
            let clamped = if position_ms >= self.song_duration_ms {
                self.section_count.saturating_sub(1)
            } else {
                0
            };
            tracing::debug!(%err, clamped, "clamped out-of-range position");
            clamped
        })
    }
}
