//! Index of sustain notes whose tails reach into later sections.
//!
//! While section `k` is on screen, the renderer also has to draw the tails of sustain notes
//! that started in an earlier section and are still held during `k`. Those earlier sections
//! are called donors. The index maps each section to its donors and is computed once per
//! chart, since it only depends on note geometry.

use std::collections::{BTreeMap, BTreeSet};

use crate::{chart::ChartData, config::PlayerConfig, timeline::SectionTimeline};

/// Mapping from a section to the earlier sections whose sustain notes overlap it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapIndex {
    donors: BTreeMap<usize, BTreeSet<usize>>,
}

impl OverlapIndex {
    /// Creates an empty index.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            donors: BTreeMap::new(),
        }
    }

    /// Scans every sustain note of `chart` and records the sections its tail reaches.
    ///
    /// A note occupies one grid row before its sustain starts, so its visual end is
    /// `position + duration / rows + sustain`.
    #[must_use]
    pub fn build(chart: &ChartData, timeline: &SectionTimeline, config: &PlayerConfig) -> Self {
        let mut index = Self::new();
        let rows = config.rows();
        for (section, timing) in timeline.iter().enumerate() {
            let Some(raw) = chart.sections.get(section) else {
                break;
            };
            let cell_duration = timing.duration / rows;
            for note in raw.notes.iter().filter(|note| note.is_sustain()) {
                let note_end = note.position_ms + cell_duration + note.sustain_ms;
                if note_end <= timing.end {
                    continue;
                }
                let through = timeline.section_at_clamped(note_end);
                index.insert(section, through);
            }
        }
        tracing::debug!(
            overlapped_sections = index.len(),
            "built sustain overlap index"
        );
        index
    }

    /// Records that `donor` overlaps every section in `donor + 1..=through`.
    pub fn insert(&mut self, donor: usize, through: usize) {
        for section in donor.saturating_add(1)..=through {
            self.donors.entry(section).or_default().insert(donor);
        }
    }

    /// Donor sections of `section` in ascending order.
    pub fn donors_of(&self, section: usize) -> impl Iterator<Item = usize> + '_ {
        self.donors
            .get(&section)
            .into_iter()
            .flat_map(|donors| donors.iter().copied())
    }

    /// Whether `section` has any donor.
    #[must_use]
    pub fn has_donors(&self, section: usize) -> bool {
        self.donors.contains_key(&section)
    }

    /// Iterates over overlapped sections and their donors in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BTreeSet<usize>)> {
        self.donors.iter().map(|(&section, donors)| (section, donors))
    }

    /// Number of sections with at least one donor.
    #[must_use]
    pub fn len(&self) -> usize {
        self.donors.len()
    }

    /// Whether no sustain note crosses a section boundary.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.donors.is_empty()
    }
}
