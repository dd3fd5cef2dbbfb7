//! The chart data model: an ordered list of 16-row sections under a base tempo.
//!
//! A chart is loaded once per song and never mutated in place. Everything derived
//! from it (the [`crate::timeline::SectionTimeline`], the [`crate::overlap::OverlapIndex`])
//! is rebuilt from scratch whenever a new chart is loaded.
//!
//! # Lanes
//!
//! Raw notes address eight lanes. Lanes `0..4` and `4..8` are the two halves of the
//! playfield, and which half belongs to the player depends on [`Section::must_hit_section`];
//! see [`ChartData::section_notes`].

pub mod bpm;
#[cfg(feature = "json")]
#[cfg_attr(docsrs, doc(cfg(feature = "json")))]
pub mod parse;

use itertools::{Either, Itertools};
use thiserror::Error;

use self::bpm::{Bpm, TryFromBpmError};

/// Number of lanes a raw note may address.
pub const LANE_COUNT: u8 = 8;
/// Number of lanes on one side of the playfield.
pub const LANES_PER_SIDE: u8 = 4;

/// A note as it is written in the chart: position and sustain in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RawNote {
    /// Absolute position from the song start, in milliseconds.
    pub position_ms: f64,
    /// Lane index in `0..8`.
    pub lane: u8,
    /// Sustain length in milliseconds, `0` for a tap note.
    pub sustain_ms: f64,
}

impl RawNote {
    /// Creates a new raw note.
    #[must_use]
    pub const fn new(position_ms: f64, lane: u8, sustain_ms: f64) -> Self {
        Self {
            position_ms,
            lane,
            sustain_ms,
        }
    }

    /// Whether this note must be held.
    #[must_use]
    pub fn is_sustain(&self) -> bool {
        self.sustain_ms > 0.0
    }
}

/// One fixed-width measure of the chart.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Section {
    /// Whether the camera focuses the player during this section.
    pub must_hit_section: bool,
    /// Whether this section sets a new tempo.
    pub change_bpm: bool,
    /// The new tempo. Only meaningful when `change_bpm` is set.
    pub bpm: Option<f64>,
    /// Notes starting in this section.
    pub notes: Vec<RawNote>,
}

impl Section {
    /// Creates a section with the given notes and no tempo change.
    #[must_use]
    pub const fn new(notes: Vec<RawNote>) -> Self {
        Self {
            must_hit_section: false,
            change_bpm: false,
            bpm: None,
            notes,
        }
    }

    /// Marks this section as changing the tempo to `bpm`.
    #[must_use]
    pub fn with_bpm_change(mut self, bpm: f64) -> Self {
        self.change_bpm = true;
        self.bpm = Some(bpm);
        self
    }

    /// Marks this section as focused on the player.
    #[must_use]
    pub fn must_hit(mut self) -> Self {
        self.must_hit_section = true;
        self
    }
}

/// The whole chart of one song.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChartData {
    /// Song name, if the chart carries one.
    pub name: Option<String>,
    /// Base tempo applied until a section overrides it.
    pub bpm: f64,
    /// Whether the song ships a separate voices track.
    pub needs_voices: bool,
    /// Scroll speed hint written by the charter.
    pub speed: Option<f64>,
    /// Sections in playback order.
    pub sections: Vec<Section>,
}

/// Which half of the playfield a note belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Side {
    /// The side the user plays.
    Player,
    /// The side played by the opponent.
    Opponent,
}

/// A note assigned to a side, with its key in `0..4`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Absolute position from the song start, in milliseconds.
    pub position_ms: f64,
    /// Key on its side, in `0..4` (left, down, up, right).
    pub key: u8,
    /// Sustain length in milliseconds.
    pub sustain_ms: f64,
}

/// Notes of a section split by side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideNotes {
    /// Notes on the player side.
    pub player: Vec<Note>,
    /// Notes on the opponent side.
    pub opponent: Vec<Note>,
}

impl SideNotes {
    /// Iterates over the notes together with their side, player first.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &Note)> {
        self.player
            .iter()
            .map(|note| (Side::Player, note))
            .chain(self.opponent.iter().map(|note| (Side::Opponent, note)))
    }
}

/// Structural error found while accepting a chart. The chart is rejected as a whole.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The chart has no sections.
    #[error("chart has no sections")]
    NoSections,
    /// The base tempo is not a positive finite number.
    #[error("invalid song bpm: {0}")]
    InvalidSongBpm(#[source] TryFromBpmError),
    /// A section changes the tempo to a non-positive or non-finite value.
    #[error("invalid bpm change in section {section}: {source}")]
    InvalidSectionBpm {
        /// Index of the section.
        section: usize,
        /// Rejected value.
        #[source]
        source: TryFromBpmError,
    },
    /// A section sets `changeBPM` but has no bpm value.
    #[error("section {section} changes bpm without a value")]
    MissingSectionBpm {
        /// Index of the section.
        section: usize,
    },
    /// A note tuple is malformed.
    #[error("malformed note {note} in section {section}: {reason}")]
    MalformedNote {
        /// Index of the section.
        section: usize,
        /// Index of the note inside the section.
        note: usize,
        /// What is wrong with it.
        reason: NoteDefect,
    },
}

/// The way a note tuple is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoteDefect {
    /// Lane is out of `0..8`.
    #[error("lane {0} is out of range")]
    LaneOutOfRange(u8),
    /// Position is NaN or infinite.
    #[error("position is not finite")]
    NonFinitePosition,
    /// Sustain is negative, NaN or infinite.
    #[error("sustain is negative or not finite")]
    InvalidSustain,
}

impl ChartData {
    /// Creates a chart from a base tempo and its sections.
    #[must_use]
    pub const fn new(bpm: f64, sections: Vec<Section>) -> Self {
        Self {
            name: None,
            bpm,
            needs_voices: true,
            speed: None,
            sections,
        }
    }

    /// Number of sections.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Whether any section sets a new tempo.
    #[must_use]
    pub fn has_tempo_changes(&self) -> bool {
        self.sections.iter().any(|section| section.change_bpm)
    }

    /// The validated base tempo.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSongBpm`] when the base tempo is not positive and finite.
    pub fn song_bpm(&self) -> Result<Bpm, ValidationError> {
        Bpm::try_from(self.bpm).map_err(ValidationError::InvalidSongBpm)
    }

    /// The validated tempo set by section `index`, `None` if the section keeps the current tempo.
    ///
    /// # Errors
    ///
    /// Returns an error when the section changes the tempo to an invalid or missing value.
    pub fn section_bpm(&self, index: usize) -> Result<Option<Bpm>, ValidationError> {
        let Some(section) = self.sections.get(index) else {
            return Ok(None);
        };
        if !section.change_bpm {
            return Ok(None);
        }
        let raw = section
            .bpm
            .ok_or(ValidationError::MissingSectionBpm { section: index })?;
        Bpm::try_from(raw)
            .map(Some)
            .map_err(|source| ValidationError::InvalidSectionBpm {
                section: index,
                source,
            })
    }

    /// Checks the structural assumptions the timing model relies on.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, scanning sections in order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sections.is_empty() {
            return Err(ValidationError::NoSections);
        }
        self.song_bpm()?;
        for (section_index, section) in self.sections.iter().enumerate() {
            self.section_bpm(section_index)?;
            for (note_index, note) in section.notes.iter().enumerate() {
                let defect = if note.lane >= LANE_COUNT {
                    Some(NoteDefect::LaneOutOfRange(note.lane))
                } else if !note.position_ms.is_finite() {
                    Some(NoteDefect::NonFinitePosition)
                } else if !(note.sustain_ms.is_finite() && note.sustain_ms >= 0.0) {
                    Some(NoteDefect::InvalidSustain)
                } else {
                    None
                };
                if let Some(reason) = defect {
                    return Err(ValidationError::MalformedNote {
                        section: section_index,
                        note: note_index,
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    /// Whether section `index` focuses the player.
    #[must_use]
    pub fn must_hit_section(&self, index: usize) -> bool {
        self.sections
            .get(index)
            .is_some_and(|section| section.must_hit_section)
    }

    /// The side the camera focuses during section `index`.
    #[must_use]
    pub fn focused_side(&self, index: usize) -> Side {
        if self.must_hit_section(index) {
            Side::Player
        } else {
            Side::Opponent
        }
    }

    /// Splits the notes of section `index` into player and opponent notes.
    ///
    /// When the section uses both halves of the lane range, the lower half is the opponent
    /// and the upper half is the player, swapped on must-hit sections. When only the lower
    /// half is used, it belongs to whoever the section focuses.
    #[must_use]
    pub fn section_notes(&self, index: usize) -> Option<SideNotes> {
        let section = self.sections.get(index)?;
        let both_sides = section
            .notes
            .iter()
            .any(|note| note.lane >= LANES_PER_SIDE);

        let (lower, upper): (Vec<Note>, Vec<Note>) =
            section.notes.iter().partition_map(|raw| {
                let note = Note {
                    position_ms: raw.position_ms,
                    key: raw.lane % LANES_PER_SIDE,
                    sustain_ms: raw.sustain_ms,
                };
                if raw.lane < LANES_PER_SIDE {
                    Either::Left(note)
                } else {
                    Either::Right(note)
                }
            });

        let notes = match (both_sides, section.must_hit_section) {
            (true, false) => SideNotes {
                player: upper,
                opponent: lower,
            },
            (true, true) => SideNotes {
                player: lower,
                opponent: upper,
            },
            (false, true) => SideNotes {
                player: lower,
                opponent: Vec::new(),
            },
            (false, false) => SideNotes {
                player: Vec::new(),
                opponent: lower,
            },
        };
        Some(notes)
    }
}
