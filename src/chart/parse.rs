//! Loader for the JSON chart format.
//!
//! ```json
//! {
//!   "song": {
//!     "song": "Bopeebo",
//!     "bpm": 100,
//!     "needsVoices": true,
//!     "speed": 1.3,
//!     "notes": [
//!       { "mustHitSection": false, "sectionNotes": [[0, 1, 0], [600, 5, 300]] },
//!       { "mustHitSection": true, "changeBPM": true, "bpm": 200, "sectionNotes": [] }
//!     ]
//!   }
//! }
//! ```
//!
//! Note tuples are `[position, lane, sustain, ...]`. Trailing elements after the sustain are
//! ignored, and a missing sustain means a tap note.

use serde::{
    Deserialize, Deserializer,
    de::{self, IgnoredAny, SeqAccess, Visitor},
};
use thiserror::Error;

use super::{ChartData, RawNote, Section, ValidationError};

/// Error while reading a chart file.
#[derive(Debug, Error)]
pub enum ChartParseError {
    /// The source is not a chart-shaped JSON document.
    #[error("invalid chart json at `{path}`: {source}")]
    Json {
        /// JSON path where deserialization failed.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// The document is well-formed but the chart it describes is rejected.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Deserialize)]
struct ChartFile {
    song: SongJson,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SongJson {
    #[serde(default)]
    song: Option<String>,
    bpm: f64,
    #[serde(default = "default_needs_voices")]
    needs_voices: bool,
    #[serde(default)]
    speed: Option<f64>,
    notes: Vec<SectionJson>,
}

const fn default_needs_voices() -> bool {
    true
}

#[derive(Deserialize)]
struct SectionJson {
    #[serde(rename = "mustHitSection", default)]
    must_hit_section: bool,
    #[serde(rename = "changeBPM", default)]
    change_bpm: bool,
    #[serde(default)]
    bpm: Option<f64>,
    #[serde(rename = "sectionNotes", default)]
    section_notes: Vec<NoteTuple>,
}

struct NoteTuple(RawNote);

impl<'de> Deserialize<'de> for NoteTuple {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NoteVisitor;

        impl<'de> Visitor<'de> for NoteVisitor {
            type Value = NoteTuple;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a note tuple `[position, lane, sustain]`")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let position_ms: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let lane: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let sustain_ms: f64 = seq.next_element()?.unwrap_or(0.0);
                while seq.next_element::<IgnoredAny>()?.is_some() {}

                if lane.fract() != 0.0 || !(0.0..=f64::from(u8::MAX)).contains(&lane) {
                    return Err(de::Error::invalid_value(
                        de::Unexpected::Float(lane),
                        &"a non-negative integral lane",
                    ));
                }
                Ok(NoteTuple(RawNote::new(position_ms, lane as u8, sustain_ms)))
            }
        }

        deserializer.deserialize_seq(NoteVisitor)
    }
}

impl SongJson {
    fn into_chart(self) -> ChartData {
        let sections = self
            .notes
            .into_iter()
            .map(|section| Section {
                must_hit_section: section.must_hit_section,
                change_bpm: section.change_bpm,
                bpm: section.bpm,
                notes: section
                    .section_notes
                    .into_iter()
                    .map(|NoteTuple(note)| note)
                    .collect(),
            })
            .collect();
        ChartData {
            name: self.song,
            bpm: self.bpm,
            needs_voices: self.needs_voices,
            speed: self.speed,
            sections,
        }
    }
}

/// Parses and validates a chart from its JSON source.
///
/// # Errors
///
/// Returns [`ChartParseError::Json`] with the failing JSON path when the document does not
/// have the chart shape, and [`ChartParseError::Invalid`] when the chart fails validation.
pub fn parse_chart(source: &str) -> Result<ChartData, ChartParseError> {
    let mut deserializer = serde_json::Deserializer::from_str(source);
    let file: ChartFile = serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        ChartParseError::Json {
            path: err.path().to_string(),
            source: err.into_inner(),
        }
    })?;
    let chart = file.song.into_chart();
    chart.validate()?;
    tracing::debug!(
        name = chart.name.as_deref().unwrap_or("<unnamed>"),
        sections = chart.section_count(),
        "parsed chart"
    );
    Ok(chart)
}
