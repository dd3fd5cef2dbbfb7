//! Screen coordinates of the notes shown while one section is focused.

use crate::{
    chart::{Note, Side},
    config::PlayerConfig,
    load::LoadedChart,
    timeline::SectionTiming,
};

/// A note positioned in the viewport of the focused section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteSprite {
    /// Side of the playfield.
    pub side: Side,
    /// Key on its side, in `0..4`.
    pub key: u8,
    /// Top of the note glyph in pixels. Negative for notes of donor sections.
    pub head_y: f64,
    /// Top of the sustain bar, one grid cell below the head.
    pub sustain_top: f64,
    /// Height of the sustain bar in pixels, `0` for tap notes.
    pub sustain_height: f64,
    /// Section the note was written in.
    pub origin_section: usize,
}

impl NoteSprite {
    /// Bottom of the sustain bar.
    #[must_use]
    pub fn sustain_bottom(&self) -> f64 {
        self.sustain_top + self.sustain_height
    }

    /// Whether any part of the sprite is inside `0..height`.
    #[must_use]
    pub fn is_visible(&self, height: f64, cell_height: f64) -> bool {
        let bottom = (self.head_y + cell_height).max(self.sustain_bottom());
        self.head_y < height && bottom > 0.0
    }
}

/// Everything the renderer needs to draw the background of one section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionLayout {
    /// The focused section.
    pub section: usize,
    /// Side the camera focuses.
    pub focused_side: Side,
    /// Height of one grid row in pixels.
    pub cell_height: f64,
    /// Viewport height in pixels.
    pub viewport_height: f64,
    /// Notes of donor sections first, in ascending section order, then the section's own notes.
    pub sprites: Vec<NoteSprite>,
}

impl SectionLayout {
    /// Lays out section `section` of `chart`, or `None` if there is no such section.
    ///
    /// All notes are placed in the frame of the focused section:
    /// `y = height * (position - start) / duration`. Donor notes therefore start above the
    /// viewport and only their tails reach into it.
    #[must_use]
    pub fn compute(chart: &LoadedChart, section: usize, config: &PlayerConfig) -> Option<Self> {
        let timing = chart.timeline().timing(section)?;
        let height = config.viewport_height;
        let cell_height = config.cell_height();

        let sprites = chart
            .overlaps()
            .donors_of(section)
            .chain(std::iter::once(section))
            .filter_map(|origin| {
                chart
                    .data()
                    .section_notes(origin)
                    .map(|notes| (origin, notes))
            })
            .flat_map(|(origin, notes)| {
                notes
                    .iter()
                    .map(|(side, note)| place(&timing, height, cell_height, origin, side, note))
                    .collect::<Vec<_>>()
            })
            .collect();

        Some(Self {
            section,
            focused_side: chart.data().focused_side(section),
            cell_height,
            viewport_height: height,
            sprites,
        })
    }

    /// Y coordinate of the playhead for a scroll offset in `[0, 1)`.
    #[must_use]
    pub fn playhead_y(&self, scroll_offset: f64) -> f64 {
        scroll_offset * self.viewport_height
    }

    /// Y coordinate of the top of grid row `row`.
    #[must_use]
    pub fn row_y(&self, row: u32) -> f64 {
        f64::from(row) * self.cell_height
    }
}

fn place(
    timing: &SectionTiming,
    height: f64,
    cell_height: f64,
    origin_section: usize,
    side: Side,
    note: &Note,
) -> NoteSprite {
    let head_y = height * ((note.position_ms - timing.start) / timing.duration);
    NoteSprite {
        side,
        key: note.key,
        head_y,
        sustain_top: head_y + cell_height,
        sustain_height: height * (note.sustain_ms / timing.duration),
        origin_section,
    }
}
