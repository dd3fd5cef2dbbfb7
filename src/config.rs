//! Player configuration and the control events that change it at runtime.

use std::num::NonZeroU32;

/// Default number of grid rows in one section.
pub const DEFAULT_ROWS_PER_SECTION: NonZeroU32 = match NonZeroU32::new(16) {
    Some(rows) => rows,
    None => unreachable!(),
};

/// Default viewport height in pixels.
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 720.0;

/// Geometry shared by the overlap scan, the note layout and the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerConfig {
    /// Grid rows per section. A note glyph is one row tall.
    pub rows_per_section: NonZeroU32,
    /// Height in pixels of the area one section is drawn into.
    pub viewport_height: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            rows_per_section: DEFAULT_ROWS_PER_SECTION,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl PlayerConfig {
    /// Creates a config with the default grid and the given viewport height.
    #[must_use]
    pub fn with_viewport_height(viewport_height: f64) -> Self {
        Self {
            viewport_height,
            ..Self::default()
        }
    }

    /// Grid rows per section as a float, for the timing math.
    #[must_use]
    pub fn rows(&self) -> f64 {
        f64::from(self.rows_per_section.get())
    }

    /// Height of one grid row in pixels.
    #[must_use]
    pub fn cell_height(&self) -> f64 {
        self.viewport_height / self.rows()
    }
}

/// Control events posted to a [`crate::transport::TransportController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// The drawing surface was resized.
    SetViewportHeight {
        /// New height in pixels.
        height: f64,
    },
    /// The grid resolution changed. This rebuilds the overlap index.
    SetRowsPerSection {
        /// New number of rows.
        rows: NonZeroU32,
    },
}
