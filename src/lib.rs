//! Section timing, sustain overlap and playback synchronization for rhythm-game charts.
//!
//! A chart is a list of fixed-width sections (16 grid rows each by default) with an optional
//! tempo change per section. This crate turns such a chart into:
//!
//! - a [`timeline::SectionTimeline`] mapping sections to absolute times and back,
//! - an [`overlap::OverlapIndex`] of sustain notes whose tails reach into later sections,
//! - per-frame section and playhead state, through [`sync::PlaybackSynchronizer`] and the
//!   [`transport::TransportController`] driving it from an [`clock::AudioClock`].
//!
//! Rendering and audio decoding are left to the caller. [`layout`] and [`waveform`] provide the
//! coordinates a renderer needs.
//!
//! # Example
//!
//! ```
//! use fnf_chart::prelude::*;
//!
//! let chart = ChartData::new(100.0, vec![Section::default(); 4]);
//! let mut transport = TransportController::new(ManualClock::new(), PlayerConfig::default());
//! transport.load(chart).unwrap();
//! transport.play().unwrap();
//!
//! transport.clock_mut().advance(2.5);
//! transport.frame().unwrap();
//! assert_eq!(transport.cursor().current_section, 1);
//! ```
//!
//! # Features
//!
//! - `json` (default): [`chart::parse`], loading the usual chart JSON with `serde_json`.
//! - `serde`: `Serialize`/`Deserialize` for [`config::PlayerConfig`].

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod chart;
pub mod clock;
pub mod config;
pub mod layout;
pub mod load;
pub mod notify;
pub mod overlap;
pub mod prelude;
pub mod sync;
pub mod timeline;
pub mod transport;
pub mod util;
pub mod waveform;
