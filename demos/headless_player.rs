//! Headless chart player
//!
//! Loads a JSON chart and plays it against a manual clock advanced at a fixed frame rate,
//! logging every playback notification.

use std::{cell::Cell, path::PathBuf, rc::Rc};

use clap::Parser;
use fnf_chart::{prelude::*, util::format_time, waveform::pixels_per_second};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "headless_player")]
#[command(about = "Plays a rhythm-game chart without audio or window", long_about = None)]
struct Args {
    /// Chart file path
    #[arg(value_name = "FILE")]
    chart_path: PathBuf,

    /// Frames per second of the simulated display
    #[arg(short, long, default_value = "60")]
    fps: u32,

    /// Position to start from (milliseconds)
    #[arg(short, long, default_value = "0", value_name = "MILLISECONDS")]
    start_ms: f64,

    /// Viewport height (pixels)
    #[arg(long, default_value = "720")]
    viewport_height: f64,

    /// Log every tick, not only transitions
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let source = std::fs::read_to_string(&args.chart_path)
        .map_err(|e| format!("Failed to read chart: {e}"))?;
    let chart = parse_chart(&source).map_err(|e| format!("Failed to parse chart: {e}"))?;

    let config = PlayerConfig::with_viewport_height(args.viewport_height);
    let mut transport = TransportController::new(ManualClock::new(), config);
    transport
        .load(chart)
        .map_err(|e| format!("Failed to load chart: {e}"))?;

    if let Some(loaded) = transport.chart() {
        tracing::info!(
            sections = loaded.section_count(),
            duration = %format_time(loaded.song_duration_ms() / 1000.0),
            max_bpm = %loaded.max_bpm(),
            pixels_per_second = pixels_per_second(loaded.timeline(), args.viewport_height),
            overlapped_sections = loaded.overlaps().len(),
            "chart loaded"
        );
    }

    let frames = Rc::new(Cell::new(0_u64));
    {
        let frames = Rc::clone(&frames);
        let verbose = args.verbose;
        transport.subscribe(move |notification| match notification {
            Notification::SectionChanged(change) => tracing::info!(
                section = change.section,
                start = %format_time(change.start_ms / 1000.0),
                bpm = %change.bpm,
                "section changed"
            ),
            Notification::TempoChanged { previous_bpm, bpm } => {
                tracing::info!(%previous_bpm, %bpm, "tempo changed");
            }
            Notification::Tick(frame) => {
                frames.set(frames.get() + 1);
                if verbose {
                    tracing::info!(
                        time = %format_time(frame.elapsed_seconds),
                        row = frame.active_row,
                        offset = frame.scroll_offset,
                        "tick"
                    );
                }
            }
            Notification::SongEnded => tracing::info!("song ended"),
        });
    }

    transport
        .seek(args.start_ms)
        .and_then(|()| transport.play())
        .map_err(|e| format!("Failed to start playback: {e}"))?;

    let frame_seconds = 1.0 / f64::from(args.fps.max(1));
    let mut shown_section = None;
    loop {
        transport.clock_mut().advance(frame_seconds);
        let flow = transport
            .frame()
            .map_err(|e| format!("Frame failed: {e}"))?;
        if flow.is_break() {
            break;
        }
        let section = transport.cursor().current_section;
        if shown_section != Some(section) {
            shown_section = Some(section);
            if let Some(layout) = transport.layout() {
                tracing::debug!(
                    section,
                    focused = ?layout.focused_side,
                    sprites = layout.sprites.len(),
                    "laid out section"
                );
            }
        }
    }

    println!("played {} frames", frames.get());
    Ok(())
}
