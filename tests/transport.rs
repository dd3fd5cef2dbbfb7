mod dsl;

use std::{cell::RefCell, num::NonZeroU32, ops::ControlFlow, rc::Rc};

use fnf_chart::{
    chart::{ChartData, RawNote, Section},
    clock::{ClockError, ManualClock},
    config::{ControlEvent, PlayerConfig},
    sync::Notification,
    transport::{PlaybackCursor, TransportController, TransportError, TransportState},
};
use pretty_assertions::assert_eq;

use self::dsl::{ClockOp, FlakyClock, song_ends};

fn empty() -> TransportController<ManualClock> {
    TransportController::new(ManualClock::new(), PlayerConfig::default())
}

fn loaded() -> TransportController<ManualClock> {
    let mut transport = empty();
    transport
        .load(ChartData::new(100.0, vec![Section::default(); 4]))
        .expect("chart must load");
    transport
}

#[test]
fn operations_without_chart_are_noops() {
    let mut transport = empty();
    transport.play().unwrap();
    transport.pause().unwrap();
    transport.seek(1000.0).unwrap();
    transport.next().unwrap();
    transport.previous().unwrap();
    transport.stop().unwrap();
    assert_eq!(transport.frame(), Ok(ControlFlow::Break(())));
    assert_eq!(transport.state(), TransportState::Paused);
    assert_eq!(*transport.cursor(), PlaybackCursor::default());
    assert!(transport.layout().is_none());
    assert_eq!(transport.clock().starts(), 0);
}

#[test]
fn play_and_pause_are_idempotent() {
    let mut transport = loaded();
    transport.play().unwrap();
    transport.play().unwrap();
    assert_eq!(transport.clock().starts(), 1);

    transport.clock_mut().advance(1.0);
    transport.pause().unwrap();
    transport.pause().unwrap();
    assert_eq!(transport.clock().stops(), 1);
    assert_eq!(transport.cursor().paused_at_ms, Some(1000.0));
}

#[test]
fn resume_starts_audio_at_paused_position() {
    let mut transport = loaded();
    transport.seek(5000.0).unwrap();
    assert_eq!(transport.cursor().current_section, 2);
    assert_eq!(transport.cursor().paused_at_ms, Some(5000.0));
    assert_eq!(transport.clock().starts(), 0);

    transport.play().unwrap();
    assert_eq!(transport.clock().output_offset(), Some(5.0));
    assert_eq!(transport.elapsed_ms(), Ok(5000.0));
}

#[test]
fn seek_clamps_into_song() {
    let mut transport = loaded();
    transport.seek(-300.0).unwrap();
    assert_eq!(transport.cursor().paused_at_ms, Some(0.0));
    transport.seek(1e9).unwrap();
    assert_eq!(transport.cursor().paused_at_ms, Some(9600.0));
    assert_eq!(transport.cursor().current_section, 3);
    transport.seek(f64::NAN).unwrap();
    assert_eq!(transport.cursor().paused_at_ms, Some(0.0));
}

#[test]
fn next_and_previous_wrap() {
    let mut transport = loaded();
    transport.previous().unwrap();
    assert_eq!(transport.cursor().current_section, 3);
    assert_eq!(transport.cursor().paused_at_ms, Some(7200.0));
    transport.next().unwrap();
    assert_eq!(transport.cursor().current_section, 0);
    transport.next().unwrap();
    transport.next().unwrap();
    assert_eq!(transport.cursor().current_section, 2);
    assert_eq!(transport.cursor().paused_at_ms, Some(4800.0));
}

#[test]
fn next_while_playing_resolves_section_from_clock() {
    let mut transport = loaded();
    transport.play().unwrap();
    // no frame ran, the cursor still says section 0
    transport.clock_mut().advance(2.5);
    transport.next().unwrap();
    assert_eq!(transport.cursor().current_section, 2);
    assert_eq!(transport.clock().output_offset(), Some(4.8));
    assert_eq!(transport.state(), TransportState::Playing);
}

#[test]
fn stop_rewinds_from_any_state() {
    let mut transport = loaded();
    transport.seek(6000.0).unwrap();
    transport.stop().unwrap();
    assert_eq!(*transport.cursor(), PlaybackCursor::default());

    transport.play().unwrap();
    transport.clock_mut().advance(4.0);
    transport.frame().unwrap();
    transport.stop().unwrap();
    assert_eq!(*transport.cursor(), PlaybackCursor::default());
    assert_eq!(transport.state(), TransportState::Paused);
    assert!(!transport.clock().is_running());
}

#[test]
fn clock_failures_surface() {
    let mut transport = loaded();
    transport.clock_mut().set_unavailable(true);
    assert!(matches!(
        transport.play(),
        Err(TransportError::Clock(ClockError::Unavailable(_)))
    ));
    assert_eq!(transport.state(), TransportState::Paused);

    transport.clock_mut().set_unavailable(false);
    transport.play().unwrap();
    transport.clock_mut().set_unavailable(true);
    assert!(transport.frame().is_err());
    assert!(transport.elapsed_ms().is_err());
    assert!(transport.pause().is_err());
}

fn flaky_playing() -> TransportController<FlakyClock> {
    let mut transport = TransportController::new(FlakyClock::new(), PlayerConfig::default());
    transport
        .load(ChartData::new(100.0, vec![Section::default(); 4]))
        .expect("chart must load");
    transport.play().unwrap();
    transport.clock_mut().manual_mut().advance(1.0);
    transport
}

#[test]
fn failed_restart_during_seek_leaves_transport_paused() {
    let mut transport = flaky_playing();
    transport.clock_mut().fail(ClockOp::Start);
    assert!(matches!(
        transport.seek(5000.0),
        Err(TransportError::Clock(ClockError::Unavailable(_)))
    ));
    assert_eq!(transport.state(), TransportState::Paused);
    assert_eq!(
        *transport.cursor(),
        PlaybackCursor {
            current_section: 2,
            paused_at_ms: Some(5000.0),
            started_at_clock_time: None,
        }
    );
    assert!(!transport.clock().manual().is_running());
    assert_eq!(transport.frame(), Ok(ControlFlow::Break(())));

    transport.clock_mut().recover();
    transport.play().unwrap();
    assert_eq!(transport.clock().manual().output_offset(), Some(5.0));
}

#[test]
fn failed_read_during_seek_keeps_playing() {
    let mut transport = flaky_playing();
    transport.clock_mut().fail(ClockOp::Now);
    assert!(transport.seek(5000.0).is_err());
    assert_eq!(transport.state(), TransportState::Playing);
    assert!(transport.clock().manual().is_running());
    assert_eq!(transport.cursor().current_section, 0);

    transport.clock_mut().recover();
    assert_eq!(transport.elapsed_ms(), Ok(1000.0));
}

#[test]
fn failed_stop_during_pause_keeps_playing() {
    let mut transport = flaky_playing();
    transport.clock_mut().fail(ClockOp::Stop);
    assert!(transport.pause().is_err());
    assert_eq!(transport.state(), TransportState::Playing);
    assert!(transport.clock().manual().is_running());

    transport.clock_mut().recover();
    transport.pause().unwrap();
    assert_eq!(transport.cursor().paused_at_ms, Some(1000.0));
}

#[test]
fn failed_stop_at_song_end_reports_end_once() {
    let mut transport = flaky_playing();
    let log = Rc::new(RefCell::new(Vec::new()));
    {
        let log = Rc::clone(&log);
        transport.subscribe(move |notification| log.borrow_mut().push(*notification));
    }
    transport.clock_mut().manual_mut().advance(9.0);
    transport.clock_mut().fail(ClockOp::Stop);
    assert!(transport.frame().is_err());
    assert_eq!(*log.borrow(), vec![Notification::SongEnded]);
    assert_eq!(transport.state(), TransportState::Playing);

    assert_eq!(transport.frame(), Ok(ControlFlow::Break(())));
    assert_eq!(song_ends(&log.borrow()), 1);

    transport.clock_mut().recover();
    transport.stop().unwrap();
    assert_eq!(*transport.cursor(), PlaybackCursor::default());
    assert!(!transport.clock().manual().is_running());
}

#[test]
fn load_replaces_chart_and_stops() {
    let mut transport = loaded();
    transport.play().unwrap();
    transport.clock_mut().advance(3.0);
    transport
        .load(ChartData::new(200.0, vec![Section::default(); 2]))
        .unwrap();
    assert_eq!(transport.state(), TransportState::Paused);
    assert_eq!(*transport.cursor(), PlaybackCursor::default());
    assert_eq!(transport.chart().map(|chart| chart.song_duration_ms()), Some(2400.0));

    assert!(matches!(
        transport.load(ChartData::new(120.0, Vec::new())),
        Err(TransportError::Chart(_))
    ));
    assert!(transport.chart().is_some());

    transport.unload().unwrap();
    assert!(transport.chart().is_none());
}

#[test]
fn subscribers_receive_in_registration_order() {
    let mut transport = loaded();
    let log = Rc::new(RefCell::new(Vec::new()));
    for name in ["renderer", "hud"] {
        let log = Rc::clone(&log);
        transport.subscribe(move |notification| {
            if let Notification::SectionChanged(change) = notification {
                log.borrow_mut().push((name, change.section));
            }
        });
    }
    transport.play().unwrap();
    transport.clock_mut().advance(2.5);
    transport.frame().unwrap();
    assert_eq!(*log.borrow(), vec![("renderer", 1), ("hud", 1)]);
}

#[test]
fn unsubscribed_listener_is_not_called() {
    let mut transport = loaded();
    let count = Rc::new(RefCell::new(0));
    let id = {
        let count = Rc::clone(&count);
        transport.subscribe(move |_| *count.borrow_mut() += 1)
    };
    transport.play().unwrap();
    transport.frame().unwrap();
    assert!(transport.unsubscribe(id));
    transport.frame().unwrap();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn control_events_update_config() {
    let mut transport = empty();
    transport
        .load(ChartData::new(
            100.0,
            vec![
                Section::new(vec![RawNote::new(1000.0, 0, 500.0)]),
                Section::default(),
            ],
        ))
        .unwrap();
    assert!(transport.chart().is_some_and(|chart| chart.overlaps().is_empty()));

    transport.post_events([
        ControlEvent::SetViewportHeight { height: 480.0 },
        ControlEvent::SetRowsPerSection {
            rows: NonZeroU32::new(1).unwrap(),
        },
    ]);
    assert_eq!(transport.config().viewport_height, 480.0);
    assert!(transport.chart().is_some_and(|chart| chart.overlaps().has_donors(1)));
    let layout = transport.layout().unwrap();
    assert_eq!(layout.cell_height, 480.0);
}
