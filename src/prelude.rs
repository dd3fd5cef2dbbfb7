//! Commonly used items.

#[cfg(feature = "json")]
pub use crate::chart::parse::{ChartParseError, parse_chart};
pub use crate::{
    chart::{
        ChartData, Note, RawNote, Section, Side, SideNotes, ValidationError,
        bpm::{Bpm, TryFromBpmError},
    },
    clock::{AudioClock, ClockError, ManualClock, SystemClock},
    config::{ControlEvent, PlayerConfig},
    layout::{NoteSprite, SectionLayout},
    load::LoadedChart,
    notify::{Subscribers, SubscriptionId},
    overlap::OverlapIndex,
    sync::{FrameInfo, Notification, PlaybackSynchronizer, SectionChange, TickOutput},
    timeline::{OutOfRangeError, SectionTimeline, SectionTiming},
    transport::{PlaybackCursor, TransportController, TransportError, TransportState},
    waveform::WaveformWindow,
};
