use super::level::QualityLevel;
use log::warn;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Windowed aggregates published to stats observers on every successful
/// tick of a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsUpdate {
    /// Stats timestamp of the latest sample, milliseconds.
    pub timestamp_ms: f64,
    /// Throughput across the analysis window, once it is primed.
    pub packets_per_second: Option<f64>,
    /// Lost over sent ratio across the window, once it is primed and the
    /// loss counter is reported.
    pub packet_loss_ratio: Option<f64>,
    /// Latest reported round trip time, seconds.
    pub round_trip_time: Option<f64>,
    /// Verdict held after this tick.
    pub level: QualityLevel,
}

/// A change published by the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerEvent {
    ConnectionQualityAudio(QualityLevel),
    ConnectionQualityVideo(QualityLevel),
    StatsAudio(StatsUpdate),
    StatsVideo(StatsUpdate),
}

impl AnalyzerEvent {
    pub fn kind(&self) -> AnalyzerEventKind {
        match self {
            AnalyzerEvent::ConnectionQualityAudio(_) => AnalyzerEventKind::ConnectionQualityAudio,
            AnalyzerEvent::ConnectionQualityVideo(_) => AnalyzerEventKind::ConnectionQualityVideo,
            AnalyzerEvent::StatsAudio(_) => AnalyzerEventKind::StatsAudio,
            AnalyzerEvent::StatsVideo(_) => AnalyzerEventKind::StatsVideo,
        }
    }
}

/// Registration key for one of the four event streams.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AnalyzerEventKind {
    ConnectionQualityAudio,
    ConnectionQualityVideo,
    StatsAudio,
    StatsVideo,
}

const EVENT_CONNECTION_QUALITY_AUDIO_STR: &str = "change:connectionQualityAudio";
const EVENT_CONNECTION_QUALITY_VIDEO_STR: &str = "change:connectionQualityVideo";
const EVENT_STATS_AUDIO_STR: &str = "change:statsAudio";
const EVENT_STATS_VIDEO_STR: &str = "change:statsVideo";

impl fmt::Display for AnalyzerEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            AnalyzerEventKind::ConnectionQualityAudio => EVENT_CONNECTION_QUALITY_AUDIO_STR,
            AnalyzerEventKind::ConnectionQualityVideo => EVENT_CONNECTION_QUALITY_VIDEO_STR,
            AnalyzerEventKind::StatsAudio => EVENT_STATS_AUDIO_STR,
            AnalyzerEventKind::StatsVideo => EVENT_STATS_VIDEO_STR,
        };
        write!(f, "{s}")
    }
}

/// Handle returned by observer registration, used to unregister.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Callback = Box<dyn FnMut(&AnalyzerEvent) + Send>;

struct HandlerEntry {
    id: u64,
    kind: AnalyzerEventKind,
    callback: Callback,
}

/// Per-event handler lists with change de-duplication.
///
/// An emitted value equal to the stream's previously emitted value does
/// not fire. Observers cannot reach back into the analyzer during
/// dispatch, so the handler list cannot change while it is iterated.
#[derive(Default)]
pub(crate) struct EventHandlers {
    next_id: u64,
    entries: Vec<HandlerEntry>,
    last_emitted: HashMap<AnalyzerEventKind, AnalyzerEvent>,
}

impl EventHandlers {
    pub(crate) fn insert(&mut self, kind: AnalyzerEventKind, callback: Callback) -> HandlerId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(HandlerEntry { id, kind, callback });
        HandlerId(id)
    }

    pub(crate) fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id.0);
        self.entries.len() != before
    }

    /// Forgets the previously emitted values; the next value of every
    /// stream fires again. Called on every epoch bump.
    pub(crate) fn reset(&mut self) {
        self.last_emitted.clear();
    }

    pub(crate) fn emit(&mut self, event: AnalyzerEvent) {
        let kind = event.kind();
        if self.last_emitted.get(&kind) == Some(&event) {
            return;
        }
        self.last_emitted.insert(kind, event.clone());
        for entry in self.entries.iter_mut().filter(|e| e.kind == kind) {
            // A panicking observer must not abort dispatch to the rest.
            if panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(&event))).is_err() {
                warn!("{kind} observer panicked");
            }
        }
    }
}
