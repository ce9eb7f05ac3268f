//! Peer connection quality analysis.
//!
//! This module provides:
//! - `ConnectionQualityAnalyzer` - the sans-io engine and public facade
//! - `QualityLevel` - the ordered classification output
//! - `AnalyzerEvent` - the observer event streams
//!
//! The analyzer owns four independent channels, one per (direction, media
//! kind) pair. While the attached transport is connected it samples the
//! transport's stats once per second, keeps a short window of samples per
//! channel and classifies the deltas across that window. Verdicts and
//! windowed stats are published to registered observers; identical
//! successive values do not fire.
//!
//! The engine is driven from outside, in the manner of the other sans-io
//! state machines of this stack: `poll_timeout` exposes the next tick
//! deadline, `handle_timeout` runs a due tick and hands back the lazy
//! stats read to await, and `handle_stats_read` feeds the resolution back
//! in. Tests fabricate `Instant`s and snapshots to drive the engine tick
//! by tick; production code uses the [`crate::driver`] event loop.

mod channel;
mod classify;
mod event;
mod extract;
mod level;
mod sample;

pub use event::{AnalyzerEvent, AnalyzerEventKind, HandlerId, StatsUpdate};
pub use level::QualityLevel;

use crate::error::Result;
use crate::stats::{MediaKind, StatsSnapshot};
use crate::transport::{StatsReadFuture, StatsSource, TransportState};
use channel::ChannelAnalyzer;
use event::EventHandlers;
use extract::extract;
use log::{debug, trace};
use std::fmt;
use std::time::{Duration, Instant};

/// Fixed cadence of the stats sampler. The starvation floor of the
/// classifier is calibrated against this period, so it is part of the
/// observable contract rather than a tunable.
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Which side of the transport a channel accounts for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PeerDirection {
    /// This side sends media; the peer reports reception through RTCP.
    Sender,
    /// This side receives media.
    Receiver,
}

const PEER_DIRECTION_SENDER_STR: &str = "sender";
const PEER_DIRECTION_RECEIVER_STR: &str = "receiver";

impl fmt::Display for PeerDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            PeerDirection::Sender => PEER_DIRECTION_SENDER_STR,
            PeerDirection::Receiver => PEER_DIRECTION_RECEIVER_STR,
        };
        write!(f, "{s}")
    }
}

/// Epoch-tagged token of an in-flight stats read. Results handed back with
/// a token from a previous epoch are dropped without side effects.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StatsReadRequest {
    epoch: u64,
}

/// A stats read issued by [`ConnectionQualityAnalyzer::handle_timeout`]:
/// the token to hand back and the future to await.
pub struct PendingStatsRead {
    pub request: StatsReadRequest,
    pub future: StatsReadFuture,
}

const CHANNEL_COUNT: usize = 4;

fn channel_index(direction: PeerDirection, kind: MediaKind) -> usize {
    match (direction, kind) {
        (PeerDirection::Sender, MediaKind::Audio) => 0,
        (PeerDirection::Sender, MediaKind::Video) => 1,
        (PeerDirection::Receiver, MediaKind::Audio) => 2,
        (PeerDirection::Receiver, MediaKind::Video) => 3,
    }
}

/// Observes a media transport through its stats snapshots and classifies
/// the perceived quality of each channel.
///
/// The analyzer is inert until a transport is attached with
/// [`set_peer_connection`](Self::set_peer_connection). All four channels
/// are fed on every tick; the getters and the event streams expose the
/// pair belonging to the attached direction.
pub struct ConnectionQualityAnalyzer {
    source: Option<Box<dyn StatsSource>>,
    direction: PeerDirection,
    /// Bumped whenever accumulated analysis state becomes invalid; stats
    /// reads issued before the bump are dropped on arrival.
    epoch: u64,
    next_tick: Option<Instant>,
    /// Epoch of the read currently in flight. Ticks are strictly serial:
    /// no second read is issued while this matches the current epoch.
    pending_epoch: Option<u64>,
    channels: [ChannelAnalyzer; CHANNEL_COUNT],
    handlers: EventHandlers,
}

impl Default for ConnectionQualityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionQualityAnalyzer {
    /// Creates an inert analyzer.
    pub fn new() -> Self {
        ConnectionQualityAnalyzer {
            source: None,
            direction: PeerDirection::Sender,
            epoch: 0,
            next_tick: None,
            pending_epoch: None,
            channels: [
                ChannelAnalyzer::new(PeerDirection::Sender, MediaKind::Audio),
                ChannelAnalyzer::new(PeerDirection::Sender, MediaKind::Video),
                ChannelAnalyzer::new(PeerDirection::Receiver, MediaKind::Audio),
                ChannelAnalyzer::new(PeerDirection::Receiver, MediaKind::Video),
            ],
            handlers: EventHandlers::default(),
        }
    }

    /// Attaches a transport, or detaches with `None`, and selects the
    /// direction this side accounts for.
    ///
    /// Attaching resets all channels and schedules the first tick at
    /// `now`. Detaching cancels the pending read, stops the tick schedule
    /// and resets every channel to [`QualityLevel::Unknown`] without
    /// emitting events; repeated detach is a no-op.
    pub fn set_peer_connection(
        &mut self,
        source: Option<Box<dyn StatsSource>>,
        direction: PeerDirection,
        now: Instant,
    ) {
        if source.is_none() && self.source.is_none() {
            return;
        }
        self.bump_epoch();
        self.direction = direction;
        match source {
            Some(source) => {
                debug!(
                    "attached {direction} transport in state {}",
                    source.transport_state()
                );
                self.source = Some(source);
                self.next_tick = Some(now);
            }
            None => {
                debug!("detached transport");
                self.source = None;
                self.next_tick = None;
            }
        }
    }

    /// Current verdict of the attached direction's audio channel.
    pub fn connection_quality_audio(&self) -> QualityLevel {
        self.channels[channel_index(self.direction, MediaKind::Audio)].level()
    }

    /// Current verdict of the attached direction's video channel.
    pub fn connection_quality_video(&self) -> QualityLevel {
        self.channels[channel_index(self.direction, MediaKind::Video)].level()
    }

    /// Registers an observer for one event stream and returns the handle
    /// to unregister it with.
    pub fn on(
        &mut self,
        kind: AnalyzerEventKind,
        handler: impl FnMut(&AnalyzerEvent) + Send + 'static,
    ) -> HandlerId {
        self.handlers.insert(kind, Box::new(handler))
    }

    /// Unregisters an observer. Returns false when the handle is unknown.
    pub fn off(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(id)
    }

    /// Feeds a transport state notification. Any state outside the
    /// connected set invalidates in-flight reads and resets every channel,
    /// silently. The tick schedule is kept while a transport is attached,
    /// so analysis resumes once the transport recovers.
    pub fn handle_transport_state_change(&mut self, state: TransportState) {
        debug!("transport state {state}");
        if !state.is_connected() {
            self.bump_epoch();
        }
    }

    /// Deadline of the next tick, while a transport is attached.
    pub fn poll_timeout(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Runs the tick due at `now`.
    ///
    /// Returns the lazy stats read to await when the transport is
    /// connected and no read of the current epoch is in flight; the caller
    /// resolves it and hands the result to
    /// [`handle_stats_read`](Self::handle_stats_read).
    pub fn handle_timeout(&mut self, now: Instant) -> Option<PendingStatsRead> {
        let due = self.next_tick?;
        if now < due {
            return None;
        }
        self.next_tick = Some(now + TICK_INTERVAL);

        let connected = self
            .source
            .as_ref()
            .is_some_and(|source| source.transport_state().is_connected());
        if !connected {
            trace!("tick skipped, transport not connected");
            if self.channels.iter().any(|channel| channel.has_state()) {
                self.bump_epoch();
            }
            return None;
        }
        if self.pending_epoch == Some(self.epoch) {
            trace!("tick skipped, stats read in flight");
            return None;
        }

        let source = self.source.as_mut()?;
        self.pending_epoch = Some(self.epoch);
        Some(PendingStatsRead {
            request: StatsReadRequest { epoch: self.epoch },
            future: source.read_stats(),
        })
    }

    /// Feeds the resolution of an issued stats read.
    ///
    /// Results tagged with a previous epoch are dropped without side
    /// effects. A failed read advances every channel with a stalled tick;
    /// a snapshot advances every channel with its extracted sample and
    /// publishes the attached direction's events in a fixed order: audio
    /// quality, audio stats, video quality, video stats.
    pub fn handle_stats_read(&mut self, request: StatsReadRequest, result: Result<StatsSnapshot>) {
        if request.epoch != self.epoch {
            debug!("dropping stats read from epoch {}", request.epoch);
            return;
        }
        self.pending_epoch = None;

        let snapshot = match result {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                debug!("stats read failed: {err}");
                None
            }
        };

        for kind in [MediaKind::Audio, MediaKind::Video] {
            let mut changed = None;
            let mut update = None;
            for direction in [PeerDirection::Sender, PeerDirection::Receiver] {
                let sample = snapshot
                    .as_ref()
                    .and_then(|snapshot| extract(snapshot, direction, kind));
                let sampled = sample.is_some();
                let channel = &mut self.channels[channel_index(direction, kind)];
                let level_change = channel.advance(sample);
                if direction == self.direction {
                    changed = level_change;
                    if sampled {
                        update = channel.stats_update();
                    }
                }
            }
            if let Some(level) = changed {
                self.handlers.emit(match kind {
                    MediaKind::Audio => AnalyzerEvent::ConnectionQualityAudio(level),
                    MediaKind::Video => AnalyzerEvent::ConnectionQualityVideo(level),
                });
            }
            if let Some(update) = update {
                self.handlers.emit(match kind {
                    MediaKind::Audio => AnalyzerEvent::StatsAudio(update),
                    MediaKind::Video => AnalyzerEvent::StatsVideo(update),
                });
            }
        }
    }

    /// True while the read's epoch is still the current one.
    pub(crate) fn read_is_current(&self, request: &StatsReadRequest) -> bool {
        request.epoch == self.epoch
    }

    /// Invalidates everything accumulated so far: in-flight reads, ring
    /// contents, verdicts and the emitter's de-dup memory. Emits nothing.
    fn bump_epoch(&mut self) {
        self.epoch += 1;
        self.pending_epoch = None;
        for channel in &mut self.channels {
            channel.reset();
        }
        self.handlers.reset();
        trace!("analysis epoch {}", self.epoch);
    }
}
