//! Transport stats model.
//!
//! This module provides:
//! - `StatRecord` - one typed entry of a stats snapshot
//! - `StatsSnapshot` - the flat record collection returned by a stats read
//!
//! The model mirrors the W3C `getStats()` wire shape: each record is tagged
//! by its `type` string and carries camelCase counters, any of which may
//! legitimately be absent while the transport has not populated them yet.
//! Absent counters stay `None`; they are never coerced to zero.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Media kind of an RTP stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "audio")]
    Audio,
    #[serde(rename = "video")]
    Video,
}

const MEDIA_KIND_AUDIO_STR: &str = "audio";
const MEDIA_KIND_VIDEO_STR: &str = "video";

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            MediaKind::Audio => MEDIA_KIND_AUDIO_STR,
            MediaKind::Video => MEDIA_KIND_VIDEO_STR,
        };
        write!(f, "{s}")
    }
}

/// Counters reported for an RTP stream sent by this side (`outbound-rtp`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundRtpStats {
    pub kind: MediaKind,
    /// Monotonic capture time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packets_sent: Option<u64>,
}

/// Counters reported for an RTP stream received by this side (`inbound-rtp`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRtpStats {
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packets_received: Option<u64>,
    /// Cumulative packets lost. May go negative when duplicates are
    /// suppressed, hence signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packets_lost: Option<i64>,
}

/// The remote peer's view of the stream this side sends
/// (`remote-inbound-rtp`), derived from RTCP receiver reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteInboundRtpStats {
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packets_received: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packets_lost: Option<i64>,
    /// Most recent round trip time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_trip_time: Option<f64>,
}

/// The remote peer's view of the stream this side receives
/// (`remote-outbound-rtp`), derived from RTCP sender reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOutboundRtpStats {
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packets_sent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_trip_time: Option<f64>,
}

/// One entry of a stats snapshot, tagged by its `type` string.
///
/// Record types outside the four RTP stream flavors deserialize into
/// [`StatRecord::Unsupported`] and are skipped by every consumer, so a full
/// `getStats()` dump can be fed in unfiltered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StatRecord {
    #[serde(rename = "outbound-rtp")]
    OutboundRtp(OutboundRtpStats),
    #[serde(rename = "inbound-rtp")]
    InboundRtp(InboundRtpStats),
    #[serde(rename = "remote-inbound-rtp")]
    RemoteInboundRtp(RemoteInboundRtpStats),
    #[serde(rename = "remote-outbound-rtp")]
    RemoteOutboundRtp(RemoteOutboundRtpStats),
    #[serde(other, rename = "unsupported")]
    Unsupported,
}

impl StatRecord {
    /// Media kind of the record, if it carries one.
    pub fn kind(&self) -> Option<MediaKind> {
        match self {
            StatRecord::OutboundRtp(s) => Some(s.kind),
            StatRecord::InboundRtp(s) => Some(s.kind),
            StatRecord::RemoteInboundRtp(s) => Some(s.kind),
            StatRecord::RemoteOutboundRtp(s) => Some(s.kind),
            StatRecord::Unsupported => None,
        }
    }

    /// Capture time of the record, if reported.
    pub fn timestamp(&self) -> Option<f64> {
        match self {
            StatRecord::OutboundRtp(s) => s.timestamp,
            StatRecord::InboundRtp(s) => s.timestamp,
            StatRecord::RemoteInboundRtp(s) => s.timestamp,
            StatRecord::RemoteOutboundRtp(s) => s.timestamp,
            StatRecord::Unsupported => None,
        }
    }
}

/// A flat collection of stat records captured at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsSnapshot {
    records: Vec<StatRecord>,
}

impl StatsSnapshot {
    pub fn new(records: Vec<StatRecord>) -> Self {
        StatsSnapshot { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatRecord> {
        self.records.iter()
    }

    /// Returns all `outbound-rtp` records of the given kind.
    pub fn outbound_rtp(&self, kind: MediaKind) -> impl Iterator<Item = &OutboundRtpStats> {
        self.records.iter().filter_map(move |r| match r {
            StatRecord::OutboundRtp(s) if s.kind == kind => Some(s),
            _ => None,
        })
    }

    /// Returns all `inbound-rtp` records of the given kind.
    pub fn inbound_rtp(&self, kind: MediaKind) -> impl Iterator<Item = &InboundRtpStats> {
        self.records.iter().filter_map(move |r| match r {
            StatRecord::InboundRtp(s) if s.kind == kind => Some(s),
            _ => None,
        })
    }

    /// Returns all `remote-inbound-rtp` records of the given kind.
    pub fn remote_inbound_rtp(
        &self,
        kind: MediaKind,
    ) -> impl Iterator<Item = &RemoteInboundRtpStats> {
        self.records.iter().filter_map(move |r| match r {
            StatRecord::RemoteInboundRtp(s) if s.kind == kind => Some(s),
            _ => None,
        })
    }

    /// Returns all `remote-outbound-rtp` records of the given kind.
    pub fn remote_outbound_rtp(
        &self,
        kind: MediaKind,
    ) -> impl Iterator<Item = &RemoteOutboundRtpStats> {
        self.records.iter().filter_map(move |r| match r {
            StatRecord::RemoteOutboundRtp(s) if s.kind == kind => Some(s),
            _ => None,
        })
    }
}

impl From<Vec<StatRecord>> for StatsSnapshot {
    fn from(records: Vec<StatRecord>) -> Self {
        StatsSnapshot::new(records)
    }
}
