use super::sample::Sample;
use super::PeerDirection;
use crate::stats::{MediaKind, StatsSnapshot};

/// Pulls the counters one channel needs out of a raw snapshot.
///
/// Returns `None` when the snapshot holds no usable record for the
/// channel (missing local counter or missing timestamp); the caller
/// treats that as a stalled tick. Multiple records of one type and kind,
/// as with simulcast, are aggregated: counters are summed, the newest
/// timestamp wins and the last reported round trip time wins.
pub(crate) fn extract(
    snapshot: &StatsSnapshot,
    direction: PeerDirection,
    kind: MediaKind,
) -> Option<Sample> {
    match direction {
        PeerDirection::Sender => extract_sender(snapshot, kind),
        PeerDirection::Receiver => extract_receiver(snapshot, kind),
    }
}

fn extract_sender(snapshot: &StatsSnapshot, kind: MediaKind) -> Option<Sample> {
    let mut t_ms: Option<f64> = None;
    let mut local: Option<u64> = None;
    for rec in snapshot.outbound_rtp(kind) {
        // A record without a timestamp or the local counter is unusable.
        let (Some(ts), Some(sent)) = (rec.timestamp, rec.packets_sent) else {
            continue;
        };
        t_ms = Some(t_ms.map_or(ts, |t: f64| t.max(ts)));
        local = Some(local.unwrap_or(0) + sent);
    }
    let (t_ms, packets_local) = (t_ms?, local?);

    let mut remote: Option<u64> = None;
    let mut lost: Option<i64> = None;
    let mut rtt: Option<f64> = None;
    for rec in snapshot.remote_inbound_rtp(kind) {
        if rec.timestamp.is_none() {
            continue;
        }
        if let Some(received) = rec.packets_received {
            remote = Some(remote.unwrap_or(0) + received);
        }
        if let Some(l) = rec.packets_lost {
            lost = Some(lost.unwrap_or(0) + l);
        }
        if let Some(t) = rec.round_trip_time {
            rtt = Some(t);
        }
    }

    Some(Sample {
        t_ms,
        packets_local,
        packets_remote: remote,
        packets_lost: lost,
        rtt_seconds: rtt,
    })
}

fn extract_receiver(snapshot: &StatsSnapshot, kind: MediaKind) -> Option<Sample> {
    let mut t_ms: Option<f64> = None;
    let mut local: Option<u64> = None;
    let mut lost: Option<i64> = None;
    for rec in snapshot.inbound_rtp(kind) {
        let (Some(ts), Some(received)) = (rec.timestamp, rec.packets_received) else {
            continue;
        };
        t_ms = Some(t_ms.map_or(ts, |t: f64| t.max(ts)));
        local = Some(local.unwrap_or(0) + received);
        if let Some(l) = rec.packets_lost {
            lost = Some(lost.unwrap_or(0) + l);
        }
    }
    let (t_ms, packets_local) = (t_ms?, local?);

    let mut remote: Option<u64> = None;
    let mut rtt: Option<f64> = None;
    for rec in snapshot.remote_outbound_rtp(kind) {
        if rec.timestamp.is_none() {
            continue;
        }
        if let Some(sent) = rec.packets_sent {
            remote = Some(remote.unwrap_or(0) + sent);
        }
        if let Some(t) = rec.round_trip_time {
            rtt = Some(t);
        }
    }

    Some(Sample {
        t_ms,
        packets_local,
        packets_remote: remote,
        packets_lost: lost,
        rtt_seconds: rtt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{
        InboundRtpStats, OutboundRtpStats, RemoteInboundRtpStats, RemoteOutboundRtpStats,
        StatRecord,
    };

    #[test]
    fn test_sender_extraction() {
        let snapshot = StatsSnapshot::new(vec![
            StatRecord::OutboundRtp(OutboundRtpStats {
                kind: MediaKind::Audio,
                timestamp: Some(10000.0),
                packets_sent: Some(50),
            }),
            StatRecord::RemoteInboundRtp(RemoteInboundRtpStats {
                kind: MediaKind::Audio,
                timestamp: Some(10000.0),
                packets_received: Some(48),
                packets_lost: Some(2),
                round_trip_time: Some(0.1),
            }),
        ]);

        let sample = extract(&snapshot, PeerDirection::Sender, MediaKind::Audio).unwrap();
        assert_eq!(sample.t_ms, 10000.0);
        assert_eq!(sample.packets_local, 50);
        assert_eq!(sample.packets_remote, Some(48));
        assert_eq!(sample.packets_lost, Some(2));
        assert_eq!(sample.rtt_seconds, Some(0.1));
    }

    #[test]
    fn test_receiver_extraction() {
        let snapshot = StatsSnapshot::new(vec![
            StatRecord::InboundRtp(InboundRtpStats {
                kind: MediaKind::Video,
                timestamp: Some(20000.0),
                packets_received: Some(900),
                packets_lost: Some(12),
            }),
            StatRecord::RemoteOutboundRtp(RemoteOutboundRtpStats {
                kind: MediaKind::Video,
                timestamp: Some(20000.0),
                packets_sent: Some(912),
                round_trip_time: Some(0.25),
            }),
        ]);

        let sample = extract(&snapshot, PeerDirection::Receiver, MediaKind::Video).unwrap();
        assert_eq!(sample.packets_local, 900);
        assert_eq!(sample.packets_remote, Some(912));
        assert_eq!(sample.packets_lost, Some(12));
        assert_eq!(sample.rtt_seconds, Some(0.25));
    }

    #[test]
    fn test_missing_local_counter_stalls_the_tick() {
        let snapshot = StatsSnapshot::new(vec![StatRecord::OutboundRtp(OutboundRtpStats {
            kind: MediaKind::Audio,
            timestamp: Some(10000.0),
            packets_sent: None,
        })]);
        assert!(extract(&snapshot, PeerDirection::Sender, MediaKind::Audio).is_none());
        // A snapshot without any record of the kind stalls too.
        assert!(extract(&snapshot, PeerDirection::Sender, MediaKind::Video).is_none());
    }

    #[test]
    fn test_record_without_timestamp_is_ignored() {
        let snapshot = StatsSnapshot::new(vec![
            StatRecord::OutboundRtp(OutboundRtpStats {
                kind: MediaKind::Audio,
                timestamp: None,
                packets_sent: Some(50),
            }),
            StatRecord::RemoteInboundRtp(RemoteInboundRtpStats {
                kind: MediaKind::Audio,
                timestamp: None,
                packets_received: Some(48),
                packets_lost: Some(2),
                round_trip_time: Some(0.1),
            }),
        ]);
        assert!(extract(&snapshot, PeerDirection::Sender, MediaKind::Audio).is_none());
    }

    #[test]
    fn test_absent_remote_counters_stay_absent() {
        let snapshot = StatsSnapshot::new(vec![
            StatRecord::OutboundRtp(OutboundRtpStats {
                kind: MediaKind::Audio,
                timestamp: Some(10000.0),
                packets_sent: Some(50),
            }),
            StatRecord::RemoteInboundRtp(RemoteInboundRtpStats {
                kind: MediaKind::Audio,
                timestamp: Some(10000.0),
                packets_received: None,
                packets_lost: Some(0),
                round_trip_time: None,
            }),
        ]);

        let sample = extract(&snapshot, PeerDirection::Sender, MediaKind::Audio).unwrap();
        assert_eq!(sample.packets_remote, None);
        assert_eq!(sample.packets_lost, Some(0));
        assert_eq!(sample.rtt_seconds, None);
    }

    #[test]
    fn test_simulcast_records_are_aggregated() {
        let snapshot = StatsSnapshot::new(vec![
            StatRecord::OutboundRtp(OutboundRtpStats {
                kind: MediaKind::Video,
                timestamp: Some(10000.0),
                packets_sent: Some(100),
            }),
            StatRecord::OutboundRtp(OutboundRtpStats {
                kind: MediaKind::Video,
                timestamp: Some(10002.0),
                packets_sent: Some(40),
            }),
            StatRecord::RemoteInboundRtp(RemoteInboundRtpStats {
                kind: MediaKind::Video,
                timestamp: Some(10000.0),
                packets_received: Some(95),
                packets_lost: Some(5),
                round_trip_time: Some(0.1),
            }),
            StatRecord::RemoteInboundRtp(RemoteInboundRtpStats {
                kind: MediaKind::Video,
                timestamp: Some(10002.0),
                packets_received: Some(38),
                packets_lost: Some(2),
                round_trip_time: Some(0.2),
            }),
        ]);

        let sample = extract(&snapshot, PeerDirection::Sender, MediaKind::Video).unwrap();
        assert_eq!(sample.t_ms, 10002.0);
        assert_eq!(sample.packets_local, 140);
        assert_eq!(sample.packets_remote, Some(133));
        assert_eq!(sample.packets_lost, Some(7));
        assert_eq!(sample.rtt_seconds, Some(0.2));
    }
}
