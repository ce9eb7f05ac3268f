use super::level::QualityLevel;
use super::sample::SampleRing;

/// Consecutive stalled ticks after which a channel is declared dead.
pub(crate) const NO_TRANSMISSION_STALL_TICKS: u32 = 3;

/// Loss ratios above these bounds degrade the verdict. Values exactly on a
/// bound land on the better side.
const PACKET_LOSS_MEDIUM: f64 = 0.03;
const PACKET_LOSS_BAD: f64 = 0.1;
const PACKET_LOSS_VERY_BAD: f64 = 0.2;

/// Round trip times in seconds above these bounds degrade the verdict.
const RTT_MEDIUM_SECONDS: f64 = 0.3;
const RTT_BAD_SECONDS: f64 = 0.5;
const RTT_VERY_BAD_SECONDS: f64 = 1.0;

/// Below this throughput the channel counts as starved. Calibrated against
/// the one second tick period and the five interval window.
const MIN_PACKETS_PER_SECOND: f64 = 10.0;

/// Classifies a primed window.
///
/// Pure function of the ring contents and the stall counter; arms whose
/// underlying counter was never reported are skipped rather than evaluated
/// against zero.
pub(crate) fn classify(ring: &SampleRing, stalled_ticks: u32) -> QualityLevel {
    if stalled_ticks >= NO_TRANSMISSION_STALL_TICKS {
        return QualityLevel::NoTransmittedData;
    }

    let local = ring.local_delta();
    if local > 0 && ring.remote_delta().is_some_and(|remote| remote <= 0) {
        // Everything sent over the window was lost.
        return QualityLevel::NoTransmittedData;
    }

    let elapsed = ring.elapsed_seconds();
    let packets_per_second = if elapsed > 0.0 {
        local as f64 / elapsed
    } else {
        0.0
    };
    let loss_ratio = ring
        .lost_delta()
        .map(|lost| lost as f64 / local.max(1) as f64);
    let rtt = ring.latest_rtt();

    if loss_ratio.is_some_and(|r| r > PACKET_LOSS_VERY_BAD)
        || packets_per_second < MIN_PACKETS_PER_SECOND
        || rtt.is_some_and(|t| t > RTT_VERY_BAD_SECONDS)
    {
        QualityLevel::VeryBad
    } else if loss_ratio.is_some_and(|r| r > PACKET_LOSS_BAD) || rtt.is_some_and(|t| t > RTT_BAD_SECONDS)
    {
        QualityLevel::Bad
    } else if loss_ratio.is_some_and(|r| r > PACKET_LOSS_MEDIUM)
        || rtt.is_some_and(|t| t > RTT_MEDIUM_SECONDS)
    {
        QualityLevel::Medium
    } else {
        QualityLevel::Good
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::sample::Sample;

    /// Ring spanning exactly five seconds with the given end counters.
    fn ring(local: u64, lost: Option<i64>, remote: Option<u64>, rtt: Option<f64>) -> SampleRing {
        let mut ring = SampleRing::new();
        ring.push(Sample {
            t_ms: 0.0,
            packets_local: 0,
            packets_remote: remote.map(|_| 0),
            packets_lost: lost.map(|_| 0),
            rtt_seconds: rtt,
        });
        ring.push(Sample {
            t_ms: 5000.0,
            packets_local: local,
            packets_remote: remote,
            packets_lost: lost,
            rtt_seconds: rtt,
        });
        ring
    }

    #[test]
    fn test_clean_window_is_good() {
        assert_eq!(
            classify(&ring(250, Some(0), Some(250), Some(0.1)), 0),
            QualityLevel::Good
        );
    }

    #[test]
    fn test_loss_ratio_buckets() {
        // 7 / 250 = 0.028
        assert_eq!(
            classify(&ring(250, Some(7), None, Some(0.1)), 0),
            QualityLevel::Good
        );
        // 15 / 250 = 0.06
        assert_eq!(
            classify(&ring(250, Some(15), None, Some(0.1)), 0),
            QualityLevel::Medium
        );
        // 45 / 250 = 0.18
        assert_eq!(
            classify(&ring(250, Some(45), None, Some(0.1)), 0),
            QualityLevel::Bad
        );
        // 75 / 250 = 0.3
        assert_eq!(
            classify(&ring(250, Some(75), None, Some(0.1)), 0),
            QualityLevel::VeryBad
        );
    }

    #[test]
    fn test_loss_ratio_boundaries_land_on_the_better_side() {
        // Exactly 0.03, 0.1 and 0.2 stay in the higher bucket.
        let cases = [
            (300, 9, QualityLevel::Good),      // 0.03
            (300, 30, QualityLevel::Medium),   // 0.1
            (300, 60, QualityLevel::Bad),      // 0.2
            (300, 61, QualityLevel::VeryBad),  // just above 0.2
        ];
        for (local, lost, expected) in cases {
            assert_eq!(
                classify(&ring(local, Some(lost), None, Some(0.1)), 0),
                expected,
                "loss {lost}/{local}"
            );
        }
    }

    #[test]
    fn test_rtt_buckets_and_boundaries() {
        let cases = [
            (Some(0.3), QualityLevel::Good),
            (Some(0.31), QualityLevel::Medium),
            (Some(0.5), QualityLevel::Medium),
            (Some(0.51), QualityLevel::Bad),
            (Some(1.0), QualityLevel::Bad),
            (Some(1.01), QualityLevel::VeryBad),
            (None, QualityLevel::Good),
        ];
        for (rtt, expected) in cases {
            assert_eq!(
                classify(&ring(250, Some(0), None, rtt), 0),
                expected,
                "rtt {rtt:?}"
            );
        }
    }

    #[test]
    fn test_starved_channel_is_very_bad_regardless_of_loss() {
        // 49 packets over 5 seconds is 9.8 per second.
        assert_eq!(
            classify(&ring(49, Some(0), Some(49), Some(0.1)), 0),
            QualityLevel::VeryBad
        );
        // Exactly 10 per second is not starved.
        assert_eq!(
            classify(&ring(50, Some(0), Some(50), Some(0.1)), 0),
            QualityLevel::Good
        );
    }

    #[test]
    fn test_full_loss_is_no_transmitted_data() {
        assert_eq!(
            classify(&ring(250, Some(250), Some(0), Some(0.1)), 0),
            QualityLevel::NoTransmittedData
        );
        // Derived remote delta from local - lost hits the same rule.
        assert_eq!(
            classify(&ring(250, Some(250), None, Some(0.1)), 0),
            QualityLevel::NoTransmittedData
        );
    }

    #[test]
    fn test_prolonged_stall_is_no_transmitted_data() {
        assert_eq!(
            classify(&ring(250, Some(0), Some(250), Some(0.1)), NO_TRANSMISSION_STALL_TICKS),
            QualityLevel::NoTransmittedData
        );
    }

    #[test]
    fn test_missing_loss_and_rtt_do_not_degrade() {
        // Without loss or rtt counters only throughput can degrade.
        assert_eq!(classify(&ring(250, None, None, None), 0), QualityLevel::Good);
        assert_eq!(classify(&ring(20, None, None, None), 0), QualityLevel::VeryBad);
    }
}
