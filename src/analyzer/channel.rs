use super::classify::{classify, NO_TRANSMISSION_STALL_TICKS};
use super::event::StatsUpdate;
use super::level::QualityLevel;
use super::sample::{Sample, SampleRing};
use super::PeerDirection;
use crate::stats::MediaKind;
use log::trace;

/// Analysis state of one (direction, media kind) channel: the sample
/// window, the stall counter and the last verdict.
///
/// A channel warms up until the ring is primed and reports
/// [`QualityLevel::Unknown`] meanwhile. Ticks whose local counter did not
/// advance suspend classification and retain the previous verdict; three
/// consecutive stalls declare the channel dead.
#[derive(Debug)]
pub(crate) struct ChannelAnalyzer {
    direction: PeerDirection,
    kind: MediaKind,
    ring: SampleRing,
    level: QualityLevel,
    stalled_ticks: u32,
}

impl ChannelAnalyzer {
    pub(crate) fn new(direction: PeerDirection, kind: MediaKind) -> Self {
        ChannelAnalyzer {
            direction,
            kind,
            ring: SampleRing::new(),
            level: QualityLevel::Unknown,
            stalled_ticks: 0,
        }
    }

    pub(crate) fn level(&self) -> QualityLevel {
        self.level
    }

    /// True when any tick of the current epoch left a trace.
    pub(crate) fn has_state(&self) -> bool {
        !self.ring.is_empty() || self.level.is_known() || self.stalled_ticks > 0
    }

    /// Drops everything accumulated in the current epoch, silently.
    pub(crate) fn reset(&mut self) {
        self.ring.clear();
        self.level = QualityLevel::Unknown;
        self.stalled_ticks = 0;
    }

    /// Advances the channel by one tick. `sample` is `None` when the read
    /// failed or produced no usable record. Returns the new level when it
    /// differs from the previously held one.
    pub(crate) fn advance(&mut self, sample: Option<Sample>) -> Option<QualityLevel> {
        let next = self.next_level(sample);
        if next == self.level {
            return None;
        }
        trace!("{} {} level {} -> {next}", self.direction, self.kind, self.level);
        self.level = next;
        Some(next)
    }

    fn next_level(&mut self, sample: Option<Sample>) -> QualityLevel {
        let stalled = match sample {
            None => {
                // Nothing to push; a failed read only counts as a stall
                // once the channel has seen data in this epoch.
                if self.ring.is_empty() {
                    return QualityLevel::Unknown;
                }
                self.stalled_ticks += 1;
                true
            }
            Some(sample) => {
                self.ring.push(sample);
                match self.ring.tick_local_delta() {
                    Some(delta) if delta > 0 => {
                        self.stalled_ticks = 0;
                        false
                    }
                    Some(_) => {
                        self.stalled_ticks += 1;
                        true
                    }
                    // Baseline row of the epoch.
                    None => false,
                }
            }
        };

        if !self.ring.is_primed() {
            return QualityLevel::Unknown;
        }
        if self.stalled_ticks >= NO_TRANSMISSION_STALL_TICKS {
            return QualityLevel::NoTransmittedData;
        }
        if stalled {
            // Tolerated stall: classification is suspended for this tick.
            return self.level;
        }
        classify(&self.ring, self.stalled_ticks)
    }

    /// Windowed aggregates for stats observers. `None` before the first
    /// sample of the epoch.
    pub(crate) fn stats_update(&self) -> Option<StatsUpdate> {
        let latest = self.ring.latest()?;
        let elapsed = self.ring.elapsed_seconds();
        let primed = self.ring.is_primed();
        Some(StatsUpdate {
            timestamp_ms: latest.t_ms,
            packets_per_second: (primed && elapsed > 0.0)
                .then(|| self.ring.local_delta() as f64 / elapsed),
            packet_loss_ratio: if primed {
                self.ring
                    .lost_delta()
                    .map(|lost| lost as f64 / self.ring.local_delta().max(1) as f64)
            } else {
                None
            },
            round_trip_time: latest.rtt_seconds,
            level: self.level,
        })
    }
}
