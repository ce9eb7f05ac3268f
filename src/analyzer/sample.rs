use std::collections::VecDeque;

/// Tick intervals spanned by the analysis window.
pub(crate) const WINDOW_INTERVALS: usize = 5;

/// Rows retained per channel: the baseline plus one row per window interval.
const RETAINED_ROWS: usize = WINDOW_INTERVALS + 1;

/// One row of per-channel counters captured on a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Sample {
    /// Monotonic stats timestamp in milliseconds.
    pub t_ms: f64,
    /// Packets accounted for by this side (sent for a sender channel,
    /// received for a receiver channel).
    pub packets_local: u64,
    /// Counterpart counter reported by the peer, when available.
    pub packets_remote: Option<u64>,
    pub packets_lost: Option<i64>,
    pub rtt_seconds: Option<f64>,
}

/// Bounded, ordered buffer of the most recent samples for one channel.
///
/// Pushing into a full ring evicts the oldest row, which promotes its
/// successor to baseline. All window deltas are computed between the
/// baseline and the latest row.
#[derive(Debug, Default)]
pub(crate) struct SampleRing {
    rows: VecDeque<Sample>,
}

impl SampleRing {
    pub(crate) fn new() -> Self {
        SampleRing {
            rows: VecDeque::with_capacity(RETAINED_ROWS),
        }
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        if self.rows.len() == RETAINED_ROWS {
            self.rows.pop_front();
        }
        self.rows.push_back(sample);
    }

    pub(crate) fn clear(&mut self) {
        self.rows.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True once enough rows are held to span the full window.
    pub(crate) fn is_primed(&self) -> bool {
        self.rows.len() >= RETAINED_ROWS
    }

    /// Oldest retained row, the left end of the delta window.
    pub(crate) fn baseline(&self) -> Option<&Sample> {
        self.rows.front()
    }

    pub(crate) fn latest(&self) -> Option<&Sample> {
        self.rows.back()
    }

    /// Second newest row, used for single-tick stall detection.
    pub(crate) fn previous(&self) -> Option<&Sample> {
        self.rows.len().checked_sub(2).and_then(|i| self.rows.get(i))
    }

    /// Local packet delta across the window.
    pub(crate) fn local_delta(&self) -> i64 {
        match (self.baseline(), self.latest()) {
            (Some(b), Some(l)) => l.packets_local as i64 - b.packets_local as i64,
            _ => 0,
        }
    }

    /// Lost packet delta across the window, when both ends reported it.
    pub(crate) fn lost_delta(&self) -> Option<i64> {
        let (b, l) = (self.baseline()?, self.latest()?);
        Some(l.packets_lost? - b.packets_lost?)
    }

    /// Remote packet delta across the window. When the peer's counter is
    /// unavailable at either end it is derived as `local - lost`; with
    /// neither counter available there is no delta.
    pub(crate) fn remote_delta(&self) -> Option<i64> {
        let (b, l) = (self.baseline()?, self.latest()?);
        match (b.packets_remote, l.packets_remote) {
            (Some(b_remote), Some(l_remote)) => Some(l_remote as i64 - b_remote as i64),
            _ => self.lost_delta().map(|lost| self.local_delta() - lost),
        }
    }

    /// Seconds spanned by the window.
    pub(crate) fn elapsed_seconds(&self) -> f64 {
        match (self.baseline(), self.latest()) {
            (Some(b), Some(l)) => (l.t_ms - b.t_ms) / 1000.0,
            _ => 0.0,
        }
    }

    /// Local packet delta of the newest interval only. `None` before two
    /// rows are held.
    pub(crate) fn tick_local_delta(&self) -> Option<i64> {
        let (p, l) = (self.previous()?, self.latest()?);
        Some(l.packets_local as i64 - p.packets_local as i64)
    }

    /// Latest reported round trip time, seconds.
    pub(crate) fn latest_rtt(&self) -> Option<f64> {
        self.latest().and_then(|s| s.rtt_seconds)
    }
}
