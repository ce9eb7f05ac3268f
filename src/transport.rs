//! Contracts of the observed transport: its connection phase and the lazy
//! asynchronous stats read.

use crate::error::Result;
use crate::stats::StatsSnapshot;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Connection phase of the media transport under observation.
///
/// The analyzer samples stats only while the transport is in
/// [`TransportState::Connected`] or [`TransportState::Completed`]; every
/// transition out of that set invalidates in-flight stats reads and resets
/// the per-channel analysis state.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportState {
    /// Transport created, no connectivity checks yet.
    #[default]
    New,
    /// Candidate pairs are being checked.
    Checking,
    /// A working path exists; media can flow.
    Connected,
    /// All checks finished with a working path.
    Completed,
    /// Connectivity lost, recovery still possible.
    Disconnected,
    /// Connectivity lost for good.
    Failed,
    /// Transport shut down.
    Closed,
}

impl TransportState {
    /// Returns true while media can flow and analysis may run.
    pub fn is_connected(&self) -> bool {
        matches!(self, TransportState::Connected | TransportState::Completed)
    }
}

const TRANSPORT_STATE_NEW_STR: &str = "new";
const TRANSPORT_STATE_CHECKING_STR: &str = "checking";
const TRANSPORT_STATE_CONNECTED_STR: &str = "connected";
const TRANSPORT_STATE_COMPLETED_STR: &str = "completed";
const TRANSPORT_STATE_DISCONNECTED_STR: &str = "disconnected";
const TRANSPORT_STATE_FAILED_STR: &str = "failed";
const TRANSPORT_STATE_CLOSED_STR: &str = "closed";

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            TransportState::New => TRANSPORT_STATE_NEW_STR,
            TransportState::Checking => TRANSPORT_STATE_CHECKING_STR,
            TransportState::Connected => TRANSPORT_STATE_CONNECTED_STR,
            TransportState::Completed => TRANSPORT_STATE_COMPLETED_STR,
            TransportState::Disconnected => TRANSPORT_STATE_DISCONNECTED_STR,
            TransportState::Failed => TRANSPORT_STATE_FAILED_STR,
            TransportState::Closed => TRANSPORT_STATE_CLOSED_STR,
        };
        write!(f, "{s}")
    }
}

/// Future returned by [`StatsSource::read_stats`].
pub type StatsReadFuture = Pin<Box<dyn Future<Output = Result<StatsSnapshot>> + Send>>;

/// Read-only view of a live transport consumed by the analyzer.
///
/// Implementations wrap whatever handle the application holds on the real
/// peer connection. The analyzer never mutates the transport through this
/// trait; `read_stats` is lazy and does no work until the returned future
/// is awaited.
///
/// Transport state change notifications are delivered out of band, as a
/// `tokio::sync::broadcast` channel consumed by the driver loop.
pub trait StatsSource {
    /// Current connection phase.
    fn transport_state(&self) -> TransportState;

    /// Begins an asynchronous read of the stats snapshot for the current
    /// instant. The snapshot may legitimately omit counters the transport
    /// has not populated yet.
    fn read_stats(&mut self) -> StatsReadFuture;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_set() {
        assert!(TransportState::Connected.is_connected());
        assert!(TransportState::Completed.is_connected());
        assert!(!TransportState::New.is_connected());
        assert!(!TransportState::Checking.is_connected());
        assert!(!TransportState::Disconnected.is_connected());
        assert!(!TransportState::Failed.is_connected());
        assert!(!TransportState::Closed.is_connected());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransportState::Connected.to_string(), "connected");
        assert_eq!(TransportState::Disconnected.to_string(), "disconnected");
    }
}
