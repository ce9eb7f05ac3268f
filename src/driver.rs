//! Production pump for the analyzer.
//!
//! The analyzer itself is sans-io; this module drives it against real time
//! and a live transport with a tokio event loop: due ticks issue stats
//! reads, at most one read is awaited at a time, and transport state
//! notifications are forwarded as they arrive.

use crate::analyzer::ConnectionQualityAnalyzer;
use crate::error::{Error, Result};
use crate::transport::TransportState;
use log::trace;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

const DEFAULT_TIMEOUT_DURATION: Duration = Duration::from_secs(86400);

fn forward_state(
    analyzer: &mut ConnectionQualityAnalyzer,
    state: std::result::Result<TransportState, broadcast::error::RecvError>,
) -> Result<()> {
    match state {
        Ok(state) => analyzer.handle_transport_state_change(state),
        Err(broadcast::error::RecvError::Lagged(n)) => {
            // The analyzer re-reads the transport state on the next tick.
            trace!("skipped {n} transport state notifications");
        }
        Err(broadcast::error::RecvError::Closed) => return Err(Error::ErrDriverStopped),
    }
    Ok(())
}

/// Drives `analyzer` until `stop_rx` fires.
///
/// `state_rx` delivers the transport's state change notifications; a
/// closed channel ends the loop with [`Error::ErrDriverStopped`]. Ticks
/// are strictly serial: a due tick issues one stats read and the loop
/// awaits it, still responsive to notifications, before the next tick can
/// begin. A read whose epoch went stale is abandoned instead of awaited.
pub async fn run(
    analyzer: &mut ConnectionQualityAnalyzer,
    mut state_rx: broadcast::Receiver<TransportState>,
    mut stop_rx: broadcast::Receiver<()>,
) -> Result<()> {
    loop {
        let deadline = analyzer
            .poll_timeout()
            .unwrap_or_else(|| Instant::now() + DEFAULT_TIMEOUT_DURATION);
        let delay = deadline
            .checked_duration_since(Instant::now())
            .unwrap_or(Duration::ZERO);

        let timer = tokio::time::sleep(delay);
        tokio::pin!(timer);

        tokio::select! {
            biased;

            _ = stop_rx.recv() => {
                trace!("driver stop requested");
                return Ok(());
            }
            state = state_rx.recv() => {
                forward_state(analyzer, state)?;
                continue;
            }
            _ = &mut timer => {}
        }

        let Some(mut read) = analyzer.handle_timeout(Instant::now()) else {
            continue;
        };

        loop {
            tokio::select! {
                biased;

                _ = stop_rx.recv() => {
                    trace!("driver stop requested");
                    return Ok(());
                }
                state = state_rx.recv() => {
                    forward_state(analyzer, state)?;
                    if !analyzer.read_is_current(&read.request) {
                        // The epoch moved on; the result would be dropped
                        // anyway, so stop awaiting a possibly hung read.
                        break;
                    }
                }
                result = read.future.as_mut() => {
                    analyzer.handle_stats_read(read.request, result);
                    break;
                }
            }
        }
    }
}
