#![warn(rust_2018_idioms)]

//! Connection quality analysis for RTC media transports.
//!
//! The crate observes a live peer connection through its periodic stats
//! snapshots and classifies the perceived quality of each (direction,
//! media kind) channel into a small ordered set of levels, for UI
//! indicators, adaptive bitrate logic and degradation warnings to consume.
//! It measures nothing absolute and diagnoses no causes; the output is a
//! stable, hysteresis-friendly severity per channel.
//!
//! The engine is a sans-io state machine driven tick by tick; the
//! [`driver`] module pumps it with tokio in production:
//!
//! ```ignore
//! use rtc_quality::analyzer::{AnalyzerEventKind, ConnectionQualityAnalyzer, PeerDirection};
//! use std::time::Instant;
//!
//! let mut analyzer = ConnectionQualityAnalyzer::new();
//! analyzer.on(AnalyzerEventKind::ConnectionQualityAudio, |event| {
//!     println!("audio quality changed: {event:?}");
//! });
//! analyzer.set_peer_connection(Some(source), PeerDirection::Sender, Instant::now());
//!
//! driver::run(&mut analyzer, state_rx, stop_rx).await?;
//! ```

pub mod analyzer;
pub mod driver;
pub mod error;
pub mod stats;
pub mod transport;

pub use analyzer::{
    AnalyzerEvent, AnalyzerEventKind, ConnectionQualityAnalyzer, HandlerId, PeerDirection,
    QualityLevel, StatsUpdate,
};
