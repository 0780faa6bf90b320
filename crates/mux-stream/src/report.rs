//! Session outcome reporting.

use std::time::Duration;

use mux_core::SessionId;

use crate::producer::ProducerStatus;

/// Final outcome of one producer.
#[derive(Debug, Clone)]
pub struct ProducerOutcome {
    /// Registered name.
    pub name: String,
    /// Terminal status.
    pub status: ProducerStatus,
    /// Frames from this producer that reached the sink.
    pub frames: usize,
}

/// What a completed session did.
///
/// Producer failures that were isolated by policy do not fail the
/// session; they show up here instead.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Session correlation ID.
    pub id: SessionId,
    /// Frames written, excluding the terminal marker.
    pub frames_written: usize,
    /// Total bytes written, including the terminal marker.
    pub bytes_written: u64,
    /// Payloads dropped by the encode policy.
    pub payloads_skipped: usize,
    /// Per-producer outcomes, in registration order.
    pub producers: Vec<ProducerOutcome>,
    /// Wall-clock session duration.
    pub elapsed: Duration,
    /// Time from session start to the first frame reaching the sink.
    pub time_to_first_frame: Option<Duration>,
}

impl SessionReport {
    /// Whether every producer closed cleanly.
    pub fn all_completed(&self) -> bool {
        self.producers
            .iter()
            .all(|p| p.status == ProducerStatus::Completed)
    }

    /// Producers that failed, with their recorded errors.
    pub fn failed_producers(&self) -> impl Iterator<Item = &ProducerOutcome> {
        self.producers
            .iter()
            .filter(|p| matches!(p.status, ProducerStatus::Failed(_)))
    }
}
