//! Producer registration and the handoff seam.

use futures::future::BoxFuture;
use mux_core::{Payload, ProducerError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Event pushed from a producer task into the merge loop's shared queue.
///
/// Closure is an explicit event, never a sentinel payload, so an empty
/// body stays a legal payload.
#[derive(Debug)]
pub(crate) enum ProducerEvent {
    Item { producer: usize, payload: Payload },
    Closed { producer: usize },
    Failed { producer: usize, error: ProducerError },
}

/// Status of one producer as seen by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerStatus {
    /// Registered, session not yet running.
    Pending,
    /// Task spawned, not yet closed.
    Streaming,
    /// Closed cleanly.
    Completed,
    /// Signaled an error, or its task ended without signaling closure.
    Failed(String),
}

/// One registered producer and its bookkeeping.
pub(crate) struct Registered {
    pub name: String,
    pub run: Option<ProducerFn>,
    pub status: ProducerStatus,
    pub frames: usize,
}

pub(crate) type ProducerFn =
    Box<dyn FnOnce(ProducerScope) -> BoxFuture<'static, Result<(), ProducerError>> + Send>;

/// The handle a producer task writes through.
///
/// Exactly one scope exists per producer. Sending a payload transfers its
/// ownership to the session; the call completes once the merge loop has
/// queue capacity, which is what bounds how far producers can run ahead
/// of the sink.
#[derive(Debug, Clone)]
pub struct ProducerScope {
    name: String,
    index: usize,
    tx: mpsc::Sender<ProducerEvent>,
    cancel: CancellationToken,
}

impl ProducerScope {
    pub(crate) fn new(
        name: String,
        index: usize,
        tx: mpsc::Sender<ProducerEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            name,
            index,
            tx,
            cancel,
        }
    }

    /// This producer's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hand one payload to the session.
    ///
    /// Fails fast with `ProducerError::Cancelled` once the session has
    /// been cancelled or torn down; producers should stop work when that
    /// happens rather than keep computing output nobody will read.
    pub async fn send(&self, payload: Payload) -> Result<(), ProducerError> {
        let event = ProducerEvent::Item {
            producer: self.index,
            payload,
        };
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ProducerError::Cancelled),
            sent = self.tx.send(event) => sent.map_err(|_| ProducerError::Cancelled),
        }
    }

    /// Whether the session has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for cancellation. Long-running producers can select on this
    /// between units of work to observe cancellation promptly.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}
