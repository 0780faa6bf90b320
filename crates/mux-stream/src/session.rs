//! The merge loop.

use std::future::Future;

use futures::FutureExt;
use mux_core::{
    Boundary, EncodeError, EncodePolicy, ErrorPolicy, FlushPolicy, Payload, ProducerError,
    SessionConfig, SessionError, SessionId, TimingContext, TransportError,
};
use mux_framing::{body_contains_boundary, encode_frame, terminal_marker};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::producer::{ProducerEvent, ProducerFn, ProducerScope, ProducerStatus, Registered};
use crate::report::{ProducerOutcome, SessionReport};
use crate::sink::OutputSink;

/// One streaming session: a set of producers, a sink, and the merge
/// loop that drains the former into the latter.
///
/// Producers run as independent tasks and push into one shared bounded
/// queue; the merge loop is the only task that ever touches the sink, so
/// frames cannot interleave. Arrival order at the queue is write order.
///
/// A session is created per request and lives exactly as long as
/// [`run`](Self::run).
pub struct StreamSession<S> {
    id: SessionId,
    boundary: Boundary,
    config: SessionConfig,
    sink: S,
    producers: Vec<Registered>,
    cancel: CancellationToken,
}

impl<S: OutputSink> StreamSession<S> {
    /// Create a session writing frames delimited by `boundary` into `sink`.
    pub fn new(boundary: Boundary, sink: S) -> Self {
        Self {
            id: SessionId::generate(),
            boundary,
            config: SessionConfig::default(),
            sink,
            producers: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Override the default policies.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an externally-supplied correlation ID.
    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    /// The session's correlation ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// A token that observes (and can trigger) session cancellation.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Register a producer. `f` runs as its own task once the session
    /// starts and signals closure by returning.
    pub fn producer<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ProducerScope) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ProducerError>> + Send + 'static,
    {
        let run: ProducerFn = Box::new(move |scope| f(scope).boxed());
        self.producers.push(Registered {
            name: name.into(),
            run: Some(run),
            status: ProducerStatus::Pending,
            frames: 0,
        });
        self
    }

    /// Run the merge loop to completion.
    ///
    /// Terminates when every producer has signaled closure, then writes
    /// the terminal marker, flushes, and reports. A transport failure is
    /// fatal: remaining producers are cancelled and the error propagates.
    /// With zero registered producers only the terminal marker is written.
    pub async fn run(mut self) -> Result<SessionReport, SessionError> {
        let mut timing = TimingContext::new();
        let producer_count = self.producers.len();
        let capacity = self
            .config
            .queue_capacity
            .unwrap_or_else(|| producer_count.max(1));
        let (tx, mut rx) = mpsc::channel(capacity);

        for (index, reg) in self.producers.iter_mut().enumerate() {
            let Some(run) = reg.run.take() else { continue };
            reg.status = ProducerStatus::Streaming;
            let scope =
                ProducerScope::new(reg.name.clone(), index, tx.clone(), self.cancel.clone());
            let event_tx = tx.clone();
            tokio::spawn(async move {
                let event = match run(scope).await {
                    Ok(()) => ProducerEvent::Closed { producer: index },
                    Err(error) => ProducerEvent::Failed {
                        producer: index,
                        error,
                    },
                };
                let _ = event_tx.send(event).await;
            });
        }
        // The loop's queue handle must go away so `recv` can observe all
        // producer tasks being gone.
        drop(tx);

        debug!(session = %self.id, producers = producer_count, "merge loop started");

        let mut open = producer_count;
        let mut frames_written = 0usize;
        let mut bytes_written = 0u64;
        let mut payloads_skipped = 0usize;

        while open > 0 {
            let Some(event) = rx.recv().await else {
                break;
            };
            match event {
                ProducerEvent::Item { producer, payload } => {
                    let name = self.producers[producer].name.clone();
                    let frame = if body_contains_boundary(&self.boundary, &payload) {
                        match self.config.on_encode_error {
                            EncodePolicy::Skip => {
                                payloads_skipped += 1;
                                warn!(
                                    session = %self.id,
                                    producer = %name,
                                    "payload contains boundary token; skipped"
                                );
                                continue;
                            }
                            EncodePolicy::ErrorFrame => {
                                warn!(
                                    session = %self.id,
                                    producer = %name,
                                    "payload contains boundary token; replaced with error frame"
                                );
                                let note = Payload::text(format!(
                                    "payload from producer '{name}' could not be framed"
                                ));
                                encode_frame(&self.boundary, &note)
                            }
                            EncodePolicy::Abort => {
                                self.cancel.cancel();
                                return Err(SessionError::Encode {
                                    name,
                                    source: EncodeError::BoundaryCollision,
                                });
                            }
                        }
                    } else {
                        encode_frame(&self.boundary, &payload)
                    };

                    if let Err(err) = self.write_frame(&frame).await {
                        warn!(
                            session = %self.id,
                            error = %err,
                            "transport failed; cancelling producers"
                        );
                        self.cancel.cancel();
                        return Err(SessionError::Transport(err));
                    }
                    self.producers[producer].frames += 1;
                    timing.mark_frame(&name);
                    frames_written += 1;
                    bytes_written += frame.len() as u64;
                    debug!(
                        session = %self.id,
                        producer = %name,
                        bytes = frame.len(),
                        "frame written"
                    );
                }
                ProducerEvent::Closed { producer } => {
                    open -= 1;
                    self.producers[producer].status = ProducerStatus::Completed;
                    debug!(
                        session = %self.id,
                        producer = %self.producers[producer].name,
                        "producer closed"
                    );
                }
                ProducerEvent::Failed { producer, error } => {
                    open -= 1;
                    let name = self.producers[producer].name.clone();
                    self.producers[producer].status = ProducerStatus::Failed(error.to_string());
                    warn!(session = %self.id, producer = %name, error = %error, "producer failed");
                    if self.config.on_producer_error == ErrorPolicy::Abort {
                        self.cancel.cancel();
                        return Err(SessionError::Producer {
                            name,
                            source: error,
                        });
                    }
                }
            }
        }

        // The queue closing while producers are still marked open means a
        // task ended without its terminal event, i.e. it panicked.
        let mut aborted = None;
        for reg in &mut self.producers {
            if reg.status == ProducerStatus::Streaming {
                reg.status = ProducerStatus::Failed(ProducerError::Aborted.to_string());
                aborted.get_or_insert_with(|| reg.name.clone());
            }
        }
        if let Some(name) = aborted {
            warn!(session = %self.id, producer = %name, "producer task vanished mid-stream");
            if self.config.on_producer_error == ErrorPolicy::Abort {
                self.cancel.cancel();
                return Err(SessionError::Producer {
                    name,
                    source: ProducerError::Aborted,
                });
            }
        }

        let marker = terminal_marker(&self.boundary);
        if let Err(err) = self.sink.write(&marker).await {
            self.cancel.cancel();
            return Err(SessionError::Transport(err));
        }
        if let Err(err) = self.sink.flush().await {
            self.cancel.cancel();
            return Err(SessionError::Transport(err));
        }
        bytes_written += marker.len() as u64;
        timing.mark("complete");
        debug!(session = %self.id, frames = frames_written, "session complete");

        Ok(SessionReport {
            id: self.id.clone(),
            frames_written,
            bytes_written,
            payloads_skipped,
            producers: self
                .producers
                .iter()
                .map(|reg| ProducerOutcome {
                    name: reg.name.clone(),
                    status: reg.status.clone(),
                    frames: reg.frames,
                })
                .collect(),
            elapsed: timing.elapsed(),
            time_to_first_frame: timing.time_to_first_frame(),
        })
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.sink.write(frame).await?;
        if self.config.flush == FlushPolicy::EveryFrame {
            self.sink.flush().await?;
        }
        Ok(())
    }
}
