//! Session policy configuration.

/// What to do when a producer signals an error instead of closing cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Treat the failed producer as closed and keep streaming the others.
    /// Partial failure does not block successful data.
    #[default]
    Isolate,
    /// Abort the whole session on the first producer failure.
    Abort,
}

/// What to do when a payload cannot be framed (boundary collision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodePolicy {
    /// Drop the offending payload and keep going.
    #[default]
    Skip,
    /// Emit a synthetic `text/plain` error frame in its place.
    ErrorFrame,
    /// Abort the whole session.
    Abort,
}

/// When the session flushes the output sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Flush after every frame, so the reader sees each frame as soon as
    /// it is written. The terminal marker is always flushed.
    #[default]
    EveryFrame,
    /// No explicit flushes between frames; the transport adapter is
    /// responsible for its own delivery (e.g. a channel-backed sink).
    Manual,
}

/// Per-session policy knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Producer failure handling.
    pub on_producer_error: ErrorPolicy,
    /// Framing failure handling.
    pub on_encode_error: EncodePolicy,
    /// Flush behavior between frames.
    pub flush: FlushPolicy,
    /// Capacity of the shared producer queue. Defaults to the number of
    /// registered producers, so each producer can have at most one
    /// payload in flight ahead of the sink.
    pub queue_capacity: Option<usize>,
}

impl SessionConfig {
    /// Create a config with default policies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the producer failure policy.
    pub fn with_producer_error(mut self, policy: ErrorPolicy) -> Self {
        self.on_producer_error = policy;
        self
    }

    /// Set the framing failure policy.
    pub fn with_encode_error(mut self, policy: EncodePolicy) -> Self {
        self.on_encode_error = policy;
        self
    }

    /// Set the flush policy.
    pub fn with_flush(mut self, policy: FlushPolicy) -> Self {
        self.flush = policy;
        self
    }

    /// Override the shared queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity.max(1));
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            on_producer_error: ErrorPolicy::default(),
            on_encode_error: EncodePolicy::default(),
            flush: FlushPolicy::default(),
            queue_capacity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_isolate_and_skip() {
        let config = SessionConfig::new();
        assert_eq!(config.on_producer_error, ErrorPolicy::Isolate);
        assert_eq!(config.on_encode_error, EncodePolicy::Skip);
        assert_eq!(config.flush, FlushPolicy::EveryFrame);
        assert!(config.queue_capacity.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = SessionConfig::new()
            .with_producer_error(ErrorPolicy::Abort)
            .with_encode_error(EncodePolicy::ErrorFrame)
            .with_flush(FlushPolicy::Manual)
            .with_queue_capacity(0);
        assert_eq!(config.on_producer_error, ErrorPolicy::Abort);
        assert_eq!(config.on_encode_error, EncodePolicy::ErrorFrame);
        assert_eq!(config.flush, FlushPolicy::Manual);
        // Capacity is clamped to at least one slot.
        assert_eq!(config.queue_capacity, Some(1));
    }
}
