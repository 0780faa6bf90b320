//! Output sink abstraction over the underlying transport.

use std::fmt::Display;

use async_trait::async_trait;
use futures::{Sink, SinkExt};
use mux_core::TransportError;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Byte sink the merge loop writes frames into.
///
/// Both operations may block and may fail. A failure is fatal to the
/// session; no retry is attempted at this layer. Only the merge-loop
/// task ever calls these methods, which is what keeps frames from
/// interleaving without a lock.
#[async_trait]
pub trait OutputSink: Send {
    /// Append bytes to the transport.
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Push any transport buffering out to the reader.
    async fn flush(&mut self) -> Result<(), TransportError>;
}

/// Adapter for any `futures::Sink<Vec<u8>>` transport.
pub struct SinkAdapter<S> {
    inner: S,
}

impl<S> SinkAdapter<S>
where
    S: Sink<Vec<u8>> + Unpin + Send,
    S::Error: Display,
{
    /// Wrap a sink.
    pub fn new(sink: S) -> Self {
        Self { inner: sink }
    }

    /// Get mutable access to the underlying sink.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the adapter and return the inner sink.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S> OutputSink for SinkAdapter<S>
where
    S: Sink<Vec<u8>> + Unpin + Send,
    S::Error: Display,
{
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.inner
            .send(bytes.to_vec())
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        SinkExt::flush(&mut self.inner)
            .await
            .map_err(|e| TransportError::Flush(e.to_string()))
    }
}

/// Adapter for `tokio::io::AsyncWrite` transports (sockets, files).
pub struct WriterSink<W> {
    inner: W,
}

impl<W> WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { inner: writer }
    }

    /// Consume the adapter and return the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[async_trait]
impl<W> OutputSink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.inner
            .write_all(bytes)
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        self.inner
            .flush()
            .await
            .map_err(|e| TransportError::Flush(e.to_string()))
    }
}

/// Sink that forwards each write as one chunk on an `mpsc` channel.
///
/// Bridges a session to a chunked HTTP response body: the receiver side
/// becomes the body stream, and a dropped receiver (client disconnect)
/// surfaces as a transport error on the next write. Delivery is the
/// flush, so `flush` is a no-op.
pub struct ChannelSink {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelSink {
    /// Create a sink and the receiver for its chunks.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl OutputSink for ChannelSink {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.tx
            .send(bytes.to_vec())
            .await
            .map_err(|_| TransportError::Closed)
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// In-memory sink for tests and capture.
#[derive(Debug, Default)]
pub struct BufferSink {
    buf: Vec<u8>,
    flushes: usize,
}

impl BufferSink {
    /// Create an empty buffer sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of flushes requested.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Consume the sink and return the captured bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[async_trait]
impl OutputSink for BufferSink {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_buffer_sink_captures_writes_and_flushes() {
        let mut sink = BufferSink::new();
        sink.write(b"one").await.unwrap();
        sink.write(b"two").await.unwrap();
        sink.flush().await.unwrap();
        assert_eq!(sink.as_bytes(), b"onetwo");
        assert_eq!(sink.flush_count(), 1);
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_chunks_in_order() {
        let (mut sink, mut rx) = ChannelSink::new(4);
        sink.write(b"a").await.unwrap();
        sink.write(b"b").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), b"a");
        assert_eq!(rx.recv().await.unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_channel_sink_reports_disconnect() {
        let (mut sink, rx) = ChannelSink::new(4);
        drop(rx);
        let err = sink.write(b"late").await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[tokio::test]
    async fn test_writer_sink_over_vec() {
        let mut sink = WriterSink::new(Vec::new());
        sink.write(b"bytes").await.unwrap();
        sink.flush().await.unwrap();
        assert_eq!(sink.into_inner(), b"bytes");
    }

    #[tokio::test]
    async fn test_sink_adapter_over_futures_channel() {
        let (tx, mut rx) = futures::channel::mpsc::channel::<Vec<u8>>(4);
        let mut sink = SinkAdapter::new(tx);
        sink.write(b"chunk").await.unwrap();
        sink.flush().await.unwrap();
        drop(sink);
        assert_eq!(futures::StreamExt::next(&mut rx).await.unwrap(), b"chunk");
    }
}
