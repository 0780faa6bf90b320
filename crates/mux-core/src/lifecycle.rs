//! Session timing instrumentation.

use std::time::{Duration, Instant};

/// Timing context for observability.
///
/// Records when each frame left the session, keyed by producer name, plus
/// arbitrary named marks for session-level events.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    frames: Vec<(String, Instant)>,
    marks: Vec<(String, Instant)>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frames: Vec::new(),
            marks: Vec::new(),
        }
    }

    /// Record a named session-level mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.push((name.to_string(), Instant::now()));
    }

    /// Record that a frame from the given producer was written.
    pub fn mark_frame(&mut self, producer: &str) {
        self.frames.push((producer.to_string(), Instant::now()));
    }

    /// Elapsed time since session start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time from session start to the first frame hitting the sink.
    pub fn time_to_first_frame(&self) -> Option<Duration> {
        self.frames
            .first()
            .map(|(_, at)| at.duration_since(self.start))
    }

    /// Number of frames recorded.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frame timings relative to session start, in write order.
    pub fn frame_timings(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.frames
            .iter()
            .map(|(name, at)| (name.as_str(), at.duration_since(self.start)))
    }

    /// Look up a session-level mark.
    pub fn mark_at(&self, name: &str) -> Option<Duration> {
        self.marks
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, at)| at.duration_since(self.start))
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_frames_no_first_frame_time() {
        let timing = TimingContext::new();
        assert!(timing.time_to_first_frame().is_none());
        assert_eq!(timing.frame_count(), 0);
    }

    #[test]
    fn test_frame_order_preserved() {
        let mut timing = TimingContext::new();
        timing.mark_frame("posts");
        timing.mark_frame("comments");
        timing.mark_frame("posts");
        let order: Vec<&str> = timing.frame_timings().map(|(name, _)| name).collect();
        assert_eq!(order, ["posts", "comments", "posts"]);
        assert!(timing.time_to_first_frame().is_some());
    }

    #[test]
    fn test_marks() {
        let mut timing = TimingContext::new();
        timing.mark("complete");
        assert!(timing.mark_at("complete").is_some());
        assert!(timing.mark_at("missing").is_none());
    }
}
