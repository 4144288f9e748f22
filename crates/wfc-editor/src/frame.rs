//! Per-frame coalescing of pointer moves.
//!
//! Between two animation frames only the latest move matters: positions
//! are always derived from the gesture origin, so dropping intermediate
//! moves never changes where a node ends up.

/// Holds at most one pending value until the next frame.
#[derive(Debug, Clone)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
    dropped: u64,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self {
            pending: None,
            dropped: 0,
        }
    }
}

impl<T> FrameCoalescer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `value`, replacing anything not yet processed.
    pub fn push(&mut self, value: T) {
        if self.pending.replace(value).is_some() {
            self.dropped += 1;
        }
    }

    /// Take the pending value, if any.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of values superseded before they were processed.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}
