// SPDX-License-Identifier: GPL-3.0-only

//! Bounded frame hand-off between the capture thread and the draw context
//!
//! Single producer, single consumer. Backpressure is drop-oldest: the
//! capture thread never blocks waiting for the renderer, and the retained
//! frames stay closest to real time.

use super::types::PipelineFrame;
use crate::constants::FRAME_QUEUE_CAPACITY;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Bounded FIFO of converted frames with drop-oldest eviction
#[derive(Debug)]
pub struct FrameQueue {
    inner: Mutex<VecDeque<PipelineFrame>>,
    capacity: usize,
}

impl FrameQueue {
    /// Create a queue with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(FRAME_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Insert a frame, evicting the oldest entries first if full.
    ///
    /// Called only from the producer (capture) side; never blocks beyond
    /// the short internal lock.
    pub fn offer(&self, frame: PipelineFrame) {
        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        while queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(frame);
    }

    /// Remove and return the oldest remaining frame, if any.
    ///
    /// Since `offer` already evicted stale entries, what remains is
    /// near-newest. Called only from the consumer (render) side.
    pub fn poll_latest(&self) -> Option<PipelineFrame> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    /// Number of frames currently pending
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8) -> PipelineFrame {
        PipelineFrame::nv21(vec![tag; 12], 4, 2, 0).unwrap()
    }

    #[test]
    fn test_drop_oldest_keeps_newest_two() {
        let queue = FrameQueue::new();
        queue.offer(frame(1));
        queue.offer(frame(2));
        queue.offer(frame(3));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.poll_latest().unwrap().data[0], 2);
        assert_eq!(queue.poll_latest().unwrap().data[0], 3);
        assert!(queue.poll_latest().is_none());
    }

    #[test]
    fn test_empty_queue_polls_none() {
        let queue = FrameQueue::new();
        assert!(queue.is_empty());
        assert!(queue.poll_latest().is_none());
    }

    #[test]
    fn test_offer_never_exceeds_capacity() {
        let queue = FrameQueue::with_capacity(2);
        for tag in 0..10 {
            queue.offer(frame(tag));
            assert!(queue.len() <= 2);
        }
    }
}
