use std::num::NonZeroUsize;

/// 连续合格帧跟踪器：只追加、整体清空，不做部分淘汰
#[derive(Debug, Clone)]
pub struct RunTracker {
    frames: Vec<u64>,
    capacity: usize,
}

impl RunTracker {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity.get()),
            capacity: capacity.get(),
        }
    }

    /// Append an accepted frame. Returns true once the run reaches capacity.
    pub fn push(&mut self, frame_number: u64) -> bool {
        debug_assert!(
            self.frames.last().map_or(true, |&last| last + 1 == frame_number),
            "run must stay consecutive"
        );
        if !self.is_complete() {
            self.frames.push(frame_number);
        }
        self.is_complete()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_complete(&self) -> bool {
        self.frames.len() >= self.capacity
    }

    pub fn frames(&self) -> &[u64] {
        &self.frames
    }

    pub fn take(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_of(capacity: usize) -> RunTracker {
        RunTracker::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_completes_at_capacity() {
        let mut tracker = tracker_of(3);
        assert!(!tracker.push(4));
        assert!(!tracker.push(5));
        assert!(tracker.push(6));
        assert_eq!(tracker.frames(), &[4, 5, 6]);
    }

    #[test]
    fn test_clear_discards_partial_run() {
        let mut tracker = tracker_of(3);
        tracker.push(1);
        tracker.push(2);
        tracker.clear();
        assert!(tracker.is_empty());
        tracker.push(4);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_take_empties_tracker() {
        let mut tracker = tracker_of(1);
        assert!(tracker.push(9));
        assert_eq!(tracker.take(), vec![9]);
        assert!(tracker.is_empty());
    }
}
