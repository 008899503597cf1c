//! Least-recently-used replacement policy, kept as an alternate strategy to
//! the default `ClockReplacer`. Selectable by passing
//! `Box::new(LruReplacer::new(pool_size))` to `BufferPoolManager::new`.

use super::Replacer;
use crate::typedef::FrameId;
use rustdb_error::{Error, Result};
use std::collections::HashMap;

struct LruNode {
    is_evictable: bool,
    last_accessed_timestamp: u64,
}

pub(crate) struct LruReplacer {
    node_store: HashMap<FrameId, LruNode>,
    evictable_count: usize,
    current_timestamp: u64,
    num_frames: usize,
}

impl LruReplacer {
    pub(crate) fn new(num_frames: usize) -> Self {
        LruReplacer {
            node_store: HashMap::new(),
            evictable_count: 0,
            current_timestamp: 0,
            num_frames,
        }
    }

    fn next_timestamp(&mut self) -> u64 {
        let ts = self.current_timestamp;
        self.current_timestamp += 1;
        ts
    }

    fn touch(&mut self, frame_id: FrameId, evictable: bool) {
        let ts = self.next_timestamp();
        match self.node_store.get_mut(&frame_id) {
            Some(node) => {
                node.last_accessed_timestamp = ts;
            }
            None => {
                self.node_store.insert(
                    frame_id,
                    LruNode {
                        is_evictable: evictable,
                        last_accessed_timestamp: ts,
                    },
                );
                if evictable {
                    self.evictable_count += 1;
                }
            }
        }
    }
}

impl Replacer for LruReplacer {
    fn pin(&mut self, frame_id: FrameId) -> Result<()> {
        if frame_id >= self.num_frames {
            return Err(Error::BadBufFrameNo(frame_id as i64));
        }
        self.touch(frame_id, false);
        if let Some(node) = self.node_store.get_mut(&frame_id) {
            if node.is_evictable {
                node.is_evictable = false;
                self.evictable_count -= 1;
            }
        }
        Ok(())
    }

    fn unpin(&mut self, frame_id: FrameId) -> Result<()> {
        if frame_id >= self.num_frames {
            return Err(Error::BadBufFrameNo(frame_id as i64));
        }
        self.touch(frame_id, true);
        if let Some(node) = self.node_store.get_mut(&frame_id) {
            if !node.is_evictable {
                node.is_evictable = true;
                self.evictable_count += 1;
            }
        }
        Ok(())
    }

    fn free(&mut self, frame_id: FrameId) {
        if let Some(node) = self.node_store.remove(&frame_id) {
            if node.is_evictable {
                self.evictable_count -= 1;
            }
        }
    }

    fn pick_victim(&mut self) -> Result<FrameId> {
        let victim = self
            .node_store
            .iter()
            .filter(|(_, node)| node.is_evictable)
            .min_by_key(|(_, node)| node.last_accessed_timestamp)
            .map(|(frame_id, _)| *frame_id);

        match victim {
            Some(frame_id) => {
                self.node_store.remove(&frame_id);
                self.evictable_count -= 1;
                self.touch(frame_id, false);
                Ok(frame_id)
            }
            None => Err(Error::BufferExceeded),
        }
    }

    fn num_unpinned(&self) -> usize {
        self.evictable_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_unpinned_first() {
        let mut lru = LruReplacer::new(4);
        lru.unpin(1).unwrap();
        lru.unpin(2).unwrap();
        lru.unpin(3).unwrap();
        assert_eq!(lru.num_unpinned(), 3);

        assert_eq!(lru.pick_victim().unwrap(), 1);
        assert_eq!(lru.pick_victim().unwrap(), 2);
        assert_eq!(lru.pick_victim().unwrap(), 3);
        assert!(matches!(lru.pick_victim(), Err(Error::BufferExceeded)));
    }

    #[test]
    fn pin_removes_eligibility() {
        let mut lru = LruReplacer::new(4);
        lru.unpin(1).unwrap();
        lru.unpin(2).unwrap();
        lru.unpin(3).unwrap();
        lru.pin(2).unwrap();

        assert_eq!(lru.num_unpinned(), 2);
        assert_eq!(lru.pick_victim().unwrap(), 1);
        assert_eq!(lru.pick_victim().unwrap(), 3);
        assert!(matches!(lru.pick_victim(), Err(Error::BufferExceeded)));
    }

    #[test]
    fn unpin_after_pin_restores_eligibility() {
        let mut lru = LruReplacer::new(4);
        lru.unpin(1).unwrap();
        lru.unpin(2).unwrap();
        lru.pin(2).unwrap();
        assert_eq!(lru.num_unpinned(), 1);
        lru.unpin(2).unwrap();
        assert_eq!(lru.num_unpinned(), 2);
    }

    #[test]
    fn free_drops_tracking_entirely() {
        let mut lru = LruReplacer::new(4);
        lru.unpin(1).unwrap();
        lru.unpin(2).unwrap();
        lru.free(1);
        assert_eq!(lru.num_unpinned(), 1);
        assert_eq!(lru.pick_victim().unwrap(), 2);
    }

    #[test]
    fn repeated_unpin_refreshes_recency() {
        let mut lru = LruReplacer::new(4);
        lru.unpin(1).unwrap();
        lru.unpin(2).unwrap();
        lru.unpin(3).unwrap();
        lru.unpin(1).unwrap();
        assert_eq!(lru.pick_victim().unwrap(), 2);
        assert_eq!(lru.pick_victim().unwrap(), 3);
        assert_eq!(lru.pick_victim().unwrap(), 1);
    }

    #[test]
    fn pin_rejects_out_of_range_frame() {
        let mut lru = LruReplacer::new(2);
        assert!(matches!(lru.pin(9), Err(Error::BadBufFrameNo(9))));
        assert!(matches!(lru.unpin(9), Err(Error::BadBufFrameNo(9))));
    }
}
