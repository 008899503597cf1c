//! Second-chance (Clock) replacement policy, ported from MiniBase's
//! `Clock` replacer: a rotating hand sweeps frame state `{Available,
//! Referenced, Pinned}`, demoting `Referenced` to `Available` on its way
//! past rather than evicting it immediately, so every frame gets one more
//! chance before it is taken.

use super::Replacer;
use crate::typedef::FrameId;
use rustdb_error::{Error, Result};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum FrameState {
    Available,
    Referenced,
    Pinned,
}

pub(crate) struct ClockReplacer {
    state: Vec<FrameState>,
    pin_count: Vec<u32>,
    head: usize,
}

impl ClockReplacer {
    pub(crate) fn new(num_frames: usize) -> Self {
        ClockReplacer {
            state: vec![FrameState::Available; num_frames],
            pin_count: vec![0; num_frames],
            // Advancing wraps to 0 on the first `pick_victim` call, mirroring
            // the original's hand initialized to -1.
            head: num_frames.saturating_sub(1),
        }
    }
}

impl Replacer for ClockReplacer {
    fn pin(&mut self, frame_id: FrameId) -> Result<()> {
        if frame_id >= self.state.len() {
            return Err(Error::BadBufFrameNo(frame_id as i64));
        }
        self.pin_count[frame_id] += 1;
        self.state[frame_id] = FrameState::Pinned;
        Ok(())
    }

    fn unpin(&mut self, frame_id: FrameId) -> Result<()> {
        if frame_id >= self.state.len() {
            return Err(Error::BadBufFrameNo(frame_id as i64));
        }
        assert!(
            self.pin_count[frame_id] > 0,
            "unpin of a frame the replacer never pinned"
        );
        self.pin_count[frame_id] -= 1;
        if self.pin_count[frame_id] == 0 {
            self.state[frame_id] = FrameState::Referenced;
        }
        Ok(())
    }

    fn free(&mut self, frame_id: FrameId) {
        if self.pin_count[frame_id] > 0 {
            self.pin_count[frame_id] -= 1;
        }
        self.state[frame_id] = FrameState::Available;
    }

    fn pick_victim(&mut self) -> Result<FrameId> {
        let n = self.state.len();
        if n == 0 {
            return Err(Error::BufferExceeded);
        }
        // Two full sweeps: a frame demoted from Referenced on the first pass
        // is only picked up as Available on the second.
        for _ in 0..2 * n {
            self.head = (self.head + 1) % n;
            match self.state[self.head] {
                FrameState::Available => {
                    let victim = self.head;
                    assert_eq!(self.pin_count[victim], 0);
                    self.state[victim] = FrameState::Pinned;
                    self.pin_count[victim] = 1;
                    return Ok(victim);
                }
                FrameState::Referenced => {
                    self.state[self.head] = FrameState::Available;
                }
                FrameState::Pinned => {}
            }
        }
        Err(Error::BufferExceeded)
    }

    fn num_unpinned(&self) -> usize {
        self.pin_count.iter().filter(|&&c| c == 0).count()
    }
}
