//! Pluggable frame-replacement strategies. `BufferPoolManager` owns exactly
//! one `Box<dyn Replacer>`, chosen at construction; the two provided here
//! are [`clock_replacer::ClockReplacer`] (the default) and
//! [`lru_replacer::LruReplacer`].

pub(crate) mod clock_replacer;
pub(crate) mod lru_replacer;

use crate::typedef::FrameId;
use rustdb_error::Result;

/// Tracks per-frame replacement eligibility and chooses a victim on demand.
/// Does not own frame storage or page data; `BufferPoolManager` is the sole
/// caller and is responsible for keeping a frame's own pin-count mirror
/// (`PageFrame::pin_count`) in step with every `pin`/`unpin`/`free` call
/// made here.
pub trait Replacer {
    /// Marks `frame_id` pinned, making it ineligible for eviction. Fails
    /// with `Error::BadBufFrameNo` if `frame_id` is outside the replacer's
    /// known frame range.
    fn pin(&mut self, frame_id: FrameId) -> Result<()>;

    /// Marks `frame_id` unpinned. Implementations that count pins should
    /// only become evictable once the count reaches zero. Fails with
    /// `Error::BadBufFrameNo` if `frame_id` is outside the replacer's known
    /// frame range.
    fn unpin(&mut self, frame_id: FrameId) -> Result<()>;

    /// Forcibly returns `frame_id` to the evictable pool, as when its page
    /// is being deallocated out from under it.
    fn free(&mut self, frame_id: FrameId);

    /// Chooses and pins a victim frame, returning its id. Fails with
    /// `Error::BufferExceeded` if no evictable frame can be found.
    fn pick_victim(&mut self) -> Result<FrameId>;

    /// Number of frames currently eligible for eviction (unpinned).
    fn num_unpinned(&self) -> usize;
}
