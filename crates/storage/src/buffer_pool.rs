use crate::disk_manager::DiskManager;
use crate::frame::PageFrame;
use crate::record_id::INVALID_PAGE;
use crate::replacer::clock_replacer::ClockReplacer;
use crate::replacer::Replacer;
use crate::typedef::{FrameId, PageId};
use rustdb_error::{errreplacer, Error};
use std::collections::{HashMap, VecDeque};

use crate::Result;

/// Fronts the disk manager with a fixed-size cache of `N` frames,
/// arbitrated by a pluggable [`Replacer`]. Writeback is unconditional: the
/// engine does not track a dirty bit, so every eviction and every flush
/// writes the frame's current bytes to disk regardless of whether the page
/// was actually modified.
pub struct BufferPoolManager {
    frames: Vec<PageFrame>,
    page_table: HashMap<PageId, FrameId>,
    replacer: Box<dyn Replacer>,
    free_list: VecDeque<FrameId>,
    disk_manager: DiskManager,
}

impl BufferPoolManager {
    pub fn new(pool_size: usize, disk_manager: DiskManager, replacer: Box<dyn Replacer>) -> Self {
        let mut frames = Vec::with_capacity(pool_size);
        frames.resize_with(pool_size, PageFrame::new);

        Self {
            frames,
            page_table: HashMap::new(),
            replacer,
            free_list: (0..pool_size).collect(),
            disk_manager,
        }
    }

    /// Convenience constructor selecting the default Clock replacement
    /// policy, mirroring `new` but without requiring callers to build a
    /// replacer themselves.
    pub fn with_clock_replacer(pool_size: usize, disk_manager: DiskManager) -> Self {
        Self::new(
            pool_size,
            disk_manager,
            Box::new(ClockReplacer::new(pool_size)),
        )
    }

    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    /// The number of frames whose descriptor pin count is zero. Read
    /// directly off the frame table rather than the replacer: the two
    /// `Replacer` implementations disagree on whether a never-touched,
    /// still-on-the-free-list frame counts as "evictable" before its first
    /// pin/unpin, while the frame table itself is unambiguous.
    pub fn num_unpinned_buffers(&self) -> usize {
        self.frames.iter().filter(|f| f.pin_count() == 0).count()
    }

    /// A never-used frame from the free list, or a replacer-chosen victim.
    /// Either way the returned frame comes back already pinned.
    fn acquire_frame(&mut self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.pop_front() {
            self.replacer.pin(frame_id)?;
            return Ok(frame_id);
        }
        match self.replacer.pick_victim() {
            Ok(frame_id) => Ok(frame_id),
            Err(e) => {
                tracing::error!(error = %e, "replacer could not find a victim");
                errreplacer!(e)
            }
        }
    }

    /// Pins `page_id` into a frame, fetching it from disk unless
    /// `empty_hint` is set (for freshly allocated pages with nothing on
    /// disk worth reading yet).
    pub fn pin_page(&mut self, page_id: PageId, empty_hint: bool) -> Result<&mut PageFrame> {
        if let Some(&frame_id) = self.page_table.get(&page_id) {
            self.replacer.pin(frame_id)?;
            self.frames[frame_id].increment_pin_count();
            tracing::debug!(page_id, frame_id, "pin hit");
            return Ok(&mut self.frames[frame_id]);
        }

        let frame_id = self.acquire_frame()?;
        let old_page = self.frames[frame_id].page_id();

        if old_page != INVALID_PAGE {
            let data = *self.frames[frame_id].data();
            if let Err(e) = self.disk_manager.write_page(old_page, &data) {
                self.frames[frame_id].set_page_id(old_page);
                if let Err(inner) = self.replacer.unpin(frame_id) {
                    tracing::error!(error = %inner, frame_id, "rollback unpin failed");
                }
                tracing::error!(error = %e, old_page, "eviction writeback failed, rolled back");
                return Err(e.chain("writing back evicted page"));
            }
            self.page_table.remove(&old_page);
            tracing::warn!(old_page, frame_id, "evicted page written back");
        }

        self.frames[frame_id].set_page_id(page_id);

        if !empty_hint {
            match self.disk_manager.read_page(page_id) {
                Ok(Some(bytes)) => self.frames[frame_id].data_mut().copy_from_slice(&bytes),
                Ok(None) => {
                    self.frames[frame_id].reset();
                    if let Err(inner) = self.replacer.unpin(frame_id) {
                        tracing::error!(error = %inner, frame_id, "rollback unpin failed");
                    }
                    tracing::error!(page_id, "page not found on disk");
                    return Err(Error::PageNotFound);
                }
                Err(e) => {
                    self.frames[frame_id].reset();
                    if let Err(inner) = self.replacer.unpin(frame_id) {
                        tracing::error!(error = %inner, frame_id, "rollback unpin failed");
                    }
                    return Err(e.chain("reading page from disk"));
                }
            }
        }

        self.frames[frame_id].set_pin_count(1);
        self.page_table.insert(page_id, frame_id);
        tracing::debug!(page_id, frame_id, "pin miss, loaded");
        Ok(&mut self.frames[frame_id])
    }

    /// Unpins `page_id`. `dirty_hint` is accepted for API parity with the
    /// common buffer-pool shape but not consulted — writeback here is
    /// always unconditional.
    pub fn unpin_page(&mut self, page_id: PageId, _dirty_hint: bool) -> Result<()> {
        let frame_id = *self
            .page_table
            .get(&page_id)
            .ok_or(Error::HashNotFound)?;
        let frame = &mut self.frames[frame_id];
        if frame.pin_count() == 0 {
            return Err(Error::PageNotPinned);
        }
        frame.decrement_pin_count();
        self.replacer.unpin(frame_id)?;
        tracing::debug!(page_id, frame_id, "unpinned");
        Ok(())
    }

    /// Allocates `count` contiguous pages on disk and pins the first,
    /// rolling the allocation back if no frame is available to hold it.
    pub fn new_page(&mut self, count: usize) -> Result<(PageId, &mut PageFrame)> {
        let first_id = self
            .disk_manager
            .allocate_pages(count)
            .map_err(|e| e.chain("allocating new pages"))?;

        match self.pin_page(first_id, true) {
            Ok(_) => {
                tracing::debug!(first_id, count, "new page(s) allocated");
                Ok((first_id, &mut self.frames[self.page_table[&first_id]]))
            }
            Err(e) => {
                for i in 0..count as i64 {
                    let _ = self.disk_manager.deallocate_page(first_id + i);
                }
                tracing::error!(error = %e, first_id, "rolled back failed allocation");
                Err(e)
            }
        }
    }

    /// Deallocates `page_id`. If it is resident and pinned more than once,
    /// refuses with `PagePinned`; otherwise evicts it from the pool (if
    /// present) and deallocates it on disk.
    pub fn free_page(&mut self, page_id: PageId) -> Result<()> {
        if let Some(&frame_id) = self.page_table.get(&page_id) {
            if self.frames[frame_id].pin_count() > 1 {
                return Err(Error::PagePinned);
            }
            self.replacer.free(frame_id);
            self.frames[frame_id].reset();
            self.page_table.remove(&page_id);
            self.free_list.push_back(frame_id);
        }

        self.disk_manager
            .deallocate_page(page_id)
            .map_err(|e| e.chain("deallocating page"))?;
        tracing::debug!(page_id, "freed page");
        Ok(())
    }

    /// Writes frame `frame_id`'s bytes back to disk and clears it from the
    /// page table, returning whether it was still pinned at the time.
    fn flush_frame(&mut self, frame_id: FrameId) -> Result<bool> {
        let pinned = self.frames[frame_id].pin_count() > 0;
        let page_id = self.frames[frame_id].page_id();
        let data = *self.frames[frame_id].data();
        self.disk_manager
            .write_page(page_id, &data)
            .map_err(|e| e.chain("flushing page"))?;
        self.frames[frame_id].set_page_id(INVALID_PAGE);
        self.page_table.remove(&page_id);
        tracing::debug!(page_id, frame_id, pinned, "flushed page");
        Ok(pinned)
    }

    pub fn flush_page(&mut self, page_id: PageId) -> Result<()> {
        let frame_id = match self.page_table.get(&page_id).copied() {
            Some(id) => id,
            None => return Err(Error::PageNotFound),
        };
        if self.flush_frame(frame_id)? {
            return Err(Error::PagePinned);
        }
        Ok(())
    }

    pub fn flush_all_pages(&mut self) -> Result<()> {
        let frame_ids: Vec<FrameId> = self.page_table.values().copied().collect();
        let mut any_pinned = false;
        for frame_id in frame_ids {
            if self.flush_frame(frame_id)? {
                any_pinned = true;
            }
        }
        if any_pinned {
            return Err(Error::PagePinned);
        }
        Ok(())
    }
}

impl Drop for BufferPoolManager {
    fn drop(&mut self) {
        if let Err(e) = self.flush_all_pages() {
            tracing::error!(error = %e, "error flushing buffer pool on drop");
        }
    }
}
