//! RAII guards that unpin a page automatically when dropped, so callers
//! cannot forget to balance a `pin_page`/`new_page` with `unpin_page`.

use crate::buffer_pool::BufferPoolManager;
use crate::frame::PageFrame;
use crate::typedef::PageId;
use std::sync::{Arc, RwLock};

/// Immutable page handle for read access.
pub struct PageFrameRefHandle<'a> {
    bpm: Arc<RwLock<BufferPoolManager>>,
    page_frame: &'a PageFrame,
}

impl<'a> PageFrameRefHandle<'a> {
    pub(crate) fn new(bpm: Arc<RwLock<BufferPoolManager>>, page_frame: &'a PageFrame) -> Self {
        PageFrameRefHandle { bpm, page_frame }
    }

    pub fn page_frame(&self) -> &PageFrame {
        self.page_frame
    }
}

impl<'a> Drop for PageFrameRefHandle<'a> {
    fn drop(&mut self) {
        let page_id: PageId = self.page_frame.page_id();
        if let Err(e) = self.bpm.write().unwrap().unpin_page(page_id, false) {
            tracing::error!(error = %e, page_id, "failed to unpin on handle drop");
        }
    }
}

/// Mutable page handle for write access.
pub struct PageFrameMutHandle<'a> {
    bpm: Arc<RwLock<BufferPoolManager>>,
    page_frame: &'a mut PageFrame,
}

impl<'a> PageFrameMutHandle<'a> {
    pub(crate) fn new(bpm: Arc<RwLock<BufferPoolManager>>, page_frame: &'a mut PageFrame) -> Self {
        PageFrameMutHandle { bpm, page_frame }
    }

    pub fn page_frame_mut(&mut self) -> &mut PageFrame {
        self.page_frame
    }
}

impl<'a> Drop for PageFrameMutHandle<'a> {
    fn drop(&mut self) {
        let page_id: PageId = self.page_frame.page_id();
        if let Err(e) = self.bpm.write().unwrap().unpin_page(page_id, true) {
            tracing::error!(error = %e, page_id, "failed to unpin on handle drop");
        }
    }
}

impl<'a> AsRef<PageFrame> for PageFrameRefHandle<'a> {
    fn as_ref(&self) -> &PageFrame {
        self.page_frame
    }
}

impl<'a> AsMut<PageFrame> for PageFrameMutHandle<'a> {
    fn as_mut(&mut self) -> &mut PageFrame {
        self.page_frame
    }
}

impl<'a> AsRef<PageFrame> for PageFrameMutHandle<'a> {
    fn as_ref(&self) -> &PageFrame {
        self.page_frame
    }
}

/// Allocates a new page and returns it pre-pinned behind a guard that
/// unpins on drop. Escapes the borrow checker with a raw pointer the same
/// way the buffer pool's own frame references would require, since the
/// handle must outlive the `RwLockWriteGuard` taken to create it.
pub fn new_page_handle(
    bpm: Arc<RwLock<BufferPoolManager>>,
    count: usize,
) -> crate::Result<PageFrameMutHandle<'static>> {
    let mut guard = bpm.write().unwrap();
    let bpm_ptr = &mut *guard as *mut BufferPoolManager;
    let (_page_id, page_frame) = unsafe { (*bpm_ptr).new_page(count)? };
    Ok(PageFrameMutHandle::new(bpm.clone(), page_frame))
}

pub fn pin_page_handle(
    bpm: Arc<RwLock<BufferPoolManager>>,
    page_id: PageId,
) -> crate::Result<PageFrameRefHandle<'static>> {
    let mut guard = bpm.write().unwrap();
    let bpm_ptr = &mut *guard as *mut BufferPoolManager;
    let page_frame = unsafe { (*bpm_ptr).pin_page(page_id, false)? };
    Ok(PageFrameRefHandle::new(bpm.clone(), page_frame))
}

pub fn pin_page_mut_handle(
    bpm: Arc<RwLock<BufferPoolManager>>,
    page_id: PageId,
) -> crate::Result<PageFrameMutHandle<'static>> {
    let mut guard = bpm.write().unwrap();
    let bpm_ptr = &mut *guard as *mut BufferPoolManager;
    let page_frame = unsafe { (*bpm_ptr).pin_page(page_id, false)? };
    Ok(PageFrameMutHandle::new(bpm.clone(), page_frame))
}
