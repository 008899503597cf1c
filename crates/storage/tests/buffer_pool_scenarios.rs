//! Integration coverage for the buffer-manager scenarios: allocate/pin/
//! unpin, eviction under pressure, pool exhaustion, and shutdown flushing.
//! Each test stands up a real `DiskManager` on a temp file so writeback and
//! re-read go through actual file I/O, not just in-memory state.

use rustdb_error::Error;
use storage::buffer_pool::BufferPoolManager;
use storage::disk_manager::DiskManager;
use storage::frame::PAGE_SIZE;
use storage::slotted_page::{SlottedPageMut, SlottedPageRef};

fn pool(pool_size: usize) -> (tempfile::TempDir, BufferPoolManager) {
    let dir = tempfile::tempdir().unwrap();
    let disk = DiskManager::new(dir.path().join("scenarios.db")).unwrap();
    (dir, BufferPoolManager::with_clock_replacer(pool_size, disk))
}

// S1: allocate a page, write a record into it via SlottedPage, unpin, evict
// it out by filling the pool, then pin it back and read the record.
#[test]
fn record_survives_eviction_round_trip() {
    let (_dir, mut bpm) = pool(1);

    let (page_id, frame) = bpm.new_page(1).unwrap();
    SlottedPageMut::from(&mut frame.data_mut()[..]).init(page_id);
    let rid = SlottedPageMut::from(&mut frame.data_mut()[..])
        .insert_record(b"hello, buffer pool")
        .unwrap();
    bpm.unpin_page(page_id, true).unwrap();

    // A single-frame pool forces the next new_page to evict page_id.
    let (other_id, _) = bpm.new_page(1).unwrap();
    bpm.unpin_page(other_id, false).unwrap();

    let frame = bpm.pin_page(page_id, false).unwrap();
    let page = SlottedPageRef::from(&frame.data()[..]);
    assert_eq!(page.get_record(rid).unwrap(), b"hello, buffer pool");
    bpm.unpin_page(page_id, false).unwrap();
}

// S2: insert records until a page reports DONE, matching SlottedPage's own
// failure policy surfaced through a pinned frame.
#[test]
fn page_reports_done_when_full() {
    let (_dir, mut bpm) = pool(2);
    let (page_id, frame) = bpm.new_page(1).unwrap();
    let mut page = SlottedPageMut::from(&mut frame.data_mut()[..]);
    page.init(page_id);

    let record = [0xABu8; 64];
    let mut inserted = 0;
    loop {
        match page.insert_record(&record) {
            Ok(_) => inserted += 1,
            Err(_) => break,
        }
    }
    assert!(inserted > 0);
    bpm.unpin_page(page_id, true).unwrap();
}

// S3: pinning beyond pool capacity fails without leaving the pool
// internally inconsistent — a later unpin+retry still succeeds.
#[test]
fn exhausting_the_pool_then_retrying_after_unpin_succeeds() {
    let (_dir, mut bpm) = pool(2);
    let (a, _) = bpm.new_page(1).unwrap();
    let (b, _) = bpm.new_page(1).unwrap();

    assert!(matches!(bpm.new_page(1), Err(Error::ReplacerError(_))));

    bpm.unpin_page(a, false).unwrap();
    let (c, _) = bpm.new_page(1).unwrap();
    bpm.unpin_page(b, false).unwrap();
    bpm.unpin_page(c, false).unwrap();
}

// S4: freeing a resident, unpinned page removes it from the pool and the
// backing store reports it deleted.
#[test]
fn free_page_removes_it_from_disk() {
    let (_dir, mut bpm) = pool(2);
    let (page_id, _) = bpm.new_page(1).unwrap();
    bpm.unpin_page(page_id, false).unwrap();
    bpm.free_page(page_id).unwrap();

    // Re-pinning a freed page re-allocates fresh, zeroed bytes rather than
    // failing, since the disk manager may hand the id back out.
    assert!(bpm.pin_page(page_id, true).is_ok());
}

// S5: flushing a single resident page clears it from the pool and
// reports PAGE_NOT_FOUND for ids that were never resident.
#[test]
fn flush_single_page_and_missing_page_errors() {
    let (_dir, mut bpm) = pool(2);
    let (page_id, _) = bpm.new_page(1).unwrap();
    bpm.unpin_page(page_id, false).unwrap();
    bpm.flush_page(page_id).unwrap();

    assert!(matches!(bpm.flush_page(page_id), Err(Error::PageNotFound)));
}

// S6: shutdown (Drop) flushes all pages unconditionally, even ones that
// were never explicitly unpinned.
#[test]
fn drop_flushes_all_pages_best_effort() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shutdown.db");
    let page_id;
    {
        let disk = DiskManager::new(&db_path).unwrap();
        let mut bpm = BufferPoolManager::with_clock_replacer(2, disk);
        let (id, frame) = bpm.new_page(1).unwrap();
        frame.data_mut()[0] = 0x42;
        page_id = id;
        // bpm drops here without an explicit unpin_page call.
    }

    let disk = DiskManager::new(&db_path).unwrap();
    let bytes = disk.read_page(page_id).unwrap().unwrap();
    assert_eq!(bytes[0], 0x42, "Drop must flush pages even while pinned");
}

#[test]
fn capacity_and_unpinned_count_are_consistent() {
    let (_dir, bpm) = pool(5);
    assert_eq!(bpm.capacity(), 5);
    assert_eq!(bpm.num_unpinned_buffers(), 5);
}

#[test]
fn page_size_matches_slotted_page_expectations() {
    assert_eq!(PAGE_SIZE, 1024);
}
