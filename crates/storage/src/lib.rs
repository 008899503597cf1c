//! Storage core: a fixed-size buffer pool fronting a disk-backed page file,
//! and a slotted-page layout for variable-length records addressed by RID.

pub mod buffer_pool;
pub mod disk_manager;
pub mod frame;
pub mod frame_handle;
pub mod record_id;
pub mod replacer;
pub mod slotted_page;
pub mod typedef;

pub type Result<T> = std::result::Result<T, rustdb_error::Error>;
