//! Shared scalar type aliases used across the storage core.

/// A page identifier, as handed out by the disk manager. Negative values
/// are reserved for sentinels (`INVALID_PAGE`); valid ids are non-negative.
pub type PageId = i64;

/// An index into the buffer pool's frame array. Frames are created once at
/// pool construction, so this never needs to be larger than `usize`.
pub type FrameId = usize;
