//! Storage backends.
//!
//! Everything above this layer reads bytes through [`StorageSource`]:
//!
//! - [`DiskSource`] - local disk via `tokio::fs`, with glob expansion
//! - [`MemorySource`] - in-memory files, used for embedding and tests

mod disk;
mod memory;
mod traits;

pub use disk::DiskSource;
pub use memory::MemorySource;
pub use traits::{BoxFuture, DirEntry, FileKind, Stat, StorageSource};
