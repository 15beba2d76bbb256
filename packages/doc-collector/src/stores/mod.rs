//! Storage implementations.
//!
//! Available backends:
//! - `FsMetadataStore` - one JSON file per record under a data root
//! - `MemoryStore` - in-memory storage for tests
//!
//! Plus the file-backed `SourceRegistry`.

pub mod fs;
pub mod memory;
pub mod registry;

pub use fs::FsMetadataStore;
pub use memory::MemoryStore;
pub use registry::{default_sources, merge_sources, SourceRegistry};
