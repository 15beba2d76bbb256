//! Data types shared across the pipeline.

pub mod document;
pub mod source;
pub mod status;

pub use document::{DocumentDescriptor, DocumentRecord, StatusLevel, StoredRecord};
pub use source::Source;
pub use status::{RunStatus, RunSummary};
