//! Collection pipeline: sequential collection, discovery, index rebuild and
//! batch orchestration.

pub mod discovery;
pub mod index;
pub mod run;

pub use discovery::Discoverer;
pub use index::{rebuild_index, sort_records, IndexBuilder};
pub use run::{BatchRunner, Pipeline};
