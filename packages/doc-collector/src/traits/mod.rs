//! Core trait abstractions.
//!
//! These are the seams where the storage medium, the HTTP layer and the
//! generative model can be swapped without touching collection logic.

pub mod ai;
pub mod collector;
pub mod fetcher;
pub mod store;
