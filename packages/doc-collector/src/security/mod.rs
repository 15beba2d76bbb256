//! Credential handling for the extraction service.

pub mod credentials;

pub use credentials::ModelCredentials;
