//! Capability-aware query composition for the GitHub API: field selection
//! compiling, host feature detection, metadata name resolution and
//! pagination.

pub mod client;
pub mod error;
pub mod features;
pub mod instance;
pub mod metadata;
pub mod pagination;
pub mod query_builder;
pub mod repo;
pub mod responses;

#[cfg(test)]
mod test_utils;

pub use client::{ApiClient, HttpTransport, Transport};
pub use error::{PullpoError, Result};
pub use repo::RepoRef;
