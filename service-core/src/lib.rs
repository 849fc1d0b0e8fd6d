//! service-core: Shared infrastructure for the clinic client crates.
pub mod config;
pub mod observability;
pub mod retry;
