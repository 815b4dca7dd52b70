//! service-core: Shared infrastructure for the HTTP services in this workspace.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;

