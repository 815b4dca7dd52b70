//! gist-relay: share and load notebooks through GitHub Gists.
pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod startup;

pub use startup::{AppState, Application};
