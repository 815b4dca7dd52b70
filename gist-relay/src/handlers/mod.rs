pub mod gists;
pub mod health;

pub use gists::{create_gist, fetch_gist};
pub use health::{health_check, metrics_endpoint, readiness_check};
