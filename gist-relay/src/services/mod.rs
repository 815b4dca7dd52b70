pub mod gist;
pub mod metrics;

pub use gist::{GistError, GistStore, GitHubGistClient, InMemoryGistStore};
pub use metrics::{get_metrics, init_metrics, record_gist_operation};
