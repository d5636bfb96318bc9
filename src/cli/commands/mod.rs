//! CLI command implementations.

mod ask;
mod config;
mod search;
mod serve;
mod transcript;

pub use ask::run_ask;
pub use config::run_config;
pub use search::run_search;
pub use serve::{router, run_serve, AppState};
pub use transcript::run_transcript;
