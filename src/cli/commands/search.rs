//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::service::QaService;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(video: &str, query: &str, k: Option<usize>, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let service = QaService::new(settings)?;
    let spinner = Output::spinner("Searching...");

    let response = service.search(video, query, k).await;
    spinner.finish_and_clear();

    match response {
        Ok(response) if response.results.is_empty() => {
            Output::warning("No excerpts matched your query.");
        }
        Ok(response) => {
            Output::success(&format!(
                "Found {} excerpts in {}",
                response.results.len(),
                response.video_id
            ));
            for chunk in &response.results {
                Output::excerpt(chunk.chunk_order, chunk.score, &chunk.content);
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
