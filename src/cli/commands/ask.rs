//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::service::QaService;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(video: &str, question: &str, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let service = QaService::new(settings)?;
    let spinner = Output::spinner("Reading the transcript...");

    let result = service.ask(video, question).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            println!("\n{}\n", result.answer);

            if !result.context.is_empty() {
                Output::header("Context");
                for chunk in &result.context {
                    Output::excerpt(chunk.chunk_order, chunk.score, &chunk.content);
                }
                println!();
            }
            Output::kv("Video", &result.video_id);
            Output::kv("Transcript source", &result.provider);
        }
        Err(e) => {
            Output::error(&format!("Failed to answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
