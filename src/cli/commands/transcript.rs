//! Transcript command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::VidqaError;
use crate::transcript::create_fetcher;
use crate::video::parse_video_id;
use anyhow::Result;

/// Fetch a transcript and print it or write it to a file.
pub async fn run_transcript(video: &str, output: Option<&str>, settings: &Settings) -> Result<()> {
    let video_id = parse_video_id(video)
        .ok_or_else(|| VidqaError::InvalidInput(format!("Not a YouTube video URL or ID: {}", video)))?;

    let fetcher = create_fetcher(settings)?;

    let spinner = Output::spinner(&format!("Fetching transcript for {}...", video_id));
    let result = fetcher.fetch(&video_id).await;
    spinner.finish_and_clear();

    let transcript = match result {
        Ok(t) => t,
        Err(e) => {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    };

    match output {
        Some(path) => {
            let path = Settings::expand_path(path);
            std::fs::write(&path, &transcript.text)?;
            Output::success(&format!(
                "Wrote {} characters from {} to {}",
                transcript.char_count(),
                transcript.provider,
                path.display()
            ));
        }
        None => println!("{}", transcript.text),
    }

    Ok(())
}
