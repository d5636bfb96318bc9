//! Subtitle download via yt-dlp.
//!
//! Covers videos whose caption tracks the caption client cannot reach,
//! and auto-generated subtitles in regional language variants.

use super::normalize::srt_to_text;
use super::TranscriptProvider;
use crate::error::{Result, VidqaError};
use crate::video::watch_url;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Stderr fragments that mean the video itself has nothing to offer.
const UNAVAILABLE_MARKERS: &[&str] = &[
    "Video unavailable",
    "Private video",
    "This video has been removed",
    "members-only",
    "Sign in to confirm your age",
];

/// Transcript provider backed by the `yt-dlp` command line tool.
pub struct YtDlpProvider {
    binary: String,
    languages: Vec<String>,
    temp_root: PathBuf,
}

impl YtDlpProvider {
    pub fn new(languages: Vec<String>, temp_root: PathBuf) -> Self {
        Self::with_binary("yt-dlp", languages, temp_root)
    }

    pub fn with_binary(binary: &str, languages: Vec<String>, temp_root: PathBuf) -> Self {
        Self {
            binary: binary.to_string(),
            languages,
            temp_root,
        }
    }

    /// Value for `--sub-langs`: each language plus its regional variants.
    fn sub_langs(&self) -> String {
        self.languages
            .iter()
            .flat_map(|lang| [lang.clone(), format!("{}-.*", lang)])
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[async_trait]
impl TranscriptProvider for YtDlpProvider {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<Option<String>> {
        std::fs::create_dir_all(&self.temp_root)?;
        let workdir = tempfile::Builder::new()
            .prefix("subs-")
            .tempdir_in(&self.temp_root)?;

        let template = workdir.path().join("%(id)s.%(ext)s");

        let result = Command::new(&self.binary)
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-format").arg("srt/vtt/best")
            .arg("--sub-langs").arg(self.sub_langs())
            .arg("--output").arg(&template)
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(watch_url(video_id))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VidqaError::ToolNotFound(self.binary.clone()));
            }
            Err(e) => {
                return Err(VidqaError::ToolFailed(format!("{} execution failed: {e}", self.binary)));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if UNAVAILABLE_MARKERS.iter().any(|m| stderr.contains(m)) {
                info!("yt-dlp reports video {} unavailable", video_id);
                return Ok(None);
            }
            return Err(VidqaError::ToolFailed(format!("{} failed: {}", self.binary, stderr.trim())));
        }

        let Some(path) = find_subtitle_file(workdir.path(), video_id)? else {
            info!("yt-dlp found no subtitles for video {}", video_id);
            return Ok(None);
        };

        debug!("Reading subtitles from {:?}", path);
        let bytes = tokio::fs::read(&path).await?;
        let text = srt_to_text(&String::from_utf8_lossy(&bytes));

        Ok((!text.is_empty()).then_some(text))
    }
}

/// Locate a downloaded subtitle file for the video, preferring SRT.
fn find_subtitle_file(dir: &Path, video_id: &str) -> Result<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            name.starts_with(video_id) && (name.ends_with(".srt") || name.ends_with(".vtt"))
        })
        .collect();

    // SRT first, then a stable order among languages.
    candidates.sort_by_key(|p| {
        let is_vtt = p.extension().is_some_and(|e| e == "vtt");
        (is_vtt, p.clone())
    });

    Ok(candidates.into_iter().next())
}
