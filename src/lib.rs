//! vidqa - question answering over YouTube transcripts
//!
//! Given a video and a question, vidqa fetches the video's captions, splits
//! them into overlapping chunks, embeds the chunks into an in-memory index
//! and asks a language model to answer using only the most relevant
//! excerpts.
//!
//! # Architecture
//!
//! - `video` - video ID parsing
//! - `transcript` - caption providers with retry, circuit breaking and memoization
//! - `chunking` - transcript splitting strategies
//! - `embedding` - embedding generation
//! - `vector_store` - in-memory similarity search
//! - `retrieval` - per-transcript indices cached by content hash
//! - `rag` - prompt assembly and answer generation
//! - `service` - the end-to-end pipeline
//!
//! # Example
//!
//! ```rust,no_run
//! use vidqa::config::Settings;
//! use vidqa::service::QaService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let service = QaService::new(&settings)?;
//!
//!     let result = service
//!         .ask("https://youtu.be/dQw4w9WgXcQ", "What is the song about?")
//!         .await?;
//!     println!("{}", result.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod flight;
pub mod openai;
pub mod rag;
pub mod retrieval;
pub mod retry;
pub mod service;
pub mod transcript;
pub mod vector_store;
pub mod video;

pub use error::{Result, VidqaError};
