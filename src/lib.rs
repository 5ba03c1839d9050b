//! Prat - Interview Podcast Generation
//!
//! A CLI tool that turns a topic into a multi-speaker podcast script and,
//! optionally, a rendered audio episode.
//!
//! The name "Prat" comes from the Norwegian word for "chat."
//!
//! # Overview
//!
//! Prat allows you to:
//! - Research a topic via Wikipedia and web search, or from your own sources
//! - Build a structured episode outline with an LLM
//! - Expand the outline into an interview-style dialogue, section by section
//! - Render the dialogue to audio with per-speaker voices
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `throttle` - Per-provider rate limiting and retry
//! - `checkpoint` - Stage checkpointing for resumable runs
//! - `sources` - Text extraction from files, URLs, and media
//! - `research` - Research collection (Wikipedia + web search)
//! - `llm` - Chat model abstraction and structured generation
//! - `embedding` - Embedding generation
//! - `retrieval` - In-memory context retrieval over research snippets
//! - `outline` - Episode outline generation
//! - `script` - Dialogue script generation
//! - `tts` - Text-to-speech provider adapters
//! - `speech` - Audio rendering and assembly
//! - `pipeline` - Stage coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use prat::config::Settings;
//! use prat::pipeline::{GenerateRequest, Generator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let generator = Generator::new(settings)?;
//!
//!     let report = generator
//!         .generate(GenerateRequest::research("The history of Linux"))
//!         .await?;
//!     println!("Transcript written to {:?}", report.transcript_path);
//!
//!     Ok(())
//! }
//! ```

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod outline;
pub mod pipeline;
pub mod research;
pub mod retrieval;
pub mod script;
pub mod sources;
pub mod speech;
pub mod throttle;
pub mod tts;

pub use error::{PratError, Result};
pub use pipeline::{GenerateReport, GenerateRequest, Generator};
