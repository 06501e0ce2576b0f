//! # pagemd
//!
//! Convert PDF documents to Markdown by transcribing page images with a
//! multimodal LLM.
//!
//! ## Why this crate?
//!
//! Traditional PDF-to-text tools (pdftotext, pdf-extract) fail on complex
//! layouts — multi-column text, mathematical symbols, and tables come out
//! garbled or out of reading order. Instead this crate rasterises each page
//! into an image and lets a vision model read it as a human would, producing
//! Markdown that preserves structure, tables, and formulae.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Source  lazy page rasterisation via pdfium (or replay of the
//!  │             on-disk page cache), bounded by group size
//!  ├─ 2. Encode  page image → base64 data URL
//!  ├─ 3. Client  one chat-completion call per page, exponential backoff
//!  │             on rate limits
//!  └─ 4. Batch   fixed-size groups of concurrent calls; fragments written
//!                to the sink in page order, separator after each, flushed
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagemd::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential from OPENAI_API_KEY
//!     let config = ConversionConfig::builder()
//!         .cache_pages(true)
//!         .concurrency(8)
//!         .build()?;
//!     let markdown = convert("document.pdf", &config).await?;
//!     println!("{markdown}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pagemd` binary (clap + anyhow + indicatif + rpassword) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pagemd = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod retry;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageImageFormat};
pub use convert::{convert, convert_to_writer};
pub use error::ConvertError;
pub use pipeline::batch::{transcribe_pages, PAGE_SEPARATOR};
pub use pipeline::client::{OpenAiTranscriber, Transcriber};
pub use pipeline::encode::{encode_page, EncodedPage};
pub use pipeline::source::{cache_dir_for, open_pages, PageImage, PageStream};
pub use progress::ProgressCallback;
pub use retry::{retry_with_backoff, Backoff};
