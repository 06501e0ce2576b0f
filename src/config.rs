//! Configuration types for PDF-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across tasks and to see at a glance why two
//! runs differ.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Raster format used for page images, both in memory and in the on-disk
/// page cache.
///
/// PNG is the default: lossless compression keeps rendered text crisp, which
/// matters far more for transcription accuracy than file size. JPEG is
/// available for very large pages where upload size dominates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageImageFormat {
    /// Lossless PNG (default).
    #[default]
    Png,
    /// Lossy JPEG; smaller uploads, softer glyph edges.
    Jpeg,
}

impl PageImageFormat {
    /// File extension used for cached page images.
    pub fn extension(self) -> &'static str {
        match self {
            PageImageFormat::Png => "png",
            PageImageFormat::Jpeg => "jpg",
        }
    }

    /// Media type used in the base64 data URL sent to the API.
    pub fn media_type(self) -> &'static str {
        match self {
            PageImageFormat::Png => "image/png",
            PageImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// The corresponding `image` crate encoder format.
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            PageImageFormat::Png => image::ImageFormat::Png,
            PageImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Configuration for a PDF-to-Markdown conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pagemd::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(150)
///     .concurrency(4)
///     .cache_pages(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–600. Default: 200.
    ///
    /// 200 DPI keeps small print legible to the model while page images stay
    /// comfortably below typical API upload limits. Lower it for very large
    /// pages, raise it for dense small-font documents.
    pub dpi: u32,

    /// Raster format for page images. Default: PNG.
    pub image_format: PageImageFormat,

    /// Persist page images to a sibling cache directory and reuse them on
    /// subsequent runs. Default: false.
    ///
    /// The cache directory is the document path with its extension stripped.
    /// When it already exists it is authoritative: pages are read back from
    /// it in file-name order and the PDF is never rasterised.
    pub cache_pages: bool,

    /// First page to convert, 1-indexed. `None` means page 1.
    pub first_page: Option<usize>,

    /// Last page to convert, 1-indexed, inclusive. `None` means the final page.
    ///
    /// A range that selects no pages (first > last, or entirely past the end
    /// of the document) produces an empty output, not an error.
    pub last_page: Option<usize>,

    /// Number of pages transcribed concurrently per group. Default: 8.
    ///
    /// The orchestrator processes the document in consecutive groups of this
    /// size, waiting for each whole group before starting the next. This is
    /// both the concurrency cap on in-flight API calls and the bound on how
    /// many decoded page images are held in memory at once.
    pub concurrency: usize,

    /// Model identifier sent to the chat-completions endpoint. Default: "gpt-4.1".
    pub model: String,

    /// Base URL of the OpenAI-compatible API. Default: "https://api.openai.com/v1".
    pub api_base: String,

    /// API credential. `None` falls back to the `OPENAI_API_KEY` environment
    /// variable; the library never prompts interactively (the CLI does).
    pub api_key: Option<String>,

    /// Sampling temperature. Default: 0.0.
    ///
    /// Zero makes the model deterministic and faithful to what it sees on the
    /// page — exactly what transcription wants.
    pub temperature: f32,

    /// Fixed sampling seed for reproducible runs. Default: 0.
    pub seed: u64,

    /// Maximum tokens the model may generate per page. Default: 16384.
    ///
    /// Sized generously so a dense full-page transcription is never silently
    /// truncated mid-sentence.
    pub max_tokens: usize,

    /// Initial retry delay in milliseconds for rate-limit backoff. Default: 1000.
    ///
    /// Doubles after each rate-limited attempt: 1 s → 2 s → 4 s → …
    /// Attempts are unbounded; only a rate-limit response triggers a retry.
    pub retry_base_ms: u64,

    /// Per-API-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Optional per-page progress callback, fired once per completed page.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            image_format: PageImageFormat::Png,
            cache_pages: false,
            first_page: None,
            last_page: None,
            concurrency: 8,
            model: "gpt-4.1".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            temperature: 0.0,
            seed: 0,
            max_tokens: 16384,
            retry_base_ms: 1000,
            api_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("image_format", &self.image_format)
            .field("cache_pages", &self.cache_pages)
            .field("first_page", &self.first_page)
            .field("last_page", &self.last_page)
            .field("concurrency", &self.concurrency)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("seed", &self.seed)
            .field("max_tokens", &self.max_tokens)
            .field("retry_base_ms", &self.retry_base_ms)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn image_format(mut self, fmt: PageImageFormat) -> Self {
        self.config.image_format = fmt;
        self
    }

    pub fn cache_pages(mut self, v: bool) -> Self {
        self.config.cache_pages = v;
        self
    }

    pub fn first_page(mut self, page: usize) -> Self {
        self.config.first_page = Some(page);
        self
    }

    pub fn last_page(mut self, page: usize) -> Self {
        self.config.last_page = Some(page);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn retry_base_ms(mut self, ms: u64) -> Self {
        self.config.retry_base_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(ConvertError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(ConvertError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ConvertError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if let Some(first) = c.first_page {
            if first == 0 {
                return Err(ConvertError::InvalidConfig(
                    "Pages are 1-indexed; first_page must be ≥ 1".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
