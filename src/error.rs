//! Error types for the pagemd library.
//!
//! One enum covers the whole pipeline, but the variants fall into three
//! behavioural classes the orchestrator cares about:
//!
//! * **Input errors** (`FileNotFound`, `NotAPdf`, …) — detected before any
//!   remote call is made; the run fails fast.
//!
//! * **`RateLimited`** — the one retryable class. The transcription client
//!   recovers from it locally with unbounded exponential backoff; callers
//!   never see it unless the process is interrupted mid-retry.
//!
//! * **Everything else** (`AuthFailed`, `ApiError`, `Network`, I/O) — not
//!   retried. Propagates immediately, aborting the current page group and
//!   all subsequent groups. Output already flushed for earlier groups stays
//!   on the sink.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pagemd library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    // ── Page source errors ────────────────────────────────────────────────
    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not create or write to the page-image cache directory.
    #[error("Failed to write page cache at '{path}': {source}")]
    CacheWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cached page image could not be opened or decoded.
    #[error("Failed to read cached page image '{path}': {detail}")]
    CacheReadFailed { path: PathBuf, detail: String },

    /// In-memory image encoding failed before the remote call.
    #[error("Image encoding failed for page {page}: {detail}")]
    EncodeFailed { page: usize, detail: String },

    // ── Remote transcription errors ───────────────────────────────────────
    /// The API returned HTTP 429 — retried internally with backoff.
    ///
    /// `retry_after_secs` carries a server-specified delay when one was sent;
    /// the backoff schedule is exponential either way.
    #[error("Rate limit exceeded (retry-after: {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The API rejected the credential (401/403) — retry will not help.
    #[error("Authentication failed: {detail}\nCheck OPENAI_API_KEY.")]
    AuthFailed { detail: String },

    /// Any other non-success API response (malformed request, quota, 5xx).
    #[error("API error (HTTP {status}): {detail}")]
    ApiError { status: u16, detail: String },

    /// Transport-level failure (connection reset, DNS, timeout).
    #[error("Network error talking to the transcription API: {detail}")]
    Network { detail: String },

    /// No API credential available from config or environment.
    #[error("No API key configured.\nSet OPENAI_API_KEY or pass one explicitly.")]
    MissingApiKey,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write a Markdown fragment to the output sink.
    #[error("Failed to write output: {source}")]
    OutputWriteFailed {
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Whether this error is a rate-limit signal the client should retry.
    ///
    /// Only `RateLimited` qualifies; auth failures, malformed requests, and
    /// transport errors propagate immediately.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ConvertError::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_the_only_retryable_class() {
        assert!(ConvertError::RateLimited {
            retry_after_secs: Some(30)
        }
        .is_rate_limit());
        assert!(ConvertError::RateLimited {
            retry_after_secs: None
        }
        .is_rate_limit());

        assert!(!ConvertError::AuthFailed {
            detail: "bad key".into()
        }
        .is_rate_limit());
        assert!(!ConvertError::Network {
            detail: "reset".into()
        }
        .is_rate_limit());
        assert!(!ConvertError::ApiError {
            status: 400,
            detail: "bad request".into()
        }
        .is_rate_limit());
    }

    #[test]
    fn file_not_found_display() {
        let e = ConvertError::FileNotFound {
            path: PathBuf::from("/tmp/missing.pdf"),
        };
        assert!(e.to_string().contains("/tmp/missing.pdf"));
    }

    #[test]
    fn api_error_display() {
        let e = ConvertError::ApiError {
            status: 400,
            detail: "invalid image".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("400"), "got: {msg}");
        assert!(msg.contains("invalid image"));
    }
}
