//! Top-level conversion entry points.
//!
//! [`convert_to_writer`] streams fragments into any `AsyncWrite` sink as
//! groups complete — this is what the CLI uses, and what keeps partial
//! output durable when a later group fails. [`convert`] is the buffered
//! convenience wrapper that collects the whole document into a `String`.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::pipeline::client::{OpenAiTranscriber, Transcriber};
use crate::pipeline::{batch, source};
use std::io::Cursor;
use std::path::Path;
use tokio::io::AsyncWrite;
use tracing::info;

/// Convert a PDF to Markdown, writing fragments to `sink` as groups complete.
///
/// Fragments are written in page order, each followed by
/// [`batch::PAGE_SEPARATOR`], and flushed individually. Returns the number
/// of pages written.
///
/// # Errors
/// Input problems (missing file, not a PDF) fail before any remote call.
/// A non-retryable transcription error aborts the run mid-stream; output
/// already flushed for completed groups remains on the sink.
pub async fn convert_to_writer<W>(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
    transcriber: &dyn Transcriber,
    sink: &mut W,
) -> Result<usize, ConvertError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let pdf_path = pdf_path.as_ref();
    info!("Starting conversion: {}", pdf_path.display());

    let pages = source::open_pages(pdf_path, config)?;
    batch::transcribe_pages(pages, transcriber, config, sink).await
}

/// Convert a PDF to Markdown and return the assembled document.
///
/// Builds an [`OpenAiTranscriber`] from the config (credential from
/// `config.api_key` or the `OPENAI_API_KEY` environment variable).
pub async fn convert(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<String, ConvertError> {
    let transcriber = OpenAiTranscriber::from_config(config)?;

    let mut sink = Cursor::new(Vec::new());
    let pages = convert_to_writer(pdf_path, config, &transcriber, &mut sink).await?;
    info!("Conversion complete: {} pages", pages);

    String::from_utf8(sink.into_inner())
        .map_err(|e| ConvertError::Internal(format!("output was not UTF-8: {e}")))
}
