//! Batch orchestrator: grouped concurrent dispatch with in-order output.
//!
//! The page stream is partitioned into consecutive groups of size =
//! configured concurrency (the last group may be smaller). Each group's
//! transcription calls are dispatched concurrently and awaited together;
//! results are written in submission order, not completion order, so output
//! fragment order always equals page order regardless of response jitter.
//! Groups are strictly sequential, which also caps in-flight remote calls at
//! the group size.
//!
//! Every fragment is followed by [`PAGE_SEPARATOR`] and flushed immediately,
//! so output from completed groups is durable even when a later group fails.
//! A failure anywhere in a group (page source, encoding, or a non-retryable
//! client error) aborts the run before any of that group's fragments are
//! written; no further groups are started.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::pipeline::client::Transcriber;
use crate::pipeline::encode::{encode_page, EncodedPage};
use crate::pipeline::source::{PageImage, PageStream};
use futures::future;
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Separator written after every page fragment, the last one included:
/// three newlines, ten dashes, three newlines.
pub const PAGE_SEPARATOR: &str = "\n\n\n----------\n\n\n";

/// Drive the page stream through the transcriber and write Markdown
/// fragments to `sink` in page order.
///
/// Returns the number of pages written. An empty page stream writes nothing
/// and returns 0 without making any remote call.
pub async fn transcribe_pages<W>(
    pages: PageStream,
    transcriber: &dyn Transcriber,
    config: &ConversionConfig,
    sink: &mut W,
) -> Result<usize, ConvertError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let group_size = config.concurrency.max(1);
    let progress = config.progress_callback.as_deref();

    if let Some(cb) = progress {
        cb.on_start();
    }

    let mut groups = pages.chunks(group_size);
    let mut pages_done = 0usize;

    while let Some(group) = groups.next().await {
        // A page-source error poisons the whole group before any dispatch.
        let images: Vec<PageImage> = group.into_iter().collect::<Result<_, _>>()?;
        let encoded: Vec<EncodedPage> = images
            .iter()
            .map(|page| encode_page(page, config.image_format))
            .collect::<Result<_, _>>()?;
        drop(images);

        debug!("Dispatching group of {} pages", encoded.len());

        // try_join_all preserves submission order in its output and fails
        // the whole group on the first non-retryable error.
        let fragments =
            future::try_join_all(encoded.iter().map(|page| transcriber.transcribe(page))).await?;

        for fragment in &fragments {
            sink.write_all(fragment.as_bytes())
                .await
                .map_err(|e| ConvertError::OutputWriteFailed { source: e })?;
            sink.write_all(PAGE_SEPARATOR.as_bytes())
                .await
                .map_err(|e| ConvertError::OutputWriteFailed { source: e })?;
            sink.flush()
                .await
                .map_err(|e| ConvertError::OutputWriteFailed { source: e })?;

            pages_done += 1;
            if let Some(cb) = progress {
                cb.on_page_complete(pages_done);
            }
        }
    }

    if let Some(cb) = progress {
        cb.on_finish(pages_done);
    }
    info!("Wrote {} page fragments", pages_done);

    Ok(pages_done)
}
