//! Page source: a lazy, ordered stream of rasterised page images.
//!
//! ## Why a bounded channel?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which is not safe
//! to call from async contexts, so rendering runs on a `spawn_blocking`
//! worker. The worker feeds a **bounded** `mpsc` channel whose capacity
//! equals the configured concurrency: the orchestrator pulls one group at a
//! time, so at most one group's worth of decoded images ever sits in memory,
//! regardless of document length.
//!
//! ## Page cache
//!
//! With caching enabled, page images are persisted to a sibling directory
//! named after the document (extension stripped), one file per page, named
//! so that lexicographic order equals page order. If that directory already
//! exists it is authoritative: pages are decoded straight from it, in
//! file-name order, and pdfium is never invoked — including the page-range
//! bounds, which only apply when rasterising.

use crate::config::{ConversionConfig, PageImageFormat};
use crate::error::ConvertError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

/// A decoded raster image of one page, tagged with its ordinal position in
/// the output sequence (0-based).
pub struct PageImage {
    pub index: usize,
    pub image: DynamicImage,
}

/// A boxed, lazy stream of page images in document order.
///
/// Finite and not restartable once consumed; call [`open_pages`] again for a
/// fresh pass over the document.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageImage, ConvertError>> + Send>>;

/// The cache directory for a document: its path with the extension stripped.
pub fn cache_dir_for(pdf_path: &Path) -> PathBuf {
    pdf_path.with_extension("")
}

/// Open a lazy stream of page images for the given document.
///
/// Validates the input file up front (existence, readability, `%PDF` magic)
/// so the run fails fast before any remote call. Must be called from within
/// a tokio runtime — decoding runs on the blocking thread pool.
///
/// An empty or out-of-bounds page range yields an empty stream, not an error.
pub fn open_pages(pdf_path: &Path, config: &ConversionConfig) -> Result<PageStream, ConvertError> {
    validate_input(pdf_path)?;

    let capacity = config.concurrency.max(1);
    let (tx, rx) = mpsc::channel::<Result<PageImage, ConvertError>>(capacity);

    let cache_dir = cache_dir_for(pdf_path);
    let format = config.image_format;

    if config.cache_pages && cache_dir.is_dir() {
        info!("Reusing page cache: {}", cache_dir.display());
        tokio::task::spawn_blocking(move || cached_pages_worker(&cache_dir, format, &tx));
    } else {
        let path = pdf_path.to_path_buf();
        let dpi = config.dpi;
        let first = config.first_page;
        let last = config.last_page;
        let cache_to = config.cache_pages.then_some(cache_dir);
        tokio::task::spawn_blocking(move || {
            rasterise_worker(&path, dpi, format, first, last, cache_to.as_deref(), &tx)
        });
    }

    Ok(Box::pin(ReceiverStream::new(rx)))
}

/// Validate existence, readability, and PDF magic bytes.
fn validate_input(path: &Path) -> Result<(), ConvertError> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            // A file too short to hold the magic bytes is not a PDF either.
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
                return Err(ConvertError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ConvertError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Validated input PDF: {}", path.display());
    Ok(())
}

/// Blocking worker: replay the page cache in file-name order.
fn cached_pages_worker(
    cache_dir: &Path,
    format: PageImageFormat,
    tx: &mpsc::Sender<Result<PageImage, ConvertError>>,
) {
    let mut paths: Vec<PathBuf> = match std::fs::read_dir(cache_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(format.extension()))
            })
            .collect(),
        Err(e) => {
            let _ = tx.blocking_send(Err(ConvertError::CacheReadFailed {
                path: cache_dir.to_path_buf(),
                detail: e.to_string(),
            }));
            return;
        }
    };
    paths.sort();

    for (index, path) in paths.into_iter().enumerate() {
        match image::open(&path) {
            Ok(image) => {
                debug!("Cache hit: {} (page {})", path.display(), index + 1);
                if tx.blocking_send(Ok(PageImage { index, image })).is_err() {
                    return; // receiver dropped, stop decoding
                }
            }
            Err(e) => {
                let _ = tx.blocking_send(Err(ConvertError::CacheReadFailed {
                    path,
                    detail: e.to_string(),
                }));
                return;
            }
        }
    }
}

/// Clip a 1-indexed inclusive page range to a document of `total` pages.
///
/// `None` bounds default to the first and last page. A range that selects no
/// pages (inverted, past the end, or any range over an empty document)
/// returns `None`, which the caller turns into an empty stream, not an error.
fn clip_range(
    first_page: Option<usize>,
    last_page: Option<usize>,
    total: usize,
) -> Option<(usize, usize)> {
    let first = first_page.unwrap_or(1).max(1);
    let last = last_page.unwrap_or(total).min(total);
    (first <= last).then_some((first, last))
}

/// Blocking worker: rasterise the requested page range via pdfium, optionally
/// materialising each page into the cache directory as it is produced.
fn rasterise_worker(
    pdf_path: &Path,
    dpi: u32,
    format: PageImageFormat,
    first_page: Option<usize>,
    last_page: Option<usize>,
    cache_dir: Option<&Path>,
    tx: &mpsc::Sender<Result<PageImage, ConvertError>>,
) {
    let pdfium = Pdfium::default();

    let document = match pdfium.load_pdf_from_file(pdf_path, None) {
        Ok(doc) => doc,
        Err(e) => {
            let _ = tx.blocking_send(Err(ConvertError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("{e:?}"),
            }));
            return;
        }
    };

    let pages = document.pages();
    let total = pages.len() as usize;
    info!("PDF loaded: {} pages", total);

    let Some((first, last)) = clip_range(first_page, last_page, total) else {
        warn!(
            "Page range {:?}..={:?} selects no pages of {total}",
            first_page, last_page
        );
        return;
    };

    if let Some(dir) = cache_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            let _ = tx.blocking_send(Err(ConvertError::CacheWriteFailed {
                path: dir.to_path_buf(),
                source: e,
            }));
            return;
        }
    }

    // pdfium renders in device pixels; scale point dimensions by dpi/72.
    let scale = dpi as f32 / 72.0;

    for (index, page_idx) in ((first - 1)..last).enumerate() {
        let page_num = page_idx + 1;

        let rendered = pages
            .get(page_idx as u16)
            .and_then(|page| {
                let width = ((page.width().value * scale) as i32).max(1);
                let height = ((page.height().value * scale) as i32).max(1);
                let render_config = PdfRenderConfig::new()
                    .set_target_width(width)
                    .set_target_height(height);
                page.render_with_config(&render_config)
                    .map(|bitmap| bitmap.as_image())
            })
            .map_err(|e| ConvertError::RasterisationFailed {
                page: page_num,
                detail: format!("{e:?}"),
            });

        let image = match rendered {
            Ok(image) => match format {
                // JPEG has no alpha channel; flatten before encode/cache.
                PageImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
                PageImageFormat::Png => image,
            },
            Err(e) => {
                let _ = tx.blocking_send(Err(e));
                return;
            }
        };

        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );

        if let Some(dir) = cache_dir {
            // Zero-padded so lexicographic sort equals page order on replay.
            let file = dir.join(format!("page-{:05}.{}", page_num, format.extension()));
            if let Err(e) = image.save_with_format(&file, format.image_format()) {
                let _ = tx.blocking_send(Err(ConvertError::CacheWriteFailed {
                    path: file,
                    source: std::io::Error::other(e.to_string()),
                }));
                return;
            }
        }

        if tx.blocking_send(Ok(PageImage { index, image })).is_err() {
            return; // receiver dropped, stop rendering
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_dir_strips_extension() {
        assert_eq!(
            cache_dir_for(Path::new("/docs/report.pdf")),
            PathBuf::from("/docs/report")
        );
        assert_eq!(
            cache_dir_for(Path::new("plain.pdf")),
            PathBuf::from("plain")
        );
    }

    #[test]
    fn validate_rejects_missing_file() {
        let err = validate_input(Path::new("/definitely/not/a/real/file.pdf"));
        assert!(matches!(err, Err(ConvertError::FileNotFound { .. })));
    }

    #[test]
    fn clip_range_defaults_to_whole_document() {
        assert_eq!(clip_range(None, None, 10), Some((1, 10)));
    }

    #[test]
    fn clip_range_clamps_bounds_to_the_document() {
        assert_eq!(clip_range(Some(3), Some(99), 10), Some((3, 10)));
        assert_eq!(clip_range(Some(0), Some(5), 10), Some((1, 5)));
    }

    #[test]
    fn clip_range_rejects_inverted_bounds() {
        assert_eq!(clip_range(Some(7), Some(3), 10), None);
    }

    #[test]
    fn clip_range_rejects_range_past_the_end() {
        assert_eq!(clip_range(Some(11), None, 10), None);
        assert_eq!(clip_range(Some(11), Some(20), 10), None);
    }

    #[test]
    fn clip_range_rejects_empty_document() {
        assert_eq!(clip_range(None, None, 0), None);
        assert_eq!(clip_range(Some(1), Some(1), 0), None);
    }

    #[test]
    fn validate_rejects_wrong_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"hello world").unwrap();
        let err = validate_input(&path);
        assert!(matches!(err, Err(ConvertError::NotAPdf { magic, .. }) if &magic == b"hell"));
    }

    #[test]
    fn validate_rejects_file_shorter_than_the_magic() {
        let dir = tempfile::tempdir().unwrap();

        let empty = dir.path().join("empty.pdf");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(
            validate_input(&empty),
            Err(ConvertError::NotAPdf { .. })
        ));

        let truncated = dir.path().join("truncated.pdf");
        std::fs::write(&truncated, b"%P").unwrap();
        assert!(matches!(
            validate_input(&truncated),
            Err(ConvertError::NotAPdf { .. })
        ));
    }

    #[test]
    fn validate_accepts_pdf_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.pdf");
        std::fs::write(&path, b"%PDF-1.7\n...").unwrap();
        assert!(validate_input(&path).is_ok());
    }
}
