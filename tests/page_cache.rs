//! Page-cache tests: replaying pre-rendered page images from disk.
//!
//! Every test seeds the cache directory by hand and puts a `%PDF` stub next
//! to it, so pdfium is never invoked and the tests run without a native
//! library install.

use futures::StreamExt;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use pagemd::{cache_dir_for, open_pages, ConversionConfig, ConvertError, PageImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

fn page_color(n: u8) -> Rgba<u8> {
    let r = n.wrapping_mul(40);
    Rgba([r, 255 - r, n.wrapping_mul(10), 255])
}

/// Create `doc.pdf` (magic bytes only) plus a cache directory holding
/// `count` distinct PNG pages, written in shuffled order.
fn seed_cached_document(dir: &Path, count: u8) -> PathBuf {
    let pdf = dir.join("doc.pdf");
    std::fs::write(&pdf, b"%PDF-1.7\nstub").unwrap();

    let cache = cache_dir_for(&pdf);
    std::fs::create_dir(&cache).unwrap();

    let mut order: Vec<u8> = (1..=count).collect();
    order.reverse();
    for n in order {
        let img = RgbaImage::from_pixel(6, 6, page_color(n));
        img.save_with_format(cache.join(format!("page-{n:05}.png")), ImageFormat::Png)
            .unwrap();
    }
    pdf
}

fn cached_config() -> ConversionConfig {
    ConversionConfig::builder()
        .cache_pages(true)
        .concurrency(2)
        .build()
        .unwrap()
}

async fn collect_pages(pdf: &Path, config: &ConversionConfig) -> Vec<PageImage> {
    let stream = open_pages(pdf, config).unwrap();
    let items: Vec<Result<PageImage, ConvertError>> = stream.collect().await;
    items.into_iter().collect::<Result<_, _>>().unwrap()
}

fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[tokio::test]
async fn cache_replay_yields_pages_in_file_name_order() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = seed_cached_document(dir.path(), 3);

    let pages = collect_pages(&pdf, &cached_config()).await;

    assert_eq!(pages.len(), 3);
    for (i, page) in pages.iter().enumerate() {
        assert_eq!(page.index, i);
        let expected = page_color(i as u8 + 1);
        assert_eq!(page.image.to_rgba8().get_pixel(0, 0), &expected);
    }
}

#[tokio::test]
async fn cache_replay_is_idempotent_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = seed_cached_document(dir.path(), 4);
    let config = cached_config();

    let first: Vec<Vec<u8>> = collect_pages(&pdf, &config)
        .await
        .iter()
        .map(|p| png_bytes(&p.image))
        .collect();
    let second: Vec<Vec<u8>> = collect_pages(&pdf, &config)
        .await
        .iter()
        .map(|p| png_bytes(&p.image))
        .collect();

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
}

#[tokio::test]
async fn cache_replay_ignores_foreign_file_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = seed_cached_document(dir.path(), 2);

    let cache = cache_dir_for(&pdf);
    std::fs::write(cache.join("notes.txt"), "not a page").unwrap();
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 6, page_color(9)))
        .to_rgb8()
        .save_with_format(cache.join("page-99999.jpg"), ImageFormat::Jpeg)
        .unwrap();

    let pages = collect_pages(&pdf, &cached_config()).await;
    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn undecodable_cache_file_surfaces_a_cache_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = seed_cached_document(dir.path(), 2);

    let cache = cache_dir_for(&pdf);
    std::fs::write(cache.join("page-00000.png"), b"garbage").unwrap();

    let stream = open_pages(&pdf, &cached_config()).unwrap();
    let items: Vec<Result<PageImage, ConvertError>> = stream.collect().await;
    let err = items.into_iter().collect::<Result<Vec<_>, _>>();
    assert!(matches!(err, Err(ConvertError::CacheReadFailed { .. })));
}

#[tokio::test]
async fn missing_input_fails_before_the_stream_starts() {
    let dir = tempfile::tempdir().unwrap();
    let err = open_pages(&dir.path().join("absent.pdf"), &cached_config());
    assert!(matches!(err, Err(ConvertError::FileNotFound { .. })));
}

#[tokio::test]
async fn non_pdf_input_fails_before_the_stream_starts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readme.pdf");
    std::fs::write(&path, b"plain text, no pdf header").unwrap();

    let err = open_pages(&path, &cached_config());
    assert!(matches!(err, Err(ConvertError::NotAPdf { .. })));
}
