//! Image encoding: `PageImage` → base64 data URL.
//!
//! Multimodal chat APIs accept images as base64 data URLs embedded in the
//! JSON request body, tagged with the image's media type. The raster format
//! matches the page source's configured format, so a cached PNG and a fresh
//! render of the same page encode to the same payload.

use crate::config::PageImageFormat;
use crate::error::ConvertError;
use crate::pipeline::source::PageImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// One page, encoded and ready for the transcription request.
pub struct EncodedPage {
    /// Ordinal position of the page in the output sequence (0-based).
    pub index: usize,
    /// `data:<media-type>;base64,<payload>` URL carrying the page raster.
    pub data_url: String,
}

/// Encode a rasterised page as a base64 data URL.
pub fn encode_page(page: &PageImage, format: PageImageFormat) -> Result<EncodedPage, ConvertError> {
    let mut buf = Vec::new();

    let result = match format {
        PageImageFormat::Png => page.image.write_to(&mut Cursor::new(&mut buf), format.image_format()),
        // JPEG encoders reject alpha channels; flatten first.
        PageImageFormat::Jpeg => DynamicImage::ImageRgb8(page.image.to_rgb8())
            .write_to(&mut Cursor::new(&mut buf), format.image_format()),
    };
    result.map_err(|e| ConvertError::EncodeFailed {
        page: page.index + 1,
        detail: e.to_string(),
    })?;

    let data_url = format!("data:{};base64,{}", format.media_type(), STANDARD.encode(&buf));
    debug!("Encoded page {} → {} bytes base64", page.index + 1, data_url.len());

    Ok(EncodedPage {
        index: page.index,
        data_url,
    })
}
