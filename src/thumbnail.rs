//! JPEG thumbnails for history records.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use thiserror::Error;

use crate::constants::{THUMBNAIL_JPEG_QUALITY, THUMBNAIL_SIZE};
use crate::store::Blob;

/// Errors that can occur while creating a thumbnail.
#[derive(Error, Debug)]
pub enum ThumbnailError {
    /// Source could not be decoded or the thumbnail could not be encoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Source image has no pixels
    #[error("Image has zero width or height")]
    Empty,
}

/// Thumbnail settings.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailOptions {
    /// Longest side of the thumbnail in pixels.
    pub max_side: u32,
    pub jpeg_quality: u8,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            max_side: THUMBNAIL_SIZE,
            jpeg_quality: THUMBNAIL_JPEG_QUALITY,
        }
    }
}

/// Pixel size of an encoded image.
pub fn image_dimensions(blob: &Blob) -> Result<(u32, u32), ThumbnailError> {
    let img = image::load_from_memory(&blob.bytes)?;
    Ok(img.dimensions())
}

/// Scale an encoded image so its longest side is at most `max_side` and
/// re-encode it as JPEG. Smaller images keep their size.
pub fn make_thumbnail(blob: &Blob, options: ThumbnailOptions) -> Result<Blob, ThumbnailError> {
    let img = image::load_from_memory(&blob.bytes)?;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ThumbnailError::Empty);
    }

    let max_side = options.max_side.max(1);
    let scaled = if width.max(height) > max_side {
        img.resize(max_side, max_side, FilterType::Triangle)
    } else {
        img
    };

    let bytes = encode_jpeg(&scaled, options.jpeg_quality)?;
    log::trace!(
        "Thumbnail {}x{} -> {}x{} ({} bytes)",
        width,
        height,
        scaled.width(),
        scaled.height(),
        bytes.len()
    );
    Ok(Blob::jpeg(bytes))
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ThumbnailError> {
    let rgb = img.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(&rgb)?;
    Ok(out.into_inner())
}
