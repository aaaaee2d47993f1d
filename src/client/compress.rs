use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::vision::image_prep::encode_jpeg;

pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;
pub const MAX_DIMENSION: u32 = 800;

const START_QUALITY: u8 = 90;
const MIN_QUALITY: u8 = 30;
const QUALITY_STEP: u8 = 10;
const MIN_DIMENSION: u32 = 64;

#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Could not decode image: {0}")]
    Decode(image::ImageError),
    #[error("Could not encode image: {0}")]
    Encode(image::ImageError),
    #[error("Image cannot be compressed below {limit} bytes")]
    TooLarge { limit: usize },
    #[error("Compression task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Upload-ready JPEG plus what the preview line reports
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub original_width: u32,
    pub original_height: u32,
    pub original_bytes: usize,
    pub quality: u8,
}

/// Size and dimension bounds applied before upload
#[derive(Debug, Clone, Copy)]
pub struct CompressionOptions {
    pub max_bytes: usize,
    pub max_dimension: u32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            max_dimension: MAX_DIMENSION,
        }
    }
}

fn is_supported(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP | ImageFormat::Bmp
    )
}

/// Shrink an image until it fits `options`: longest side first, then JPEG
/// quality, then dimensions again.
pub fn compress_image(
    bytes: &[u8],
    options: CompressionOptions,
) -> Result<CompressedImage, CompressionError> {
    let format = image::guess_format(bytes).map_err(|_| CompressionError::UnsupportedFormat)?;
    if !is_supported(format) {
        return Err(CompressionError::UnsupportedFormat);
    }
    let original = image::load_from_memory_with_format(bytes, format)
        .map_err(CompressionError::Decode)?;
    let (original_width, original_height) = (original.width(), original.height());

    let mut img = fit_longest_side(original, options.max_dimension);
    loop {
        let mut quality = START_QUALITY;
        loop {
            let jpeg = encode_jpeg(&img, quality).map_err(CompressionError::Encode)?;
            debug!(
                "Compressed to {}x{} at quality {}: {} bytes",
                img.width(),
                img.height(),
                quality,
                jpeg.len()
            );
            if jpeg.len() <= options.max_bytes {
                return Ok(CompressedImage {
                    bytes: jpeg,
                    width: img.width(),
                    height: img.height(),
                    original_width,
                    original_height,
                    original_bytes: bytes.len(),
                    quality,
                });
            }
            if quality <= MIN_QUALITY {
                break;
            }
            quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
        }

        let longest = img.width().max(img.height());
        if longest / 2 < MIN_DIMENSION {
            return Err(CompressionError::TooLarge {
                limit: options.max_bytes,
            });
        }
        img = fit_longest_side(img, longest / 2);
    }
}

/// Off-runtime wrapper; the caller awaits this before building the upload.
pub async fn compress(
    bytes: Vec<u8>,
    options: CompressionOptions,
) -> Result<CompressedImage, CompressionError> {
    tokio::task::spawn_blocking(move || compress_image(&bytes, options)).await?
}

fn fit_longest_side(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    if img.width().max(img.height()) <= max_dimension {
        return img;
    }
    img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
}
