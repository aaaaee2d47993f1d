use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

use super::interface::PreparedImage;

/// Re-encode an upload as JPEG, narrowed to `max_width` (never widened).
///
/// Re-encoding only trims the payload sent onward. Bytes that do not decode
/// as an image are forwarded unchanged and the model gets to judge them.
pub fn prepare_image(bytes: &[u8], max_width: u32, quality: u8) -> PreparedImage {
    match reencode_jpeg(bytes, max_width, quality) {
        Ok(jpeg) => {
            debug!("Re-encoded upload: {} -> {} bytes", bytes.len(), jpeg.len());
            PreparedImage {
                bytes: jpeg,
                mime: "image/jpeg",
            }
        }
        Err(e) => {
            warn!("Could not re-encode upload, forwarding original: {}", e);
            PreparedImage {
                bytes: bytes.to_vec(),
                mime: sniff_mime(bytes),
            }
        }
    }
}

fn reencode_jpeg(bytes: &[u8], max_width: u32, quality: u8) -> image::ImageResult<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;
    let img = fit_width(img, max_width);
    encode_jpeg(&img, quality)
}

fn fit_width(img: DynamicImage, max_width: u32) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    if max_width == 0 || width <= max_width {
        return img;
    }
    let new_height = ((height as u64 * max_width as u64) / width as u64).max(1) as u32;
    img.resize_exact(max_width, new_height, FilterType::Lanczos3)
}

/// JPEG has no alpha channel, so everything goes through RGB8 first.
pub(crate) fn encode_jpeg(img: &DynamicImage, quality: u8) -> image::ImageResult<Vec<u8>> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;
    Ok(out)
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Bmp) => "image/bmp",
        _ => "image/jpeg",
    }
}
