use bytes::Bytes;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, GenericImageView};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

/// Pixel budget for photos sent to the vision model.
pub const MAX_PIXELS: u64 = 2_000_000;
pub const JPEG_QUALITY: u8 = 85;

/// Result of preparing a photo for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedImage {
    /// Re-encoded JPEG within the pixel budget.
    Jpeg { bytes: Bytes, width: u32, height: u32 },
    /// The upload could not be processed and is passed through untouched.
    /// Its size is not bounded.
    Original(Bytes),
}

impl PreparedImage {
    pub fn bytes(&self) -> &Bytes {
        match self {
            PreparedImage::Jpeg { bytes, .. } | PreparedImage::Original(bytes) => bytes,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, PreparedImage::Original(_))
    }
}

/// Size that fits `max_pixels` with the same aspect ratio. Never upscales.
pub fn target_dimensions(width: u32, height: u32, max_pixels: u64) -> (u32, u32) {
    let pixels = u64::from(width) * u64::from(height);
    if pixels <= max_pixels || pixels == 0 {
        return (width, height);
    }
    let scale = (max_pixels as f64 / pixels as f64).sqrt();
    let w = ((f64::from(width) * scale).floor() as u32).max(1);
    let h = ((f64::from(height) * scale).floor() as u32).max(1);
    (w, h)
}

pub fn prepare_for_analysis(raw: Bytes) -> PreparedImage {
    prepare_with_budget(raw, MAX_PIXELS)
}

pub fn prepare_with_budget(raw: Bytes, max_pixels: u64) -> PreparedImage {
    match downsample(&raw, max_pixels) {
        Ok((bytes, width, height)) => {
            debug!(
                in_bytes = raw.len(),
                out_bytes = bytes.len(),
                width,
                height,
                "photo prepared"
            );
            PreparedImage::Jpeg {
                bytes: Bytes::from(bytes),
                width,
                height,
            }
        }
        Err(e) => {
            warn!(error = %e, bytes = raw.len(), "photo preprocessing failed; sending original");
            PreparedImage::Original(raw)
        }
    }
}

fn downsample(raw: &[u8], max_pixels: u64) -> anyhow::Result<(Vec<u8>, u32, u32)> {
    let img = image::load_from_memory(raw)?;
    let (w, h) = img.dimensions();
    let (tw, th) = target_dimensions(w, h, max_pixels);
    let img: DynamicImage = if (tw, th) == (w, h) {
        img
    } else {
        img.resize_exact(tw, th, FilterType::Lanczos3)
    };

    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(&rgb)?;
    Ok((out, rgb.width(), rgb.height()))
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Object key for an uploaded meal photo, partitioned by the meal's date:
/// `meals/YYYY/MM/DD/<uuid>.<ext>`.
pub fn photo_key(taken_at: OffsetDateTime, content_type: &str) -> String {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    format!(
        "meals/{:04}/{:02}/{:02}/{}.{}",
        taken_at.year(),
        u8::from(taken_at.month()),
        taken_at.day(),
        Uuid::new_v4(),
        ext
    )
}
