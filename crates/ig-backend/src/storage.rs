use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use image::codecs::jpeg::JpegEncoder;

pub const THUMBNAIL_SIZE: u32 = 320;
const THUMBNAIL_QUALITY: u8 = 85;

/// Result of the content check run on every generated image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyVerdict {
    pub nsfw: bool,
    pub score: f32,
}

pub fn save_image_bytes(dir: &Path, file_name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Write a JPEG thumbnail that fits in `THUMBNAIL_SIZE` square, keeping the
/// aspect ratio. Images already inside the bounds are never enlarged.
pub fn make_thumbnail(thumbs_dir: &Path, file_name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    let img = image::load_from_memory(bytes)?;
    let thumb = if img.width() <= THUMBNAIL_SIZE && img.height() <= THUMBNAIL_SIZE {
        img.to_rgb8()
    } else {
        img.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE).to_rgb8()
    };

    let path = thumbs_dir.join(file_name);
    let writer = BufWriter::new(File::create(&path)?);
    thumb.write_with_encoder(JpegEncoder::new_with_quality(writer, THUMBNAIL_QUALITY))?;

    Ok(path)
}

/// Placeholder content check; everything passes.
// TODO: plug in an NSFW classifier and fail jobs whose images are flagged.
pub fn safety_check(_bytes: &[u8]) -> SafetyVerdict {
    SafetyVerdict { nsfw: false, score: 0.0 }
}
