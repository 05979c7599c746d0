use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageReader};
use log::{debug, error};
use thiserror::Error;

use crate::sampler::{Palette, Sampler};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no image data")]
    Empty,
    #[error("{0:?} is not an image type")]
    NotAnImage(String),
    #[error("image has zero area ({width}x{height})")]
    ZeroArea { width: u32, height: u32 },
    #[error("unable to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("decode task failed: {0}")]
    Task(String),
}

/// Browsers hand us a MIME type for dropped or picked files; anything under
/// `image/` is let through and the decoder decides the rest.
pub fn is_image_mime(mime: &str) -> bool {
    mime.get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Map a file extension to the MIME hint a file picker would report.
pub fn mime_from_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        _ => return None,
    };
    Some(mime)
}

/// MIME type of the image format recognised from the leading bytes, if any.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|format| format.to_mime_type())
}

/// Prefer the extension's hint; files without a recognised one are sniffed.
pub fn resolve_mime(ext: Option<&str>, bytes: &[u8]) -> Option<&'static str> {
    ext.and_then(mime_from_extension).or_else(|| sniff_mime(bytes))
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroArea { width, height });
    }
    debug!("decoded {} bytes into {width}x{height} {:?}", bytes.len(), img.color());
    Ok(img)
}

pub fn extract_from_bytes(bytes: &[u8]) -> Result<Palette, DecodeError> {
    extract_from_bytes_with(Sampler::default(), bytes)
}

pub fn extract_from_bytes_with(sampler: Sampler, bytes: &[u8]) -> Result<Palette, DecodeError> {
    let img = decode_image(bytes).inspect_err(|e| error!("{e}"))?;
    Ok(sampler.extract(&img))
}

/// Decode on tokio's blocking pool so the caller can await the result
/// instead of stalling its own task.
#[cfg(feature = "native-bin")]
pub async fn decode_task<B>(bytes: B) -> Result<DynamicImage, DecodeError>
where
    B: AsRef<[u8]> + Send + 'static,
{
    tokio::task::spawn_blocking(move || decode_image(bytes.as_ref()))
        .await
        .map_err(|e| DecodeError::Task(e.to_string()))?
}
