//! Input checks applied before any upstream call

use base64::{Engine as _, engine::general_purpose::STANDARD};
use kisan_ai::ImageInput;

use crate::error::{Error, Result};

/// Largest image accepted for analysis (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// A submission needs text or an image
pub fn validate_submission(text: &str, image: Option<&ImageInput>) -> Result<()> {
    if text.trim().is_empty() && image.is_none() {
        return Err(Error::invalid_input(
            "Please type a message or upload an image.",
        ));
    }
    Ok(())
}

/// Check raw image bytes and encode them for upload
pub fn image_from_bytes(bytes: &[u8], mime_type: &str) -> Result<ImageInput> {
    if !mime_type.starts_with("image/") {
        return Err(Error::invalid_input("Please select a valid image file."));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(Error::invalid_input(
            "Image file too large. Please select a file under 10MB.",
        ));
    }
    Ok(ImageInput::new(STANDARD.encode(bytes), mime_type))
}

/// Guess an image MIME type from a file name's extension
pub fn image_mime_type(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}
