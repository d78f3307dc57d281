//! Decoding of user-supplied image attachments.
//!
//! Only PNG and JPEG are accepted. The format is sniffed from the bytes
//! rather than trusted from a file name, then the buffer is fully decoded so
//! that truncated or corrupt data is rejected before it reaches the API.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::core::message::{ImageFormat, ImagePart};

/// One attachment in a submission could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDecodeError {
    /// Position of the failing buffer within the submission.
    pub index: usize,
    pub reason: String,
}

impl fmt::Display for ImageDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image {} skipped: {}", self.index + 1, self.reason)
    }
}

impl Error for ImageDecodeError {}

fn allowed_format(bytes: &[u8]) -> Result<ImageFormat, String> {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => Ok(ImageFormat::Png),
        Ok(image::ImageFormat::Jpeg) => Ok(ImageFormat::Jpeg),
        Ok(other) => Err(format!(
            "unsupported format {other:?} (only PNG and JPEG are accepted)"
        )),
        Err(_) => Err("unrecognized image data (only PNG and JPEG are accepted)".to_string()),
    }
}

pub fn decode_image(index: usize, bytes: &[u8]) -> Result<ImagePart, ImageDecodeError> {
    let format = allowed_format(bytes).map_err(|reason| ImageDecodeError { index, reason })?;

    let codec = match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
    };
    let bitmap =
        image::load_from_memory_with_format(bytes, codec).map_err(|err| ImageDecodeError {
            index,
            reason: err.to_string(),
        })?;

    Ok(ImagePart {
        format,
        bitmap: Arc::new(bitmap),
        source: Arc::from(bytes),
    })
}
