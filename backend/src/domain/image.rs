//! Uploaded recipe images.
//!
//! An upload is accepted only when its bytes decode as an image in a format
//! guessed from the content. The bytes are stored unchanged; the detected
//! format only picks the file extension.

use image::ImageFormat;
use uuid::Uuid;

/// Directory, relative to the media root, holding recipe images.
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

/// Reasons an upload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageValidationError {
    #[error("image payload is empty")]
    Empty,
    #[error("upload a valid image; the file is not a recognised image format")]
    UnknownFormat,
    #[error("upload a valid image; the file could not be decoded: {message}")]
    Undecodable { message: String },
}

/// Decoded-and-verified image upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    bytes: Vec<u8>,
    extension: &'static str,
}

impl ImageUpload {
    /// Verify that `bytes` decode as an image.
    ///
    /// Decoding is CPU bound; async callers should run this on a blocking
    /// thread.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, ImageValidationError> {
        if bytes.is_empty() {
            return Err(ImageValidationError::Empty);
        }
        let format =
            image::guess_format(&bytes).map_err(|_| ImageValidationError::UnknownFormat)?;
        image::load_from_memory_with_format(&bytes, format).map_err(|error| {
            ImageValidationError::Undecodable {
                message: error.to_string(),
            }
        })?;
        Ok(Self {
            bytes,
            extension: extension_for(format),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// File extension matching the detected format.
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// Fresh, collision-free media path for this upload.
    pub fn storage_path(&self) -> String {
        format!("{RECIPE_IMAGE_DIR}/{}.{}", Uuid::new_v4(), self.extension)
    }
}

fn extension_for(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("img")
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ImageFormat::Png, "png")]
    #[case(ImageFormat::Jpeg, "jpg")]
    #[case(ImageFormat::Bmp, "bmp")]
    fn decodes_supported_formats(#[case] format: ImageFormat, #[case] extension: &str) {
        let upload = ImageUpload::decode(test_images::encoded(format)).expect("valid image");
        assert_eq!(upload.extension(), extension);
        let path = upload.storage_path();
        assert!(path.starts_with("uploads/recipe/"));
        assert!(path.ends_with(&format!(".{extension}")));
    }

    #[rstest]
    fn rejects_empty_payload() {
        assert_eq!(ImageUpload::decode(Vec::new()), Err(ImageValidationError::Empty));
    }

    #[rstest]
    fn rejects_non_image_bytes() {
        assert_eq!(
            ImageUpload::decode(b"notimage".to_vec()),
            Err(ImageValidationError::UnknownFormat)
        );
    }

    #[rstest]
    fn rejects_truncated_image() {
        let mut bytes = test_images::png();
        bytes.truncate(24);
        let err = ImageUpload::decode(bytes).expect_err("truncated image");
        assert!(matches!(err, ImageValidationError::Undecodable { .. }));
    }

    #[rstest]
    fn keeps_original_bytes() {
        let bytes = test_images::png();
        let upload = ImageUpload::decode(bytes.clone()).expect("valid image");
        assert_eq!(upload.bytes(), bytes.as_slice());
    }

    #[rstest]
    fn storage_paths_are_unique() {
        let upload = ImageUpload::decode(test_images::png()).expect("valid image");
        assert_ne!(upload.storage_path(), upload.storage_path());
    }
}
