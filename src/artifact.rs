//! The decoded image handed back to callers.

use std::{io::Cursor, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};
use serde::Serialize;

use crate::error::InferenceError;

/// Fixed filename used when a caller saves the result to disk.
pub const DEFAULT_OUTPUT_FILE: &str = "generated_image.png";

#[derive(Debug, Clone, Serialize)]
pub struct GenerationMetadata {
    pub model: String,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    pub elapsed_ms: u128,
}

/// A decoded raster image. Content is not validated beyond decoding.
#[derive(Debug, Clone)]
#[must_use = "generated image should be displayed or saved"]
pub struct GeneratedImage {
    image: DynamicImage,
    source_format: ImageFormat,
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Decodes the raw bytes returned by the inference service.
    pub fn decode(bytes: &[u8], metadata: GenerationMetadata) -> Result<Self, InferenceError> {
        if bytes.is_empty() {
            return Err(InferenceError::Decode("empty response body".into()));
        }
        let source_format =
            image::guess_format(bytes).map_err(|e| InferenceError::Decode(e.to_string()))?;
        let image = image::load_from_memory_with_format(bytes, source_format)
            .map_err(|e| InferenceError::Decode(e.to_string()))?;

        Ok(Self {
            image,
            source_format,
            metadata,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn source_format(&self) -> ImageFormat {
        self.source_format
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Re-encodes the image as PNG, the download format.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buffer = Cursor::new(Vec::new());
        self.image.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    pub fn to_data_url(&self) -> Result<String, image::ImageError> {
        let png = self.to_png_bytes()?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        self.image.save_with_format(path, ImageFormat::Png)
    }
}
