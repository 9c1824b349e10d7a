//! ABOUTME: Artifact roles, the `{timestamp}_{role}.jpeg` naming convention, and JPEG encoding
//! ABOUTME: Writer that encodes images and hands them to an artifact store

use crate::{ArtifactStore, StorageError, StoredArtifact};
use bytes::Bytes;
use image::{codecs::jpeg::JpegEncoder, DynamicImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

/// File extension shared by every artifact
pub const ARTIFACT_EXTENSION: &str = "jpeg";

/// What an artifact depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactRole {
    /// Cropped color frame, written on motion
    Color,
    /// Grayscale blurred frame
    Gray,
    /// Absolute difference against the background
    Delta,
    /// Thresholded, dilated delta
    Thresh,
    /// Running background average
    Average,
}

impl ArtifactRole {
    pub const ALL: [ArtifactRole; 5] = [
        ArtifactRole::Color,
        ArtifactRole::Gray,
        ArtifactRole::Delta,
        ArtifactRole::Thresh,
        ArtifactRole::Average,
    ];

    /// Debug artifacts controlled by the debug level
    pub const AUXILIARY: [ArtifactRole; 4] = [
        ArtifactRole::Gray,
        ArtifactRole::Delta,
        ArtifactRole::Thresh,
        ArtifactRole::Average,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactRole::Color => "color",
            ArtifactRole::Gray => "gray",
            ArtifactRole::Delta => "delta",
            ArtifactRole::Thresh => "thresh",
            ArtifactRole::Average => "average",
        }
    }
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{timestamp}_{role}.jpeg`
pub fn artifact_file_name(timestamp: &str, role: ArtifactRole) -> String {
    format!("{}_{}.{}", timestamp, role.as_str(), ARTIFACT_EXTENSION)
}

/// Encode an image as JPEG bytes
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Bytes, StorageError> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    image.write_with_encoder(encoder)?;
    Ok(Bytes::from(buffer))
}

/// Encodes images and writes them under artifact names
pub struct ArtifactWriter<S> {
    store: S,
    quality: u8,
}

impl<S> ArtifactWriter<S>
where
    S: ArtifactStore,
{
    pub fn new(store: S, quality: u8) -> Self {
        Self { store, quality }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encode and persist one artifact immediately
    #[instrument(skip(self, image), fields(role = %role))]
    pub async fn write(
        &self,
        timestamp: &str,
        role: ArtifactRole,
        image: &DynamicImage,
    ) -> Result<StoredArtifact, StorageError> {
        let name = artifact_file_name(timestamp, role);
        let data = encode_jpeg(image, self.quality)?;
        let stored = self.store.write(&name, data).await?;
        debug!(name = %stored.name, size = stored.size, "Artifact written");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage};

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name("20240309-23-59-01.123456", ArtifactRole::Color),
            "20240309-23-59-01.123456_color.jpeg"
        );
        assert_eq!(
            artifact_file_name("20240309-23-59-01.123456", ArtifactRole::Thresh),
            "20240309-23-59-01.123456_thresh.jpeg"
        );
    }

    #[test]
    fn test_role_names() {
        let names: Vec<_> = ArtifactRole::ALL.iter().map(|r| r.to_string()).collect();
        assert_eq!(names, vec!["color", "gray", "delta", "thresh", "average"]);
        assert!(!ArtifactRole::AUXILIARY.contains(&ArtifactRole::Color));
    }

    #[test]
    fn test_encode_jpeg_color_and_gray() {
        let color = DynamicImage::ImageRgb8(RgbImage::new(16, 16));
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, Luma([128])));

        for img in [color, gray] {
            let bytes = encode_jpeg(&img, 90).unwrap();
            // JPEG SOI marker
            assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (16, 16));
        }
    }
}
