//! ABOUTME: Background-subtraction motion detection with a running-average model
//! ABOUTME: Preprocesses frames, differences them against the model, and sizes contours

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub mod background;
pub mod classifier;
pub mod detector;
pub mod preprocess;

pub use background::BackgroundModel;
pub use classifier::{Classification, ContourClassifier};
pub use detector::{FrameAnalysis, MotionDetector};
pub use preprocess::{Prepared, Preprocessor};

// Re-export image types for downstream crates and benchmarks
pub use image;

/// Rectangular region of interest inside the camera frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle lies fully inside a frame of the given size
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.x
            .checked_add(self.width)
            .map_or(false, |right| right <= frame_width)
            && self
                .y
                .checked_add(self.height)
                .map_or(false, |bottom| bottom <= frame_height)
    }
}

/// Configuration for motion detection
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_motion_config"))]
pub struct MotionConfig {
    /// Delta intensity above which a pixel counts as changed
    pub intensity_threshold: u8,
    /// Minimum contour area that counts as motion (inclusive)
    #[validate(range(min = 0.0))]
    pub area_threshold: f64,
    /// Gaussian kernel size, positive and odd
    #[validate(range(min = 1, max = 255))]
    pub blur_kernel: u32,
    /// Weight of the newest frame in the running average
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub update_weight: f64,
    /// Number of 3x3 dilation passes over the threshold image
    #[validate(range(max = 32))]
    pub dilate_iterations: u8,
    /// Optional crop applied before any processing
    pub roi: Option<Roi>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            intensity_threshold: 40,
            area_threshold: 300.0,
            blur_kernel: 25,
            update_weight: 0.3,
            dilate_iterations: 2,
            roi: None,
        }
    }
}

fn validate_motion_config(config: &MotionConfig) -> Result<(), ValidationError> {
    if config.blur_kernel % 2 == 0 {
        return Err(ValidationError::new("blur_kernel_must_be_odd"));
    }
    if let Some(roi) = &config.roi {
        if roi.width == 0 || roi.height == 0 {
            return Err(ValidationError::new("roi_must_be_non_empty"));
        }
    }
    Ok(())
}

impl MotionConfig {
    /// Validate and convert failures into the crate error type
    pub fn check(&self) -> lo_core::Result<()> {
        self.validate()
            .map_err(|e| lo_core::Error::Config(format!("Invalid motion config: {}", e)))
    }
}
