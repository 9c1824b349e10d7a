//! ABOUTME: Stateful motion detector owning the background model across frames
//! ABOUTME: Initializes the model once, then updates, differences, and classifies each frame

use crate::{
    BackgroundModel, Classification, ContourClassifier, MotionConfig, Prepared, Preprocessor,
};
use image::{GrayImage, RgbImage};
use lo_core::{Error, MonotonicTimer, Result};
use tracing::{debug, info};

/// Everything computed for one frame, including the debug images
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub motion_detected: bool,
    /// Cropped color frame
    pub color: RgbImage,
    /// Grayscale, blurred frame
    pub gray: GrayImage,
    /// |gray - model| after the model update
    pub delta: GrayImage,
    /// Thresholded and dilated delta
    pub threshold: GrayImage,
    /// Updated model rounded to 8 bits
    pub average: GrayImage,
    pub contours_examined: usize,
    pub largest_area: f64,
    pub processing_time_ms: u64,
}

/// Single owner of the running background model
pub struct MotionDetector {
    config: MotionConfig,
    preprocessor: Preprocessor,
    classifier: ContourClassifier,
    model: Option<BackgroundModel>,
}

impl MotionDetector {
    /// Create a detector; the background model is seeded by [`MotionDetector::initialize`]
    pub fn new(config: MotionConfig) -> Result<Self> {
        config.check()?;

        let preprocessor = Preprocessor::new(config.roi, config.blur_kernel);
        let classifier = ContourClassifier::new(
            config.intensity_threshold,
            config.area_threshold,
            config.dilate_iterations,
        );

        Ok(Self {
            config,
            preprocessor,
            classifier,
            model: None,
        })
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.model.is_some()
    }

    pub fn background(&self) -> Option<&BackgroundModel> {
        self.model.as_ref()
    }

    /// Seed the background model from the first valid frame
    pub fn initialize(&mut self, frame: &RgbImage) -> Result<()> {
        if self.model.is_some() {
            return Err(Error::Validation(
                "Background model is already initialized".to_string(),
            ));
        }

        let Prepared { gray, .. } = self.preprocessor.prepare(frame)?;
        let (width, height) = gray.dimensions();
        self.model = Some(BackgroundModel::new(&gray));

        info!(width, height, "Starting background model");
        Ok(())
    }

    /// Update the model with `frame`, then difference and classify it
    pub fn process(&mut self, frame: &RgbImage) -> Result<FrameAnalysis> {
        let timer = MonotonicTimer::new();

        let Prepared { color, gray } = self.preprocessor.prepare(frame)?;

        let model = self.model.as_mut().ok_or_else(|| {
            Error::Validation("Background model has not been initialized".to_string())
        })?;

        // Update first so the delta compares against smoothed history including this frame
        model.accumulate(&gray, self.config.update_weight as f32)?;
        let delta = model.delta(&gray)?;
        let average = model.to_gray();

        let Classification {
            motion_detected,
            threshold,
            contours_examined,
            largest_area,
        } = self.classifier.classify(&delta);

        let processing_time_ms = timer.elapsed().as_millis() as u64;

        debug!(
            motion = motion_detected,
            contours = contours_examined,
            largest_area,
            processing_time_ms,
            "Frame analysed"
        );

        Ok(FrameAnalysis {
            motion_detected,
            color,
            gray,
            delta,
            threshold,
            average,
            contours_examined,
            largest_area,
            processing_time_ms,
        })
    }
}
