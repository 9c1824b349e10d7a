//! ABOUTME: Running-average background model kept at floating-point precision
//! ABOUTME: Exponentially weighted accumulation and absolute differencing against new frames

use image::{GrayImage, Luma};
use lo_core::{Error, Result};

/// Floating-point grayscale estimate of the static scene
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    pixels: Vec<f32>,
    width: u32,
    height: u32,
}

impl BackgroundModel {
    /// Seed the model from a preprocessed frame
    pub fn new(initial: &GrayImage) -> Self {
        let (width, height) = initial.dimensions();
        Self {
            pixels: initial.as_raw().iter().map(|&p| p as f32).collect(),
            width,
            height,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// Mean intensity across the model
    pub fn mean(&self) -> f32 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        self.pixels.iter().sum::<f32>() / self.pixels.len() as f32
    }

    /// `model = model * (1 - weight) + frame * weight`
    pub fn accumulate(&mut self, frame: &GrayImage, weight: f32) -> Result<()> {
        self.check_dimensions(frame)?;

        let keep = 1.0 - weight;
        for (model, &value) in self.pixels.iter_mut().zip(frame.as_raw().iter()) {
            *model = *model * keep + value as f32 * weight;
        }
        Ok(())
    }

    /// Model rounded and saturated to 8 bits
    pub fn to_gray(&self) -> GrayImage {
        let data = self
            .pixels
            .iter()
            .map(|&v| round_half_even(v).clamp(0.0, 255.0) as u8)
            .collect();
        // Length always matches width * height
        GrayImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    /// Absolute per-pixel difference between `frame` and the rounded model
    pub fn delta(&self, frame: &GrayImage) -> Result<GrayImage> {
        self.check_dimensions(frame)?;
        let rounded = self.to_gray();
        Ok(absolute_difference(frame, &rounded))
    }

    fn check_dimensions(&self, frame: &GrayImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            let (w, h) = frame.dimensions();
            return Err(Error::Config(format!(
                "Frame is {}x{} but the background model is {}x{}",
                w, h, self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Round to the nearest integer, ties to the even neighbour
pub fn round_half_even(value: f32) -> f32 {
    let rounded = value.round();
    if (value - value.trunc()).abs() == 0.5 && rounded % 2.0 != 0.0 {
        rounded - value.signum()
    } else {
        rounded
    }
}

/// Pixel-wise |a - b| for equally sized images
pub fn absolute_difference(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        let pa = a.get_pixel(x, y).0[0];
        let pb = b.get_pixel(x, y).0[0];
        Luma([pa.abs_diff(pb)])
    })
}
