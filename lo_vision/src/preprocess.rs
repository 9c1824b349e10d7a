//! ABOUTME: Frame preprocessing shared by model initialization and per-frame analysis
//! ABOUTME: Crops to the region of interest, converts to grayscale, and applies Gaussian smoothing

use crate::background::round_half_even;
use crate::Roi;
use image::{imageops, GrayImage, Luma, Rgb, RgbImage};
use imageproc::definitions::Image;
use imageproc::filter::separable_filter_equal;
use imageproc::map::map_colors;
use lo_core::{Error, Result};
use tracing::debug;

/// Fixed-point BT.601 luma weights (R, G, B), scaled by 2^14
const LUMA_WEIGHTS: [u32; 3] = [4899, 9617, 1868];
const LUMA_SHIFT: u32 = 14;

/// Binomial kernels used for the small odd sizes
const SMALL_KERNELS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

/// Output of preprocessing a raw frame
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Cropped color frame, kept for persistence
    pub color: RgbImage,
    /// Cropped, grayscale, blurred frame used for differencing
    pub gray: GrayImage,
}

/// Pure crop -> grayscale -> blur transformation
#[derive(Debug, Clone)]
pub struct Preprocessor {
    roi: Option<Roi>,
    kernel: u32,
}

impl Preprocessor {
    /// `kernel` must be odd; configuration validation enforces this
    pub fn new(roi: Option<Roi>, kernel: u32) -> Self {
        Self { roi, kernel }
    }

    pub fn roi(&self) -> Option<Roi> {
        self.roi
    }

    pub fn kernel(&self) -> u32 {
        self.kernel
    }

    /// Crop, grayscale, and blur a raw frame
    pub fn prepare(&self, frame: &RgbImage) -> Result<Prepared> {
        let color = self.crop(frame)?;
        let gray = self.smooth(&to_luma(&color));
        Ok(Prepared { color, gray })
    }

    fn crop(&self, frame: &RgbImage) -> Result<RgbImage> {
        let Some(roi) = self.roi else {
            return Ok(frame.clone());
        };

        let (width, height) = frame.dimensions();
        if !roi.fits_within(width, height) {
            return Err(Error::Config(format!(
                "Region of interest {}x{}+{}+{} does not fit in {}x{} frame",
                roi.width, roi.height, roi.x, roi.y, width, height
            )));
        }

        Ok(imageops::crop_imm(frame, roi.x, roi.y, roi.width, roi.height).to_image())
    }

    fn smooth(&self, gray: &GrayImage) -> GrayImage {
        // A 1x1 kernel is the identity
        if self.kernel <= 1 {
            return gray.clone();
        }

        let kernel = gaussian_kernel(self.kernel);
        debug!(
            kernel = self.kernel,
            sigma = gaussian_sigma(self.kernel),
            "Applying Gaussian blur"
        );

        // Filter in f32 so the final rounding is ours rather than a truncation
        let float: Image<Luma<f32>> = map_colors(gray, |p: Luma<u8>| Luma([f32::from(p.0[0])]));
        let blurred = separable_filter_equal(&float, &kernel);
        map_colors(&blurred, |p: Luma<f32>| {
            Luma([round_half_even(p.0[0]).clamp(0.0, 255.0) as u8])
        })
    }
}

/// BT.601 luma of one pixel, `0.299 R + 0.587 G + 0.114 B` in fixed point
pub fn luma(pixel: Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    let weighted = u32::from(r) * LUMA_WEIGHTS[0]
        + u32::from(g) * LUMA_WEIGHTS[1]
        + u32::from(b) * LUMA_WEIGHTS[2];
    ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

/// Convert a color frame to single-channel BT.601 luma
pub fn to_luma(color: &RgbImage) -> GrayImage {
    map_colors(color, |p: Rgb<u8>| Luma([luma(p)]))
}

/// Normalized 1-D Gaussian of exactly `size` taps
///
/// Sizes 1, 3, 5 and 7 use binomial weights; larger sizes sample a Gaussian
/// with the sigma from [`gaussian_sigma`].
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    if size % 2 == 1 && size <= 7 {
        return SMALL_KERNELS[(size / 2) as usize].to_vec();
    }

    let sigma = f64::from(gaussian_sigma(size));
    let center = (f64::from(size) - 1.0) * 0.5;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let x = f64::from(i) - center;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / sum) as f32).collect()
}

/// Sigma implied by a kernel size when no explicit sigma is given
pub fn gaussian_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}
