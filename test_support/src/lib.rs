//! ABOUTME: Shared testing utilities and helper functions
//! ABOUTME: Synthetic frames and scratch directories for all crates

use image::{GrayImage, Luma, Rgb, RgbImage};
use std::path::Path;

/// Background intensity used by the synthetic scenes
pub const BACKGROUND_LEVEL: u8 = 64;

/// Fresh scratch directory, removed when the guard drops
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("lookout-")
        .tempdir()
        .expect("failed to create scratch dir")
}

/// Uniform color frame
pub fn uniform_frame(width: u32, height: u32, level: u8) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([level, level, level]))
}

/// Uniform frame with a solid square block painted at (x, y)
pub fn frame_with_block(
    width: u32,
    height: u32,
    background: u8,
    x: u32,
    y: u32,
    block_width: u32,
    block_height: u32,
    intensity: u8,
) -> RgbImage {
    let mut img = uniform_frame(width, height, background);
    for py in y..(y + block_height).min(height) {
        for px in x..(x + block_width).min(width) {
            img.put_pixel(px, py, Rgb([intensity, intensity, intensity]));
        }
    }
    img
}

/// Binary mask with one "on" rectangle, as produced by thresholding
pub fn mask_with_block(
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    block_width: u32,
    block_height: u32,
) -> GrayImage {
    let mut img = GrayImage::from_pixel(width, height, Luma([0u8]));
    for py in y..(y + block_height).min(height) {
        for px in x..(x + block_width).min(width) {
            img.put_pixel(px, py, Luma([255u8]));
        }
    }
    img
}

/// Create `count` placeholder files in `dir`
pub fn fill_dir(dir: &Path, count: usize) {
    for i in 0..count {
        std::fs::write(dir.join(format!("existing_{:05}.jpeg", i)), b"x")
            .expect("failed to write placeholder");
    }
}

/// Number of entries in `dir` whose name ends with `suffix`
pub fn count_with_suffix(dir: &Path, suffix: &str) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
                .count()
        })
        .unwrap_or(0)
}
