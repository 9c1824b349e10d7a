//! ABOUTME: Stateless motion verdict from a delta image
//! ABOUTME: Thresholds, dilates, extracts external contours, and compares their areas

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use tracing::debug;

/// Pixel value used for "on" pixels in binary images
pub const ON: u8 = 255;

/// Result of classifying one delta image
#[derive(Debug, Clone)]
pub struct Classification {
    /// At least one external contour met the area threshold
    pub motion_detected: bool,
    /// Thresholded and dilated binary image
    pub threshold: GrayImage,
    /// External contours inspected before the verdict was reached
    pub contours_examined: usize,
    /// Largest contour area among those inspected
    pub largest_area: f64,
}

/// Threshold -> dilate -> contour area classifier
#[derive(Debug, Clone)]
pub struct ContourClassifier {
    intensity_threshold: u8,
    area_threshold: f64,
    dilate_iterations: u8,
}

impl ContourClassifier {
    pub fn new(intensity_threshold: u8, area_threshold: f64, dilate_iterations: u8) -> Self {
        Self {
            intensity_threshold,
            area_threshold,
            dilate_iterations,
        }
    }

    pub fn classify(&self, delta: &GrayImage) -> Classification {
        let binary = threshold(delta, self.intensity_threshold);
        let dilated = dilate_passes(&binary, self.dilate_iterations);

        let mut contours_examined = 0;
        let mut largest_area = 0.0f64;
        let mut motion_detected = false;

        for contour in external_contours(&dilated) {
            contours_examined += 1;
            let area = contour_area(&contour);
            largest_area = largest_area.max(area);
            if area >= self.area_threshold {
                motion_detected = true;
                break;
            }
        }

        debug!(
            contours = contours_examined,
            largest_area,
            area_threshold = self.area_threshold,
            motion = motion_detected,
            "Contour classification"
        );

        Classification {
            motion_detected,
            threshold: dilated,
            contours_examined,
            largest_area,
        }
    }
}

/// Binary threshold: strictly greater than `cutoff` becomes [`ON`]
pub fn threshold(image: &GrayImage, cutoff: u8) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        *pixel = Luma([if pixel.0[0] > cutoff { ON } else { 0 }]);
    }
    out
}

/// `passes` rounds of 3x3 square dilation
pub fn dilate_passes(image: &GrayImage, passes: u8) -> GrayImage {
    if passes == 0 {
        return image.clone();
    }
    // Repeated 3x3 dilation equals one chessboard dilation of radius `passes`
    dilate(image, Norm::LInf, passes)
}

/// Outermost contours only, ignoring anything nested inside a hole
pub fn external_contours(image: &GrayImage) -> impl Iterator<Item = Contour<i32>> {
    find_contours::<i32>(image)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
}

/// Polygon area enclosed by the contour's boundary pixel centres
pub fn contour_area(contour: &Contour<i32>) -> f64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }

    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::mask_with_block;

    fn area_of_single_block(block_width: u32, block_height: u32) -> f64 {
        let mask = mask_with_block(64, 64, 10, 10, block_width, block_height);
        let contours: Vec<_> = external_contours(&mask).collect();
        assert_eq!(contours.len(), 1);
        contour_area(&contours[0])
    }

    #[test]
    fn test_threshold_is_strictly_greater() {
        let img = GrayImage::from_raw(3, 1, vec![39, 40, 41]).unwrap();
        let out = threshold(&img, 40);
        assert_eq!(out.as_raw(), &vec![0, 0, ON]);
    }

    #[test]
    fn test_block_area_spans_pixel_centres() {
        assert_eq!(area_of_single_block(20, 20), 361.0);
        assert_eq!(area_of_single_block(16, 21), 300.0);
        assert_eq!(area_of_single_block(1, 1), 0.0);
        assert_eq!(area_of_single_block(1, 10), 0.0);
    }

    #[test]
    fn test_hole_contents_are_not_external() {
        // Ring with a filled island inside its hole
        let mut mask = mask_with_block(40, 40, 5, 5, 30, 30);
        for y in 10..30 {
            for x in 10..30 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        for y in 15..25 {
            for x in 15..25 {
                mask.put_pixel(x, y, Luma([ON]));
            }
        }
        let contours: Vec<_> = external_contours(&mask).collect();
        assert_eq!(contours.len(), 1);
        assert_eq!(contour_area(&contours[0]), 29.0 * 29.0);
    }

    #[test]
    fn test_dilation_grows_regions() {
        let mask = mask_with_block(30, 30, 10, 10, 5, 5);
        let once = dilate_passes(&mask, 1);
        let twice = dilate_passes(&mask, 2);
        let count = |img: &GrayImage| img.pixels().filter(|p| p.0[0] == ON).count();
        assert_eq!(count(&mask), 25);
        assert_eq!(count(&once), 49);
        assert_eq!(count(&twice), 81);
        assert_eq!(dilate_passes(&mask, 0).as_raw(), mask.as_raw());
    }

    #[test]
    fn test_dilation_merges_fragments() {
        let mut mask = mask_with_block(40, 40, 5, 5, 10, 10);
        for y in 5..15 {
            for x in 17..27 {
                mask.put_pixel(x, y, Luma([ON]));
            }
        }
        assert_eq!(external_contours(&mask).count(), 2);
        assert_eq!(external_contours(&dilate_passes(&mask, 1)).count(), 1);
    }

    #[test]
    fn test_empty_delta_has_no_motion() {
        let classifier = ContourClassifier::new(40, 300.0, 2);
        let result = classifier.classify(&GrayImage::new(50, 50));
        assert!(!result.motion_detected);
        assert_eq!(result.contours_examined, 0);
        assert_eq!(result.largest_area, 0.0);
        assert!(result.threshold.pixels().all(|p| p.0[0] == 0));
    }
}
