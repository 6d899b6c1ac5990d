//! Per-region marker fitting: first-moment centroid and max-distance radius.
//!
//! The radius is the largest distance from the centroid to any pixel centre
//! of the region, i.e. the half-diagonal of the square footprint rather than
//! an area-equivalent size.

use crate::segment::RegionLabels;
use crate::{Marker, Point};

/// Errors raised by marker fitting.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// The referenced region has no foreground pixels.
    DegenerateRegion { region_id: u32 },
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateRegion { region_id } => {
                write!(f, "region {} has no pixels", region_id)
            }
        }
    }
}

impl std::error::Error for FitError {}

#[derive(Debug, Clone, Copy, Default)]
struct MomentAccumulator {
    n: u64,
    sum_x: f64,
    sum_y: f64,
}

impl MomentAccumulator {
    #[inline]
    fn add(&mut self, x: u32, y: u32) {
        self.n += 1;
        self.sum_x += x as f64;
        self.sum_y += y as f64;
    }

    fn centroid(&self) -> Option<Point> {
        (self.n > 0).then(|| Point::new(self.sum_x / self.n as f64, self.sum_y / self.n as f64))
    }
}

/// Fit one region. Independent of every other region in the grid.
pub fn fit_region(labels: &RegionLabels, region_id: u32) -> Result<Marker, FitError> {
    let img = labels.as_image();
    let mut acc = MomentAccumulator::default();
    if region_id != 0 {
        for (x, y, px) in img.enumerate_pixels() {
            if px[0] == region_id {
                acc.add(x, y);
            }
        }
    }
    let c = acc
        .centroid()
        .ok_or(FitError::DegenerateRegion { region_id })?;

    let mut max_d2 = 0.0f64;
    for (x, y, px) in img.enumerate_pixels() {
        if px[0] == region_id {
            let dx = x as f64 - c.x;
            let dy = y as f64 - c.y;
            max_d2 = max_d2.max(dx * dx + dy * dy);
        }
    }
    Ok(Marker::new(c, max_d2.sqrt()))
}

/// Fit every region of `labels`, in region id order.
///
/// Equivalent to calling [`fit_region`] for ids `1..=count` but does two
/// passes over the grid in total instead of two per region.
pub fn fit_markers(labels: &RegionLabels) -> Result<Vec<Marker>, FitError> {
    let img = labels.as_image();
    let n = labels.count() as usize;
    let mut moments = vec![MomentAccumulator::default(); n + 1];
    for (x, y, px) in img.enumerate_pixels() {
        let id = px[0] as usize;
        if id != 0 {
            moments[id].add(x, y);
        }
    }

    let centroids = moments[1..]
        .iter()
        .enumerate()
        .map(|(i, m)| {
            m.centroid().ok_or(FitError::DegenerateRegion {
                region_id: i as u32 + 1,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut max_d2 = vec![0.0f64; n];
    for (x, y, px) in img.enumerate_pixels() {
        let id = px[0] as usize;
        if id != 0 {
            let c = centroids[id - 1];
            let dx = x as f64 - c.x;
            let dy = y as f64 - c.y;
            let d2 = dx * dx + dy * dy;
            if d2 > max_d2[id - 1] {
                max_d2[id - 1] = d2;
            }
        }
    }

    let markers: Vec<Marker> = centroids
        .into_iter()
        .zip(max_d2)
        .map(|(c, d2)| Marker::new(c, d2.sqrt()))
        .collect();

    let n_point = markers.iter().filter(|m| m.radius == 0.0).count();
    if n_point > 0 {
        tracing::warn!("{} single-pixel regions fitted with zero radius", n_point);
    }
    tracing::info!("fitted {} markers", markers.len());
    Ok(markers)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use image::ImageBuffer;

    use super::*;
    use crate::segment::{segment, SegmentConfig};
    use crate::test_utils::{covered_pixels, draw_squares, SquareSpec};

    fn expected_fit(pixels: &[[f64; 2]]) -> (Point, f64) {
        let n = pixels.len() as f64;
        let cx = pixels.iter().map(|p| p[0]).sum::<f64>() / n;
        let cy = pixels.iter().map(|p| p[1]).sum::<f64>() / n;
        let r = pixels
            .iter()
            .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
            .fold(0.0, f64::max);
        (Point::new(cx, cy), r)
    }

    #[test]
    fn axis_aligned_square_recovers_center_and_half_diagonal() {
        let sq = SquareSpec::axis_aligned(12.0, 15.0, 4.0);
        let img = draw_squares(32, 32, &[sq], false);
        let labels = segment(&img, &SegmentConfig::default()).unwrap();
        let m = fit_region(&labels, 1).unwrap();
        assert_abs_diff_eq!(m.position.x, 12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.position.y, 15.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.radius, 4.0 * 2f64.sqrt(), epsilon = 1e-12);
        assert_eq!(m.orientation, None);
    }

    #[test]
    fn rotated_squares_match_pixel_moments() {
        let (w, h) = (80, 60);
        let squares = [
            SquareSpec::rotated(15.3, 14.1, 5.0, 0.3),
            SquareSpec::rotated(50.7, 18.4, 6.5, -0.7),
            SquareSpec::rotated(30.2, 44.9, 4.2, 1.1),
        ];
        let img = draw_squares(w, h, &squares, false);
        let labels = segment(&img, &SegmentConfig::default()).unwrap();
        assert_eq!(labels.count(), 3);
        let markers = fit_markers(&labels).unwrap();

        for sq in &squares {
            let (c, r) = expected_fit(&covered_pixels(w, h, sq));
            let m = markers
                .iter()
                .find(|m| (m.position.x - c.x).abs() < 1e-9 && (m.position.y - c.y).abs() < 1e-9)
                .expect("fitted marker for square");
            assert_abs_diff_eq!(m.radius, r, epsilon = 1e-9);
            // Within the true half-diagonal plus one pixel of sampling slack.
            assert!(m.radius <= sq.half_side * 2f64.sqrt() + 1.0);
            assert!((m.position.x - sq.center[0]).abs() < 0.5);
            assert!((m.position.y - sq.center[1]).abs() < 0.5);
        }
    }

    #[test]
    fn batch_fit_matches_per_region_fit() {
        let squares = [
            SquareSpec::axis_aligned(10.0, 10.0, 3.0),
            SquareSpec::rotated(30.0, 12.0, 4.0, 0.5),
            SquareSpec::axis_aligned(20.0, 30.0, 2.0),
        ];
        let img = draw_squares(48, 40, &squares, false);
        let labels = segment(&img, &SegmentConfig::default()).unwrap();
        let batch = fit_markers(&labels).unwrap();
        for id in labels.region_ids() {
            let single = fit_region(&labels, id).unwrap();
            let b = &batch[id as usize - 1];
            assert_abs_diff_eq!(single.position.x, b.position.x, epsilon = 1e-12);
            assert_abs_diff_eq!(single.position.y, b.position.y, epsilon = 1e-12);
            assert_abs_diff_eq!(single.radius, b.radius, epsilon = 1e-12);
        }
    }

    #[test]
    fn single_pixel_region_has_zero_radius() {
        let mut raw = vec![0u32; 25];
        raw[2 * 5 + 3] = 1;
        let labels = RegionLabels::from_label_image(ImageBuffer::from_raw(5, 5, raw).unwrap());
        let m = fit_region(&labels, 1).unwrap();
        assert_eq!(m.position, Point::new(3.0, 2.0));
        assert_eq!(m.radius, 0.0);
    }

    #[test]
    fn missing_region_is_degenerate() {
        // Label 1 absent, label 2 present.
        let mut raw = vec![0u32; 9];
        raw[4] = 2;
        let labels = RegionLabels::from_label_image(ImageBuffer::from_raw(3, 3, raw).unwrap());
        assert_eq!(
            fit_region(&labels, 1).unwrap_err(),
            FitError::DegenerateRegion { region_id: 1 }
        );
        assert_eq!(
            fit_markers(&labels).unwrap_err(),
            FitError::DegenerateRegion { region_id: 1 }
        );
        assert_eq!(
            fit_region(&labels, 0).unwrap_err(),
            FitError::DegenerateRegion { region_id: 0 }
        );
    }

    #[test]
    fn empty_label_grid_gives_no_markers() {
        let labels = RegionLabels::from_label_image(ImageBuffer::new(4, 4));
        assert!(fit_markers(&labels).unwrap().is_empty());
    }
}
