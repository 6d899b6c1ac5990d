//! Label-grid visualisation for debugging segmentation.

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::segment::RegionLabels;

/// Paint each region a random colour; background stays black.
///
/// Colours come from a `StdRng` seeded with `seed`, so the same labels and
/// seed always give the same picture. Channels are drawn from `64..=255` to
/// keep regions distinguishable from the background.
pub fn colorize_labels(labels: &RegionLabels, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut palette = Vec::with_capacity(labels.count() as usize + 1);
    palette.push(Rgb([0u8, 0, 0]));
    for _ in labels.region_ids() {
        palette.push(Rgb([
            rng.gen_range(64..=255),
            rng.gen_range(64..=255),
            rng.gen_range(64..=255),
        ]));
    }

    let (w, h) = labels.dimensions();
    RgbImage::from_fn(w, h, |x, y| palette[labels.label_at(x, y) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{segment, SegmentConfig};
    use crate::test_utils::{draw_squares, SquareSpec};

    fn two_region_labels() -> RegionLabels {
        let img = draw_squares(
            24,
            12,
            &[
                SquareSpec::axis_aligned(5.0, 5.0, 2.0),
                SquareSpec::axis_aligned(16.0, 5.0, 2.0),
            ],
            false,
        );
        segment(&img, &SegmentConfig::default()).unwrap()
    }

    #[test]
    fn background_is_black_and_regions_are_uniform() {
        let labels = two_region_labels();
        let rgb = colorize_labels(&labels, 1);
        assert_eq!(rgb.dimensions(), (24, 12));
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([0, 0, 0]));
        let a = *rgb.get_pixel(5, 5);
        assert_ne!(a, Rgb([0, 0, 0]));
        assert_eq!(*rgb.get_pixel(3, 3), a);
        assert_eq!(*rgb.get_pixel(7, 7), a);
    }

    #[test]
    fn same_seed_same_colours() {
        let labels = two_region_labels();
        assert_eq!(colorize_labels(&labels, 9), colorize_labels(&labels, 9));
    }
}
