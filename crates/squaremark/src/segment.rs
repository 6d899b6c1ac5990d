//! Binarization and connected-region labelling.
//!
//! Intensities are expected in [0, 1]. Pixels are split at `threshold`, the
//! marker side of the split becomes foreground (value 1), and foreground is
//! partitioned into connected regions with `imageproc`'s two-pass labeller.
//! Region ids are `1..=count` in row-major first-touch order; 0 is background.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{self, connected_components};

/// Grayscale intensity grid, nominally in [0, 1].
pub type IntensityImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Label grid produced by [`label_regions`].
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

const FOREGROUND: u8 = 1;
const BACKGROUND: u8 = 0;

/// Errors raised while preparing or segmenting an intensity grid.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentError {
    /// Input is not a non-empty `width x height` grid.
    InputShape {
        width: u32,
        height: u32,
        /// Number of samples supplied.
        len: usize,
    },
    /// An intensity sample is NaN or infinite.
    NonFiniteIntensity { x: u32, y: u32 },
    /// Threshold outside [0, 1] or not finite.
    InvalidThreshold(f32),
}

impl std::fmt::Display for SegmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputShape { width, height, len } => write!(
                f,
                "input is not a 2D intensity grid: {}x{} with {} samples",
                width, height, len
            ),
            Self::NonFiniteIntensity { x, y } => {
                write!(f, "non-finite intensity at ({}, {})", x, y)
            }
            Self::InvalidThreshold(t) => write!(f, "threshold {} is outside [0, 1]", t),
        }
    }
}

impl std::error::Error for SegmentError {}

/// Which side of the threshold holds the markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Dark markers on a light background: `v < threshold` is foreground.
    #[default]
    DarkOnLight,
    /// Bright markers on a dark background: `v >= threshold` is foreground.
    BrightOnDark,
}

/// Pixel adjacency used when growing regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Edge-sharing neighbours only.
    #[default]
    Four,
    /// Edge- and corner-sharing neighbours.
    Eight,
}

impl From<Connectivity> for region_labelling::Connectivity {
    fn from(c: Connectivity) -> Self {
        match c {
            Connectivity::Four => region_labelling::Connectivity::Four,
            Connectivity::Eight => region_labelling::Connectivity::Eight,
        }
    }
}

/// Segmentation parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Binarization threshold in intensity units.
    pub threshold: f32,
    pub polarity: Polarity,
    pub connectivity: Connectivity,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            polarity: Polarity::DarkOnLight,
            connectivity: Connectivity::Four,
        }
    }
}

/// Labelled regions of one image.
#[derive(Debug, Clone)]
pub struct RegionLabels {
    labels: LabelImage,
    count: u32,
}

impl RegionLabels {
    /// Wrap an existing label grid. `count` is recomputed as the largest label.
    pub fn from_label_image(labels: LabelImage) -> Self {
        let count = labels.as_raw().iter().copied().max().unwrap_or(0);
        Self { labels, count }
    }

    /// Number of regions; ids run from 1 to `count`.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.labels.dimensions()
    }

    /// Region id at `(x, y)`, 0 for background.
    pub fn label_at(&self, x: u32, y: u32) -> u32 {
        self.labels.get_pixel(x, y)[0]
    }

    pub fn region_ids(&self) -> std::ops::RangeInclusive<u32> {
        1..=self.count
    }

    pub fn as_image(&self) -> &LabelImage {
        &self.labels
    }
}

/// Build an intensity grid from a row-major sample buffer.
pub fn intensity_from_raw(
    width: u32,
    height: u32,
    data: Vec<f32>,
) -> Result<IntensityImage, SegmentError> {
    let len = data.len();
    if width == 0 || height == 0 || len != width as usize * height as usize {
        return Err(SegmentError::InputShape { width, height, len });
    }
    if let Some(i) = data.iter().position(|v| !v.is_finite()) {
        return Err(SegmentError::NonFiniteIntensity {
            x: (i % width as usize) as u32,
            y: (i / width as usize) as u32,
        });
    }
    ImageBuffer::from_raw(width, height, data).ok_or(SegmentError::InputShape {
        width,
        height,
        len,
    })
}

/// Normalize an 8-bit grayscale image to [0, 1].
pub fn intensity_from_gray(gray: &GrayImage) -> IntensityImage {
    let (w, h) = gray.dimensions();
    ImageBuffer::from_fn(w, h, |x, y| Luma([gray.get_pixel(x, y)[0] as f32 / 255.0]))
}

/// Threshold `img` into a 0/1 foreground mask.
pub fn binarize(img: &IntensityImage, config: &SegmentConfig) -> Result<GrayImage, SegmentError> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(SegmentError::InputShape {
            width: w,
            height: h,
            len: 0,
        });
    }
    let t = config.threshold;
    if !t.is_finite() || !(0.0..=1.0).contains(&t) {
        return Err(SegmentError::InvalidThreshold(t));
    }

    let mut mask = GrayImage::new(w, h);
    for (x, y, px) in img.enumerate_pixels() {
        let v = px[0];
        if !v.is_finite() {
            return Err(SegmentError::NonFiniteIntensity { x, y });
        }
        let bright = v >= t;
        let fg = match config.polarity {
            Polarity::DarkOnLight => !bright,
            Polarity::BrightOnDark => bright,
        };
        mask.put_pixel(x, y, Luma([if fg { FOREGROUND } else { BACKGROUND }]));
    }
    Ok(mask)
}

/// Label connected foreground regions of a 0/1 mask.
pub fn label_regions(mask: &GrayImage, connectivity: Connectivity) -> RegionLabels {
    let labels = connected_components(mask, connectivity.into(), Luma([BACKGROUND]));
    RegionLabels::from_label_image(labels)
}

/// Binarize and label in one step.
pub fn segment(img: &IntensityImage, config: &SegmentConfig) -> Result<RegionLabels, SegmentError> {
    let mask = binarize(img, config)?;
    let labels = label_regions(&mask, config.connectivity);
    let (w, h) = img.dimensions();
    tracing::info!(
        "{} regions labelled in {}x{} image ({:?}, {:?})",
        labels.count(),
        w,
        h,
        config.polarity,
        config.connectivity
    );
    Ok(labels)
}
