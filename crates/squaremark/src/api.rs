//! High-level extraction API.
//!
//! [`Extractor`] is the primary entry point for turning an image into a
//! marker list. It wraps an [`ExtractConfig`]; create once, extract on many
//! images.
//!
//! # Examples
//!
//! ```no_run
//! use squaremark::{intensity_from_gray, Extractor};
//!
//! let gray = image::open("markers.png").unwrap().to_luma8();
//! let result = Extractor::default().extract(&intensity_from_gray(&gray)).unwrap();
//! println!("Found {} markers", result.markers.len());
//! ```

use crate::error::Error;
use crate::fit::fit_markers;
use crate::marker_file::MarkerFile;
use crate::orientation::{assign_orientations, OrientationWeights};
use crate::segment::{segment, IntensityImage, RegionLabels, SegmentConfig};

/// Extraction configuration.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub segment: SegmentConfig,
    /// Estimate orientations right after fitting with these weights.
    /// `None` leaves every marker unoriented.
    pub orient: Option<OrientationWeights>,
}

/// Segment → fit → (orient) on a single image.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// Access the current configuration.
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut ExtractConfig {
        &mut self.config
    }

    /// Extract markers from `image`, recording its size in the result.
    pub fn extract(&self, image: &IntensityImage) -> Result<MarkerFile, Error> {
        self.extract_with_labels(image).map(|(file, _)| file)
    }

    /// Like [`Extractor::extract`], also returning the label grid.
    pub fn extract_with_labels(
        &self,
        image: &IntensityImage,
    ) -> Result<(MarkerFile, RegionLabels), Error> {
        let labels = segment(image, &self.config.segment)?;
        let mut markers = fit_markers(&labels)?;
        if let Some(weights) = &self.config.orient {
            assign_orientations(&mut markers, weights)?;
        }
        let (w, h) = image.dimensions();
        tracing::info!("extracted {} markers from {}x{} image", markers.len(), w, h);
        Ok((MarkerFile::new(markers).with_image_size(w, h), labels))
    }
}
