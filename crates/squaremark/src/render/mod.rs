//! Vector re-rendering of a marker set.
//!
//! Every marker becomes a filled square rotated by its orientation. A frame
//! rectangle is then fitted around the drawing: optionally stretched to a
//! target aspect ratio, scaled by a uniform margin, always centred on the
//! content.

mod document;
mod geometry;

pub use document::{DocumentFormat, Shape, VectorDocument};
pub use geometry::{apply_scale_centered, scale_from_ratio, square_corners, Bounds};

use crate::{Marker, Point};

/// Frame line width is `min(frame_width, frame_height) / FRAME_LINE_DIVISOR`.
const FRAME_LINE_DIVISOR: f64 = 200.0;

/// Errors raised by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Nothing to draw; the frame would be undefined.
    EmptyMarkerSet,
    /// Marker has no orientation yet.
    MissingOrientation { index: usize },
    /// Marker position, radius or orientation is NaN/infinite, or radius < 0.
    NonFiniteMarker { index: usize },
    /// A rendering option is out of range.
    InvalidOption(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMarkerSet => write!(f, "cannot render an empty marker set"),
            Self::MissingOrientation { index } => {
                write!(f, "marker {} has no orientation", index)
            }
            Self::NonFiniteMarker { index } => {
                write!(f, "marker {} has non-finite or negative geometry", index)
            }
            Self::InvalidOption(msg) => write!(f, "invalid render option: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

/// Rendering options.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Draw every marker with the mean radius of the set.
    pub use_mean_radius: bool,
    /// Draw a frame around the markers.
    pub frame: bool,
    /// Target frame `width / height`; `None` keeps the content's own ratio.
    pub frame_ratio: Option<f64>,
    /// Uniform scale applied to the frame after ratio fitting (1.0 = tight).
    pub frame_margin: f64,
    /// Add a thinner outer border around the frame.
    pub double_frame: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            use_mean_radius: false,
            frame: true,
            frame_ratio: None,
            frame_margin: 1.0,
            double_frame: false,
        }
    }
}

impl RenderOptions {
    fn validate(&self) -> Result<(), RenderError> {
        if !self.frame_margin.is_finite() || self.frame_margin <= 0.0 {
            return Err(RenderError::InvalidOption(format!(
                "frame margin must be finite and > 0, got {}",
                self.frame_margin
            )));
        }
        if let Some(r) = self.frame_ratio {
            if !r.is_finite() || r <= 0.0 {
                return Err(RenderError::InvalidOption(format!(
                    "frame ratio must be finite and > 0, got {}",
                    r
                )));
            }
        }
        Ok(())
    }
}

fn validate_markers(markers: &[Marker]) -> Result<Vec<f64>, RenderError> {
    if markers.is_empty() {
        return Err(RenderError::EmptyMarkerSet);
    }
    markers
        .iter()
        .enumerate()
        .map(|(index, m)| {
            let orientation = m
                .orientation
                .ok_or(RenderError::MissingOrientation { index })?;
            let finite = m.position.is_finite() && m.radius.is_finite() && orientation.is_finite();
            if !finite || m.radius < 0.0 {
                return Err(RenderError::NonFiniteMarker { index });
            }
            Ok(orientation)
        })
        .collect()
}

/// Frame rectangle for `content` under `options`.
fn fit_frame(content: &Bounds, options: &RenderOptions) -> Result<Bounds, RenderError> {
    let content = content.with_min_extent();
    let (sx, sy) = match options.frame_ratio {
        Some(r) => scale_from_ratio(r, content.width(), content.height())?,
        None => (1.0, 1.0),
    };
    Ok(content.scaled(sx * options.frame_margin, sy * options.frame_margin))
}

/// Draw `markers` as rotated squares and fit a frame around them.
///
/// Markers are validated up front; nothing is produced unless every marker
/// has finite geometry and an orientation. Stored markers are never modified.
pub fn render_markers(
    markers: &[Marker],
    options: &RenderOptions,
) -> Result<VectorDocument, RenderError> {
    options.validate()?;
    let orientations = validate_markers(markers)?;

    let mean_radius = markers.iter().map(|m| m.radius).sum::<f64>() / markers.len() as f64;
    let squares: Vec<[Point; 4]> = markers
        .iter()
        .zip(&orientations)
        .map(|(m, &theta)| {
            let r = if options.use_mean_radius {
                mean_radius
            } else {
                m.radius
            };
            square_corners(m.position, r, theta)
        })
        .collect();

    let content =
        Bounds::from_points(squares.iter().flatten()).ok_or(RenderError::EmptyMarkerSet)?;
    let mut shapes: Vec<Shape> = squares
        .iter()
        .map(|corners| Shape::FilledPolygon {
            points: corners.to_vec(),
        })
        .collect();

    let page = if options.frame {
        let frame = fit_frame(&content, options)?;
        let line_width = frame.width().min(frame.height()) / FRAME_LINE_DIVISOR;
        shapes.push(Shape::StrokedRect {
            rect: frame,
            line_width,
        });
        if options.double_frame {
            let outer = frame.expanded(2.0 * line_width);
            shapes.push(Shape::StrokedRect {
                rect: outer,
                line_width: 0.5 * line_width,
            });
            outer.expanded(0.25 * line_width)
        } else {
            frame.expanded(0.5 * line_width)
        }
    } else {
        content.with_min_extent()
    };

    tracing::debug!(
        "rendered {} markers into {:.2}x{:.2} page",
        markers.len(),
        page.width(),
        page.height()
    );

    Ok(VectorDocument {
        bounds: page,
        shapes,
    })
}
