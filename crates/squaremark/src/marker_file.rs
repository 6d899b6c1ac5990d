//! Marker list persistence.
//!
//! A marker file is a JSON object holding the ordered marker list and, for
//! files written by extraction, the source image size:
//!
//! ```json
//! {
//!   "markers": [
//!     { "position": { "x": 12.5, "y": 40.0 }, "radius": 4.2, "orientation": null }
//!   ],
//!   "image_size": [640, 480]
//! }
//! ```
//!
//! Marker order is significant and is preserved exactly; workflows that load,
//! update `orientation` and save back rely on it.
//!
//! Files produced by the older Python tooling wrap each marker and each
//! position in a type envelope, `{"py/type": "dto.Marker", "py/data": {..}}`.
//! Both shapes are accepted on load; only the plain shape is written.

use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::render::Bounds;
use crate::Marker;

/// Errors raised while reading or writing marker files.
#[derive(Debug)]
pub enum MarkerFileError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// A record violates the marker invariants.
    InvalidMarker { index: usize, reason: String },
}

impl std::fmt::Display for MarkerFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "marker file I/O failed: {}", e),
            Self::Json(e) => write!(f, "malformed marker file: {}", e),
            Self::InvalidMarker { index, reason } => {
                write!(f, "invalid marker {}: {}", index, reason)
            }
        }
    }
}

impl std::error::Error for MarkerFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::InvalidMarker { .. } => None,
        }
    }
}

impl From<std::io::Error> for MarkerFileError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for MarkerFileError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// A record either bare or inside a `py/type` + `py/data` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum Enveloped<T> {
    Wrapped {
        #[serde(rename = "py/data")]
        data: T,
    },
    Plain(T),
}

impl<T> Enveloped<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } => data,
            Self::Plain(v) => v,
        }
    }
}

/// `deserialize_with` helper for a single possibly-enveloped record.
pub(crate) fn unwrap_envelope<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Enveloped::deserialize(deserializer).map(Enveloped::into_inner)
}

fn unwrap_envelopes<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Vec::<Enveloped<T>>::deserialize(deserializer)?;
    Ok(items.into_iter().map(Enveloped::into_inner).collect())
}

/// Ordered marker list plus optional source-image metadata.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct MarkerFile {
    #[serde(deserialize_with = "unwrap_envelopes")]
    pub markers: Vec<Marker>,
    /// Source image dimensions `[width, height]`; informational only.
    #[serde(
        default,
        alias = "original_image_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_size: Option<[u32; 2]>,
}

impl MarkerFile {
    pub fn new(markers: Vec<Marker>) -> Self {
        Self {
            markers,
            image_size: None,
        }
    }

    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_size = Some([width, height]);
        self
    }

    /// Parse and validate a marker file from a JSON string.
    pub fn from_json_str(data: &str) -> Result<Self, MarkerFileError> {
        let file: Self = serde_json::from_str(data)?;
        file.validate()?;
        Ok(file)
    }

    /// Load a marker file from disk.
    pub fn from_json_file(path: &Path) -> Result<Self, MarkerFileError> {
        let data = std::fs::read_to_string(path)?;
        let file = Self::from_json_str(&data)?;
        tracing::debug!("loaded {} markers from {}", file.markers.len(), path.display());
        Ok(file)
    }

    /// Serialize to pretty-printed JSON. Fails on invalid markers so a bad
    /// set is never persisted.
    pub fn to_json_string(&self) -> Result<String, MarkerFileError> {
        self.validate()?;
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize fully in memory, then write `path` in one call.
    pub fn write_json_file(&self, path: &Path) -> Result<(), MarkerFileError> {
        let json = self.to_json_string()?;
        std::fs::write(path, json)?;
        tracing::debug!("wrote {} markers to {}", self.markers.len(), path.display());
        Ok(())
    }

    /// Check every record: finite position, finite non-negative radius,
    /// finite orientation when present.
    pub fn validate(&self) -> Result<(), MarkerFileError> {
        for (index, m) in self.markers.iter().enumerate() {
            let reason = if !m.position.is_finite() {
                Some("position is not finite")
            } else if !m.radius.is_finite() || m.radius < 0.0 {
                Some("radius must be finite and >= 0")
            } else if m.orientation.is_some_and(|a| !a.is_finite()) {
                Some("orientation is not finite")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(MarkerFileError::InvalidMarker {
                    index,
                    reason: reason.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Number of markers with an orientation set.
    pub fn n_oriented(&self) -> usize {
        self.markers
            .iter()
            .filter(|m| m.orientation.is_some())
            .count()
    }

    /// Arithmetic mean of the marker radii.
    pub fn mean_radius(&self) -> Option<f64> {
        if self.markers.is_empty() {
            return None;
        }
        Some(self.markers.iter().map(|m| m.radius).sum::<f64>() / self.markers.len() as f64)
    }

    /// Axis-aligned bounds of the marker centres.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.markers.iter().map(|m| &m.position))
    }
}
