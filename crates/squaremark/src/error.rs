//! Crate-level error that tags each failure with the stage that raised it.

use crate::fit::FitError;
use crate::orientation::OrientationError;
use crate::render::RenderError;
use crate::segment::SegmentError;

/// Pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Segmentation,
    Fitting,
    Orientation,
    Rendering,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Segmentation => "segmentation",
            Self::Fitting => "fitting",
            Self::Orientation => "orientation",
            Self::Rendering => "rendering",
        };
        f.write_str(name)
    }
}

/// Any core failure. Every variant is raised immediately; nothing is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Segmentation(SegmentError),
    Fitting(FitError),
    Orientation(OrientationError),
    Rendering(RenderError),
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Segmentation(_) => Stage::Segmentation,
            Self::Fitting(_) => Stage::Fitting,
            Self::Orientation(_) => Stage::Orientation,
            Self::Rendering(_) => Stage::Rendering,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Segmentation(e) => write!(f, "{}: {}", self.stage(), e),
            Self::Fitting(e) => write!(f, "{}: {}", self.stage(), e),
            Self::Orientation(e) => write!(f, "{}: {}", self.stage(), e),
            Self::Rendering(e) => write!(f, "{}: {}", self.stage(), e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Segmentation(e) => Some(e),
            Self::Fitting(e) => Some(e),
            Self::Orientation(e) => Some(e),
            Self::Rendering(e) => Some(e),
        }
    }
}

impl From<SegmentError> for Error {
    fn from(e: SegmentError) -> Self {
        Self::Segmentation(e)
    }
}

impl From<FitError> for Error {
    fn from(e: FitError) -> Self {
        Self::Fitting(e)
    }
}

impl From<OrientationError> for Error {
    fn from(e: OrientationError) -> Self {
        Self::Orientation(e)
    }
}

impl From<RenderError> for Error {
    fn from(e: RenderError) -> Self {
        Self::Rendering(e)
    }
}
