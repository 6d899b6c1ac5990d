//! In-memory vector drawing and its SVG / EPS serializations.

use std::path::Path;

use super::geometry::Bounds;
use crate::Point;

/// One drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Closed polygon filled solid black.
    FilledPolygon { points: Vec<Point> },
    /// Rectangle outline stroked in black.
    StrokedRect { rect: Bounds, line_width: f64 },
}

/// Output format of a [`VectorDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    #[default]
    Svg,
    Eps,
}

impl DocumentFormat {
    /// `.eps` / `.ps` select EPS; anything else is SVG.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("eps") | Some("ps") => Self::Eps,
            _ => Self::Svg,
        }
    }
}

/// A finished drawing: primitives in draw order plus the visible page area.
///
/// Coordinates are image pixel coordinates (y down).
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
    /// Page area; covers every primitive including stroke widths.
    pub bounds: Bounds,
    pub shapes: Vec<Shape>,
}

impl VectorDocument {
    pub fn polygons(&self) -> impl Iterator<Item = &[Point]> + '_ {
        self.shapes.iter().filter_map(|s| match s {
            Shape::FilledPolygon { points } => Some(points.as_slice()),
            _ => None,
        })
    }

    pub fn frames(&self) -> impl Iterator<Item = (&Bounds, f64)> + '_ {
        self.shapes.iter().filter_map(|s| match s {
            Shape::StrokedRect { rect, line_width } => Some((rect, *line_width)),
            _ => None,
        })
    }

    pub fn serialize(&self, format: DocumentFormat) -> String {
        match format {
            DocumentFormat::Svg => self.to_svg(),
            DocumentFormat::Eps => self.to_eps(),
        }
    }

    pub fn to_svg(&self) -> String {
        let b = &self.bounds;
        let mut svg = String::new();
        svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{}\" height=\"{}\" viewBox=\"{} {} {} {}\">\n",
            num(b.width()),
            num(b.height()),
            num(b.x0),
            num(b.y0),
            num(b.width()),
            num(b.height()),
        ));
        for shape in &self.shapes {
            match shape {
                Shape::FilledPolygon { points } => {
                    let Some((first, rest)) = points.split_first() else {
                        continue;
                    };
                    let mut d = format!("M {},{}", num(first.x), num(first.y));
                    for p in rest {
                        d.push_str(&format!(" L {},{}", num(p.x), num(p.y)));
                    }
                    d.push_str(" Z");
                    svg.push_str(&format!(
                        "  <path d=\"{}\" fill=\"black\" stroke=\"none\"/>\n",
                        d
                    ));
                }
                Shape::StrokedRect { rect, line_width } => {
                    svg.push_str(&format!(
                        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"black\" stroke-width=\"{}\"/>\n",
                        num(rect.x0),
                        num(rect.y0),
                        num(rect.width()),
                        num(rect.height()),
                        num(*line_width),
                    ));
                }
            }
        }
        svg.push_str("</svg>\n");
        svg
    }

    /// Encapsulated PostScript. The page origin is moved to the lower-left
    /// corner of `bounds` and y is flipped so the drawing is not mirrored.
    pub fn to_eps(&self) -> String {
        let b = &self.bounds;
        let tx = |p: &Point| (p.x - b.x0, b.y1 - p.y);
        let mut eps = String::new();
        eps.push_str("%!PS-Adobe-3.0 EPSF-3.0\n");
        eps.push_str("%%Creator: squaremark\n");
        eps.push_str(&format!(
            "%%BoundingBox: 0 0 {} {}\n",
            b.width().ceil() as i64,
            b.height().ceil() as i64
        ));
        eps.push_str(&format!(
            "%%HiResBoundingBox: 0 0 {} {}\n",
            num(b.width()),
            num(b.height())
        ));
        eps.push_str("%%EndComments\n");
        eps.push_str("0 setgray\n");
        for shape in &self.shapes {
            match shape {
                Shape::FilledPolygon { points } => {
                    let Some((first, rest)) = points.split_first() else {
                        continue;
                    };
                    let (x, y) = tx(first);
                    eps.push_str(&format!("newpath {} {} moveto", num(x), num(y)));
                    for p in rest {
                        let (x, y) = tx(p);
                        eps.push_str(&format!(" {} {} lineto", num(x), num(y)));
                    }
                    eps.push_str(" closepath fill\n");
                }
                Shape::StrokedRect { rect, line_width } => {
                    let (x0, y0) = tx(&Point::new(rect.x0, rect.y1));
                    eps.push_str(&format!(
                        "{} setlinewidth newpath {} {} moveto {} 0 rlineto 0 {} rlineto {} 0 rlineto closepath stroke\n",
                        num(*line_width),
                        num(x0),
                        num(y0),
                        num(rect.width()),
                        num(rect.height()),
                        num(-rect.width()),
                    ));
                }
            }
        }
        eps.push_str("showpage\n%%EOF\n");
        eps
    }
}

/// Fixed-point number with trailing zeros removed.
fn num(v: f64) -> String {
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "" | "-" | "-0" => "0".to_string(),
        _ => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> VectorDocument {
        VectorDocument {
            bounds: Bounds {
                x0: -1.0,
                x1: 3.0,
                y0: 0.0,
                y1: 2.0,
            },
            shapes: vec![
                Shape::FilledPolygon {
                    points: vec![
                        Point::new(0.0, 0.5),
                        Point::new(1.0, 0.5),
                        Point::new(1.0, 1.5),
                        Point::new(0.0, 1.5),
                    ],
                },
                Shape::StrokedRect {
                    rect: Bounds {
                        x0: -0.5,
                        x1: 2.5,
                        y0: 0.25,
                        y1: 1.75,
                    },
                    line_width: 0.125,
                },
            ],
        }
    }

    #[test]
    fn number_formatting_is_compact() {
        assert_eq!(num(1.0), "1");
        assert_eq!(num(-0.00001), "0");
        assert_eq!(num(2.5), "2.5");
        assert_eq!(num(-3.14159), "-3.1416");
        assert_eq!(num(10.0), "10");
    }

    #[test]
    fn svg_contains_viewbox_path_and_frame() {
        let svg = sample_doc().to_svg();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("viewBox=\"-1 0 4 2\""));
        assert!(svg.contains("<path d=\"M 0,0.5 L 1,0.5 L 1,1.5 L 0,1.5 Z\" fill=\"black\""));
        assert!(svg.contains(
            "<rect x=\"-0.5\" y=\"0.25\" width=\"3\" height=\"1.5\" fill=\"none\" stroke=\"black\" stroke-width=\"0.125\"/>"
        ));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn eps_flips_y_into_page_frame() {
        let eps = sample_doc().to_eps();
        assert!(eps.starts_with("%!PS-Adobe-3.0 EPSF-3.0"));
        assert!(eps.contains("%%BoundingBox: 0 0 4 2"));
        // (0, 0.5) -> (1, 1.5) after translating by x0 = -1 and flipping about y1 = 2.
        assert!(eps.contains("newpath 1 1.5 moveto 2 1.5 lineto 2 0.5 lineto 1 0.5 lineto closepath fill"));
        assert!(eps.contains("0.125 setlinewidth newpath 0.5 0.25 moveto 3 0 rlineto 0 1.5 rlineto -3 0 rlineto closepath stroke"));
        assert!(eps.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.EPS")), DocumentFormat::Eps);
        assert_eq!(DocumentFormat::from_path(Path::new("a.svg")), DocumentFormat::Svg);
        assert_eq!(DocumentFormat::from_path(Path::new("noext")), DocumentFormat::Svg);
    }

    #[test]
    fn shape_accessors_split_by_kind() {
        let doc = sample_doc();
        assert_eq!(doc.polygons().count(), 1);
        let frames: Vec<_> = doc.frames().collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].1, 0.125);
    }
}
