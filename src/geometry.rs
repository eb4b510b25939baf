//! WKT geometry operands for spatial predicates.
//!
//! Input text is parsed with the `wkt` crate into `geo-types`, then flattened
//! into [`Shape`]: one ordered list of positions per point set, line or ring.
//! The builder normalises every geometry to latitude-first order exactly once
//! ([`Wkt::into_lat_lon`]); rendering writes positions as stored.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use geo_types::{Geometry, LineString, Polygon};

use crate::capabilities::GeometryKind;
use crate::error::BuildError;
use crate::types::AxisOrder;

/// One coordinate pair, in the order given by the owning [`Wkt`]'s axis order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub f64, pub f64);

impl Position {
    fn swapped(self) -> Self {
        Position(self.1, self.0)
    }
}

/// Coordinates grouped the way WKT groups them.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Position),
    LineString(Vec<Position>),
    /// Exterior ring first, then interior rings.
    Polygon(Vec<Vec<Position>>),
    MultiPoint(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Shape {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Shape::Point(_) => GeometryKind::Point,
            Shape::LineString(_) => GeometryKind::LineString,
            Shape::Polygon(_) => GeometryKind::Polygon,
            Shape::MultiPoint(_) => GeometryKind::MultiPoint,
            Shape::MultiLineString(_) => GeometryKind::MultiLineString,
            Shape::MultiPolygon(_) => GeometryKind::MultiPolygon,
        }
    }

    /// True if any point set, line or ring has no positions.
    fn has_empty_part(&self) -> bool {
        let empty_rings =
            |rings: &Vec<Vec<Position>>| rings.is_empty() || rings.iter().any(Vec::is_empty);
        match self {
            Shape::Point(_) => false,
            Shape::LineString(ps) | Shape::MultiPoint(ps) => ps.is_empty(),
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => empty_rings(rings),
            Shape::MultiPolygon(polys) => polys.is_empty() || polys.iter().any(empty_rings),
        }
    }

    fn map_positions(self, f: impl Fn(Position) -> Position + Copy) -> Self {
        let line = |positions: Vec<Position>| positions.into_iter().map(f).collect::<Vec<_>>();
        let rings = |rings: Vec<Vec<Position>>| rings.into_iter().map(line).collect::<Vec<_>>();
        match self {
            Shape::Point(p) => Shape::Point(f(p)),
            Shape::LineString(ps) => Shape::LineString(line(ps)),
            Shape::Polygon(rs) => Shape::Polygon(rings(rs)),
            Shape::MultiPoint(ps) => Shape::MultiPoint(line(ps)),
            Shape::MultiLineString(ls) => Shape::MultiLineString(rings(ls)),
            Shape::MultiPolygon(polys) => {
                Shape::MultiPolygon(polys.into_iter().map(rings).collect())
            }
        }
    }
}

/// A parsed geometry plus the axis order its positions are stored in.
#[derive(Debug, Clone, PartialEq)]
pub struct Wkt {
    shape: Shape,
    axis_order: AxisOrder,
}

impl Wkt {
    /// Parse WKT text whose positions are in `axis_order`.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::InvalidWkt` for malformed text, empty geometries
    /// and geometry collections.
    pub fn parse(text: &str, axis_order: AxisOrder) -> Result<Self, BuildError> {
        let invalid = |message: String| BuildError::InvalidWkt {
            wkt: text.to_string(),
            message,
        };

        check_text(text).map_err(|message| invalid(message.to_string()))?;

        let parsed = wkt::Wkt::<f64>::from_str(text.trim()).map_err(|e| invalid(e.to_string()))?;
        let geometry =
            Geometry::<f64>::try_from(parsed).map_err(|e| invalid(format!("{:?}", e)))?;

        let shape = match geometry {
            Geometry::Point(p) => Shape::Point(Position(p.x(), p.y())),
            Geometry::LineString(ls) => Shape::LineString(line_positions(&ls)),
            Geometry::Polygon(poly) => Shape::Polygon(polygon_rings(&poly)),
            Geometry::MultiPoint(mp) => {
                Shape::MultiPoint(mp.iter().map(|p| Position(p.x(), p.y())).collect())
            }
            Geometry::MultiLineString(mls) => {
                Shape::MultiLineString(mls.iter().map(line_positions).collect())
            }
            Geometry::MultiPolygon(mp) => {
                Shape::MultiPolygon(mp.iter().map(polygon_rings).collect())
            }
            _ => return Err(invalid("unsupported geometry type".to_string())),
        };
        if shape.has_empty_part() {
            return Err(invalid(EMPTY_GEOMETRY.to_string()));
        }

        Ok(Self { shape, axis_order })
    }

    /// Build from already grouped positions.
    pub fn from_shape(shape: Shape, axis_order: AxisOrder) -> Self {
        Self { shape, axis_order }
    }

    /// Reorder positions to latitude-first, swapping each pair at most once.
    pub fn into_lat_lon(self) -> Self {
        match self.axis_order {
            AxisOrder::LatLon => self,
            AxisOrder::LonLat => Self {
                shape: self.shape.map_positions(Position::swapped),
                axis_order: AxisOrder::LatLon,
            },
        }
    }

    pub fn kind(&self) -> GeometryKind {
        self.shape.kind()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn axis_order(&self) -> AxisOrder {
        self.axis_order
    }
}

const EMPTY_GEOMETRY: &str = "empty geometries are not supported";
const EXTRA_ORDINATES: &str = "Z and M ordinates are not supported";

const WKT_TAGS: &[&str] = &[
    "POINT",
    "LINESTRING",
    "POLYGON",
    "MULTIPOINT",
    "MULTILINESTRING",
    "MULTIPOLYGON",
    "GEOMETRYCOLLECTION",
];

/// Rejects `EMPTY` and 3D/measured input before the `wkt` crate sees it.
///
/// `POINT EMPTY` would otherwise come back as an empty multipoint, and Z/M
/// values would be dropped.
fn check_text(text: &str) -> Result<(), &'static str> {
    for group in text.split(['(', ')', ',']) {
        let tokens: Vec<&str> = group.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            continue;
        };

        if !first.starts_with(|c: char| c.is_ascii_alphabetic()) {
            if tokens.len() > 2 {
                return Err(EXTRA_ORDINATES);
            }
            continue;
        }

        for token in &tokens {
            let word = token.to_ascii_uppercase();
            if word == "EMPTY" {
                return Err(EMPTY_GEOMETRY);
            }
            let dimension_suffix = WKT_TAGS
                .iter()
                .find_map(|tag| word.strip_prefix(tag))
                .unwrap_or(word.as_str());
            if matches!(dimension_suffix, "Z" | "M" | "ZM") {
                return Err(EXTRA_ORDINATES);
            }
        }
    }
    Ok(())
}

fn line_positions(line: &LineString<f64>) -> Vec<Position> {
    line.coords().map(|c| Position(c.x, c.y)).collect()
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(line_positions)
        .collect()
}

/// Writes `TAG (...)` with positions in stored order.
impl fmt::Display for Wkt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        out.push_str(self.kind().wkt_tag());
        out.push(' ');
        match &self.shape {
            Shape::Point(p) => write_group(&mut out, std::slice::from_ref(p)),
            Shape::LineString(ps) => write_group(&mut out, ps),
            Shape::Polygon(rings) => write_rings(&mut out, rings),
            Shape::MultiPoint(ps) => {
                out.push('(');
                for (i, p) in ps.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_group(&mut out, std::slice::from_ref(p));
                }
                out.push(')');
            }
            Shape::MultiLineString(lines) => write_rings(&mut out, lines),
            Shape::MultiPolygon(polys) => {
                out.push('(');
                for (i, rings) in polys.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_rings(&mut out, rings);
                }
                out.push(')');
            }
        }
        f.write_str(&out)
    }
}

fn write_group(out: &mut String, positions: &[Position]) {
    out.push('(');
    for (i, p) in positions.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        // Writing to a String cannot fail.
        let _ = write!(out, "{} {}", p.0, p.1);
    }
    out.push(')');
}

fn write_rings(out: &mut String, rings: &[Vec<Position>]) {
    out.push('(');
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_group(out, ring);
    }
    out.push(')');
}
