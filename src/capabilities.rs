//! Filter capabilities advertised by a remote catalog service.
//!
//! The transport layer hands over the filter-capabilities section of the
//! service's self-description as JSON:
//!
//! ```json
//! {
//!   "comparisonOperators": ["EqualTo", "PropertyIsLike", "Between", "NullCheck"],
//!   "spatialOperators": ["Intersects", "DWithin"],
//!   "geometryOperands": ["gml:Point", "gml:Polygon"],
//!   "logicalOperators": true
//! }
//! ```
//!
//! A [`CapabilitySet`] is parsed once per document and never mutated. A
//! reconfigured source swaps in a new snapshot through [`CapabilityRegistry`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CapabilityError;

/// Namespace prefixes stripped from advertised operator and operand names.
const NAME_PREFIXES: &[&str] = &["gml:", "ogc:", "fes:"];

/// Comparison operators a source may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    Like,
    IsNull,
    Between,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 9] = [
        ComparisonOperator::EqualTo,
        ComparisonOperator::NotEqualTo,
        ComparisonOperator::GreaterThan,
        ComparisonOperator::GreaterThanOrEqualTo,
        ComparisonOperator::LessThan,
        ComparisonOperator::LessThanOrEqualTo,
        ComparisonOperator::Like,
        ComparisonOperator::IsNull,
        ComparisonOperator::Between,
    ];

    /// Parse an advertised operator name.
    ///
    /// Returns `None` for unknown values (caller should warn).
    pub fn parse(name: &str) -> Option<Self> {
        let name = normalize_name(name);
        let name = name.strip_prefix("propertyis").unwrap_or(&name);
        match name {
            "equalto" => Some(ComparisonOperator::EqualTo),
            "notequalto" => Some(ComparisonOperator::NotEqualTo),
            "greaterthan" => Some(ComparisonOperator::GreaterThan),
            "greaterthanorequalto" | "greaterthanequalto" => {
                Some(ComparisonOperator::GreaterThanOrEqualTo)
            }
            "lessthan" => Some(ComparisonOperator::LessThan),
            "lessthanorequalto" | "lessthanequalto" => Some(ComparisonOperator::LessThanOrEqualTo),
            "like" => Some(ComparisonOperator::Like),
            "null" | "isnull" | "nullcheck" | "nil" => Some(ComparisonOperator::IsNull),
            "between" => Some(ComparisonOperator::Between),
            _ => None,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Spatial operators a source may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpatialOperator {
    Intersects,
    Crosses,
    Within,
    Contains,
    Beyond,
    DWithin,
    Disjoint,
    Overlaps,
    Touches,
}

impl SpatialOperator {
    pub const ALL: [SpatialOperator; 9] = [
        SpatialOperator::Intersects,
        SpatialOperator::Crosses,
        SpatialOperator::Within,
        SpatialOperator::Contains,
        SpatialOperator::Beyond,
        SpatialOperator::DWithin,
        SpatialOperator::Disjoint,
        SpatialOperator::Overlaps,
        SpatialOperator::Touches,
    ];

    /// Parse an advertised operator name.
    ///
    /// Returns `None` for unknown values (caller should warn).
    pub fn parse(name: &str) -> Option<Self> {
        match normalize_name(name).as_str() {
            "intersects" | "intersect" => Some(SpatialOperator::Intersects),
            "crosses" | "cross" => Some(SpatialOperator::Crosses),
            "within" => Some(SpatialOperator::Within),
            "contains" | "contain" => Some(SpatialOperator::Contains),
            "beyond" => Some(SpatialOperator::Beyond),
            "dwithin" => Some(SpatialOperator::DWithin),
            "disjoint" => Some(SpatialOperator::Disjoint),
            "overlaps" | "overlap" => Some(SpatialOperator::Overlaps),
            "touches" | "touch" => Some(SpatialOperator::Touches),
            _ => None,
        }
    }

    /// True for the operators that take a distance (`Beyond`, `DWithin`).
    pub fn is_distance(&self) -> bool {
        matches!(self, SpatialOperator::Beyond | SpatialOperator::DWithin)
    }
}

impl fmt::Display for SpatialOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Geometry operand kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 6] = [
        GeometryKind::Point,
        GeometryKind::LineString,
        GeometryKind::Polygon,
        GeometryKind::MultiPoint,
        GeometryKind::MultiLineString,
        GeometryKind::MultiPolygon,
    ];

    /// Parse an advertised operand name (`gml:Point`, `Envelope`, ...).
    ///
    /// Returns `None` for unknown values (caller should warn).
    pub fn parse(name: &str) -> Option<Self> {
        match normalize_name(name).as_str() {
            "point" => Some(GeometryKind::Point),
            "linestring" => Some(GeometryKind::LineString),
            "polygon" | "envelope" => Some(GeometryKind::Polygon),
            "multipoint" => Some(GeometryKind::MultiPoint),
            "multilinestring" | "multicurve" => Some(GeometryKind::MultiLineString),
            "multipolygon" | "multisurface" => Some(GeometryKind::MultiPolygon),
            _ => None,
        }
    }

    /// Upper-case WKT tag (`POINT`, `MULTIPOLYGON`, ...).
    pub fn wkt_tag(&self) -> &'static str {
        match self {
            GeometryKind::Point => "POINT",
            GeometryKind::LineString => "LINESTRING",
            GeometryKind::Polygon => "POLYGON",
            GeometryKind::MultiPoint => "MULTIPOINT",
            GeometryKind::MultiLineString => "MULTILINESTRING",
            GeometryKind::MultiPolygon => "MULTIPOLYGON",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    let local = NAME_PREFIXES
        .iter()
        .find_map(|prefix| {
            trimmed
                .get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &trimmed[prefix.len()..])
        })
        .unwrap_or(trimmed);
    local.to_ascii_lowercase()
}

/// Raw shape of a capability document before validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCapabilities {
    comparison_operators: Option<Vec<String>>,
    spatial_operators: Option<Vec<String>>,
    geometry_operands: Option<Vec<String>>,
    logical_operators: Option<bool>,
}

/// Immutable snapshot of what a remote service accepts in a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySet {
    comparison_operators: BTreeSet<ComparisonOperator>,
    spatial_operators: BTreeSet<SpatialOperator>,
    geometry_operands: BTreeSet<GeometryKind>,
    logical_operators: bool,
}

impl CapabilitySet {
    /// Parse a capability document.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityError::MissingComparisonOperators` or
    /// `CapabilityError::MissingSpatialOperators` if either list is absent,
    /// and `CapabilityError::InvalidDocument` if the document has the wrong shape.
    pub fn from_value(document: &Value) -> Result<Self, CapabilityError> {
        let raw: RawCapabilities = serde_json::from_value(document.clone()).map_err(|e| {
            CapabilityError::InvalidDocument {
                message: e.to_string(),
            }
        })?;

        let comparison = raw
            .comparison_operators
            .ok_or(CapabilityError::MissingComparisonOperators)?;
        let spatial = raw
            .spatial_operators
            .ok_or(CapabilityError::MissingSpatialOperators)?;

        let comparison_operators = parse_names(&comparison, "comparison operator", |name| {
            ComparisonOperator::parse(name)
        });
        let spatial_operators =
            parse_names(&spatial, "spatial operator", |name| SpatialOperator::parse(name));
        let geometry_operands = match raw.geometry_operands {
            Some(names) => parse_names(&names, "geometry operand", |name| GeometryKind::parse(name)),
            None => GeometryKind::ALL.into_iter().collect(),
        };

        let set = Self {
            comparison_operators,
            spatial_operators,
            geometry_operands,
            logical_operators: raw.logical_operators.unwrap_or(true),
        };
        tracing::debug!(
            comparison = set.comparison_operators.len(),
            spatial = set.spatial_operators.len(),
            geometry = set.geometry_operands.len(),
            logical = set.logical_operators,
            "parsed filter capabilities"
        );
        Ok(set)
    }

    /// Parse a capability document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CapabilityError> {
        let document: Value =
            serde_json::from_str(json).map_err(|e| CapabilityError::InvalidDocument {
                message: e.to_string(),
            })?;
        Self::from_value(&document)
    }

    /// A capability set that allows everything.
    pub fn all() -> Self {
        Self {
            comparison_operators: ComparisonOperator::ALL.into_iter().collect(),
            spatial_operators: SpatialOperator::ALL.into_iter().collect(),
            geometry_operands: GeometryKind::ALL.into_iter().collect(),
            logical_operators: true,
        }
    }

    /// Copy of this set without the given spatial operator.
    pub fn without_spatial(mut self, op: SpatialOperator) -> Self {
        self.spatial_operators.remove(&op);
        self
    }

    /// Copy of this set without the given comparison operator.
    pub fn without_comparison(mut self, op: ComparisonOperator) -> Self {
        self.comparison_operators.remove(&op);
        self
    }

    /// Copy of this set with the given geometry operands only.
    pub fn with_geometries(mut self, kinds: impl IntoIterator<Item = GeometryKind>) -> Self {
        self.geometry_operands = kinds.into_iter().collect();
        self
    }

    /// Copy of this set with logical combinators switched on or off.
    pub fn with_logical(mut self, supported: bool) -> Self {
        self.logical_operators = supported;
        self
    }

    pub fn supports_comparison(&self, op: ComparisonOperator) -> bool {
        self.comparison_operators.contains(&op)
    }

    pub fn supports_spatial(&self, op: SpatialOperator) -> bool {
        self.spatial_operators.contains(&op)
    }

    pub fn supports_geometry(&self, kind: GeometryKind) -> bool {
        self.geometry_operands.contains(&kind)
    }

    pub fn supports_logical(&self) -> bool {
        self.logical_operators
    }

    pub fn comparison_operators(&self) -> impl Iterator<Item = ComparisonOperator> + '_ {
        self.comparison_operators.iter().copied()
    }

    pub fn spatial_operators(&self) -> impl Iterator<Item = SpatialOperator> + '_ {
        self.spatial_operators.iter().copied()
    }

    pub fn geometry_operands(&self) -> impl Iterator<Item = GeometryKind> + '_ {
        self.geometry_operands.iter().copied()
    }
}

fn parse_names<T: Ord>(
    names: &[String],
    what: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> BTreeSet<T> {
    let mut parsed = BTreeSet::new();
    for name in names {
        match parse(name) {
            Some(value) => {
                parsed.insert(value);
            }
            None => tracing::warn!(name = %name, kind = what, "ignoring unknown capability"),
        }
    }
    parsed
}

/// Holder for the current capability snapshot of one source.
///
/// Builders take a snapshot and keep it for the whole build, so a concurrent
/// `replace` never shows them a half-updated set.
#[derive(Debug)]
pub struct CapabilityRegistry {
    current: RwLock<Arc<CapabilitySet>>,
}

impl CapabilityRegistry {
    pub fn new(set: CapabilitySet) -> Self {
        Self {
            current: RwLock::new(Arc::new(set)),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<CapabilitySet> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swap in a new snapshot; returns the previous one.
    pub fn replace(&self, set: CapabilitySet) -> Arc<CapabilitySet> {
        let next = Arc::new(set);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tracing::debug!("replacing capability snapshot");
        std::mem::replace(&mut *guard, next)
    }
}
