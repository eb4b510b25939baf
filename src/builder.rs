//! Capability-checked construction of predicate trees.
//!
//! A [`PredicateBuilder`] is a pure function of one capability snapshot, one
//! property mapping and one axis order. It holds no mutable state, so a single
//! builder can serve concurrent queries; a reconfigured source simply creates
//! a new builder from the new snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::capabilities::{CapabilitySet, ComparisonOperator, SpatialOperator};
use crate::error::BuildError;
use crate::geometry::Wkt;
use crate::mapping::{PropertyMapping, PropertyRef};
use crate::predicate::{
    Between, Comparison, Logical, LogicalOperator, PredicateNode, Spatial, Temporal, TemporalKind,
};
use crate::types::{AxisOrder, Literal};

#[derive(Debug, Clone)]
pub struct PredicateBuilder {
    capabilities: Arc<CapabilitySet>,
    mapping: PropertyMapping,
    axis_order: AxisOrder,
}

impl PredicateBuilder {
    /// Builder with the default mapping and latitude-first input.
    pub fn new(capabilities: Arc<CapabilitySet>) -> Self {
        Self {
            capabilities,
            mapping: PropertyMapping::default(),
            axis_order: AxisOrder::default(),
        }
    }

    pub fn with_mapping(mut self, mapping: PropertyMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Axis order of WKT passed to the spatial constructors.
    pub fn with_axis_order(mut self, axis_order: AxisOrder) -> Self {
        self.axis_order = axis_order;
        self
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn mapping(&self) -> &PropertyMapping {
        &self.mapping
    }

    /// Case-sensitive comparison.
    pub fn comparison(
        &self,
        op: ComparisonOperator,
        property: &str,
        literal: impl Into<Literal>,
    ) -> Result<PredicateNode, BuildError> {
        self.comparison_with_case(op, property, literal, true)
    }

    /// Comparison with explicit case sensitivity.
    ///
    /// `Between` is rejected here; use [`between`](Self::between).
    pub fn comparison_with_case(
        &self,
        op: ComparisonOperator,
        property: &str,
        literal: impl Into<Literal>,
        case_sensitive: bool,
    ) -> Result<PredicateNode, BuildError> {
        if op == ComparisonOperator::Between {
            return Err(BuildError::MisplacedOperator {
                operator: op.to_string(),
                hint: "a range needs lower and upper bounds; use between()",
            });
        }
        self.require_comparison(op)?;

        Ok(PredicateNode::Comparison(Comparison {
            operator: op,
            property: self.property(property),
            literal: literal.into(),
            case_sensitive,
        }))
    }

    /// `<property> IS NULL`.
    pub fn is_null(&self, property: &str) -> Result<PredicateNode, BuildError> {
        self.comparison(ComparisonOperator::IsNull, property, Literal::Str(String::new()))
    }

    pub fn between(
        &self,
        property: &str,
        lower: impl Into<Literal>,
        upper: impl Into<Literal>,
    ) -> Result<PredicateNode, BuildError> {
        self.require_comparison(ComparisonOperator::Between)?;

        Ok(PredicateNode::Between(Between {
            property: self.property(property),
            lower: lower.into(),
            upper: upper.into(),
        }))
    }

    /// Absolute time window. Inverted windows are accepted as given.
    pub fn during(
        &self,
        property: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PredicateNode, BuildError> {
        self.require_comparison(ComparisonOperator::Between)?;
        if start > end {
            tracing::warn!(property, %start, %end, "time window starts after it ends");
        }

        Ok(PredicateNode::Temporal(Temporal {
            property: self.property(property),
            kind: TemporalKind::During { start, end },
        }))
    }

    /// Window of `duration_millis` ending at render time.
    pub fn relative(
        &self,
        property: &str,
        duration_millis: i64,
    ) -> Result<PredicateNode, BuildError> {
        self.require_comparison(ComparisonOperator::Between)?;

        Ok(PredicateNode::Temporal(Temporal {
            property: self.property(property),
            kind: TemporalKind::Relative { duration_millis },
        }))
    }

    pub fn intersects(&self, property: &str, wkt: &str) -> Result<PredicateNode, BuildError> {
        self.spatial(SpatialOperator::Intersects, property, wkt, None)
    }

    pub fn crosses(&self, property: &str, wkt: &str) -> Result<PredicateNode, BuildError> {
        self.spatial(SpatialOperator::Crosses, property, wkt, None)
    }

    pub fn within(&self, property: &str, wkt: &str) -> Result<PredicateNode, BuildError> {
        self.spatial(SpatialOperator::Within, property, wkt, None)
    }

    pub fn contains(&self, property: &str, wkt: &str) -> Result<PredicateNode, BuildError> {
        self.spatial(SpatialOperator::Contains, property, wkt, None)
    }

    pub fn touches(&self, property: &str, wkt: &str) -> Result<PredicateNode, BuildError> {
        self.spatial(SpatialOperator::Touches, property, wkt, None)
    }

    pub fn overlaps(&self, property: &str, wkt: &str) -> Result<PredicateNode, BuildError> {
        self.spatial(SpatialOperator::Overlaps, property, wkt, None)
    }

    pub fn disjoint(&self, property: &str, wkt: &str) -> Result<PredicateNode, BuildError> {
        self.spatial(SpatialOperator::Disjoint, property, wkt, None)
    }

    pub fn beyond(
        &self,
        property: &str,
        wkt: &str,
        distance_meters: f64,
    ) -> Result<PredicateNode, BuildError> {
        self.spatial(SpatialOperator::Beyond, property, wkt, Some(distance_meters))
    }

    pub fn dwithin(
        &self,
        property: &str,
        wkt: &str,
        distance_meters: f64,
    ) -> Result<PredicateNode, BuildError> {
        self.spatial(SpatialOperator::DWithin, property, wkt, Some(distance_meters))
    }

    /// Any spatial predicate. `distance_meters` must be given exactly for
    /// `Beyond` and `DWithin`.
    pub fn spatial(
        &self,
        op: SpatialOperator,
        property: &str,
        wkt: &str,
        distance_meters: Option<f64>,
    ) -> Result<PredicateNode, BuildError> {
        if !self.capabilities.supports_spatial(op) {
            return Err(rejected(BuildError::UnsupportedOperator {
                operator: op.to_string(),
            }));
        }

        let geometry = Wkt::parse(wkt, self.axis_order)?;
        let kind = geometry.kind();
        if !self.capabilities.supports_geometry(kind) {
            return Err(rejected(BuildError::UnsupportedGeometry {
                kind: kind.to_string(),
            }));
        }

        match (op.is_distance(), distance_meters) {
            (true, Some(d)) if !d.is_finite() || d < 0.0 => {
                return Err(BuildError::InvalidDistance { distance: d })
            }
            (true, None) => {
                return Err(BuildError::MisplacedOperator {
                    operator: op.to_string(),
                    hint: "a distance is required",
                })
            }
            (false, Some(_)) => {
                return Err(BuildError::MisplacedOperator {
                    operator: op.to_string(),
                    hint: "this operator does not take a distance",
                })
            }
            _ => {}
        }

        Ok(PredicateNode::Spatial(Spatial {
            operator: op,
            property: self.property(property),
            geometry: geometry.into_lat_lon(),
            distance_meters,
        }))
    }

    pub fn and(&self, children: Vec<PredicateNode>) -> Result<PredicateNode, BuildError> {
        self.junction(LogicalOperator::And, children)
    }

    pub fn or(&self, children: Vec<PredicateNode>) -> Result<PredicateNode, BuildError> {
        self.junction(LogicalOperator::Or, children)
    }

    pub fn not(&self, child: PredicateNode) -> Result<PredicateNode, BuildError> {
        self.require_logical()?;
        Ok(PredicateNode::Logical(Logical {
            operator: LogicalOperator::Not,
            children: vec![child],
        }))
    }

    fn junction(
        &self,
        operator: LogicalOperator,
        children: Vec<PredicateNode>,
    ) -> Result<PredicateNode, BuildError> {
        if children.len() < 2 {
            return Err(rejected(BuildError::InvalidArity {
                operator: operator.to_string(),
                expected: "at least 2",
                count: children.len(),
            }));
        }
        self.require_logical()?;

        Ok(PredicateNode::Logical(Logical { operator, children }))
    }

    fn require_comparison(&self, op: ComparisonOperator) -> Result<(), BuildError> {
        if self.capabilities.supports_comparison(op) {
            Ok(())
        } else {
            Err(rejected(BuildError::UnsupportedOperator {
                operator: op.to_string(),
            }))
        }
    }

    fn require_logical(&self) -> Result<(), BuildError> {
        if self.capabilities.supports_logical() {
            Ok(())
        } else {
            Err(rejected(BuildError::LogicalNotSupported))
        }
    }

    fn property(&self, logical: &str) -> PropertyRef {
        self.mapping.resolve(logical)
    }
}

fn rejected(err: BuildError) -> BuildError {
    tracing::debug!(error = %err, "rejecting predicate");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::GeometryKind;

    fn builder() -> PredicateBuilder {
        PredicateBuilder::new(Arc::new(CapabilitySet::all()))
    }

    #[test]
    fn comparison_resolves_property() {
        let node = builder()
            .comparison(ComparisonOperator::EqualTo, "anyText", "bar")
            .unwrap();
        let PredicateNode::Comparison(cmp) = node else {
            panic!("expected comparison");
        };
        assert_eq!(cmp.property().field, "AnyText");
        assert_eq!(cmp.literal(), &Literal::Str("bar".into()));
        assert!(cmp.case_sensitive());
    }

    #[test]
    fn unsupported_comparison_is_rejected() {
        let caps = CapabilitySet::all().without_comparison(ComparisonOperator::Like);
        let err = PredicateBuilder::new(Arc::new(caps))
            .comparison(ComparisonOperator::Like, "title", "*bar*")
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::UnsupportedOperator {
                operator: "Like".into()
            }
        );
    }

    #[test]
    fn between_operator_is_misplaced_in_comparison() {
        let err = builder()
            .comparison(ComparisonOperator::Between, "size", 5)
            .unwrap_err();
        assert!(matches!(err, BuildError::MisplacedOperator { .. }));
    }

    #[test]
    fn temporal_requires_between() {
        let caps = CapabilitySet::all().without_comparison(ComparisonOperator::Between);
        let err = PredicateBuilder::new(Arc::new(caps))
            .relative("modified", 1000)
            .unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedOperator { .. }));
    }

    #[test]
    fn inverted_window_is_accepted() {
        let start = "2014-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let end = "2013-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert!(builder().during("modified", start, end).is_ok());
    }

    #[test]
    fn unsupported_geometry_is_rejected() {
        let caps = CapabilitySet::all().with_geometries([GeometryKind::Polygon]);
        let err = PredicateBuilder::new(Arc::new(caps))
            .intersects("anyGeo", "POINT (1 2)")
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::UnsupportedGeometry {
                kind: "Point".into()
            }
        );
    }

    #[test]
    fn spatial_input_is_normalised_to_lat_lon() {
        let node = builder()
            .with_axis_order(AxisOrder::LonLat)
            .within("anyGeo", "POINT (10 20)")
            .unwrap();
        let PredicateNode::Spatial(spatial) = node else {
            panic!("expected spatial");
        };
        assert_eq!(spatial.geometry().to_string(), "POINT (20 10)");
        assert_eq!(spatial.geometry().axis_order(), AxisOrder::LatLon);
        assert_eq!(spatial.property().field, "BBOX");
    }

    #[test]
    fn negative_distance_is_rejected() {
        let err = builder()
            .dwithin("anyGeo", "POINT (1 2)", -5.0)
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidDistance { .. }));
    }

    #[test]
    fn distance_only_for_distance_operators() {
        let b = builder();
        assert!(matches!(
            b.spatial(SpatialOperator::Within, "anyGeo", "POINT (1 2)", Some(3.0)),
            Err(BuildError::MisplacedOperator { .. })
        ));
        assert!(matches!(
            b.spatial(SpatialOperator::Beyond, "anyGeo", "POINT (1 2)", None),
            Err(BuildError::MisplacedOperator { .. })
        ));
    }

    #[test]
    fn junction_arity() {
        let b = builder();
        let a = b.comparison(ComparisonOperator::EqualTo, "a", "1").unwrap();

        let err = b.and(vec![a.clone()]).unwrap_err();
        assert_eq!(
            err,
            BuildError::InvalidArity {
                operator: "And".into(),
                expected: "at least 2",
                count: 1
            }
        );
        assert!(matches!(b.or(vec![]), Err(BuildError::InvalidArity { count: 0, .. })));
        assert!(b.and(vec![a.clone(), a]).is_ok());
    }

    #[test]
    fn logical_not_supported() {
        let b = PredicateBuilder::new(Arc::new(CapabilitySet::all().with_logical(false)));
        let a = b.comparison(ComparisonOperator::EqualTo, "a", "1").unwrap();
        assert_eq!(b.not(a.clone()), Err(BuildError::LogicalNotSupported));
        assert_eq!(
            b.or(vec![a.clone(), a]),
            Err(BuildError::LogicalNotSupported)
        );
    }
}
