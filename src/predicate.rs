//! The predicate tree produced by the builder and walked by the writer.
//!
//! Nodes are immutable. Fields are private and only [`PredicateBuilder`]
//! creates nodes, so a logical node always has a legal number of children.
//!
//! [`PredicateBuilder`]: crate::PredicateBuilder

use chrono::{DateTime, Utc};

use crate::capabilities::{ComparisonOperator, SpatialOperator};
use crate::geometry::Wkt;
use crate::mapping::PropertyRef;
use crate::types::Literal;

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    Comparison(Comparison),
    Between(Between),
    Temporal(Temporal),
    Spatial(Spatial),
    Logical(Logical),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub(crate) operator: ComparisonOperator,
    pub(crate) property: PropertyRef,
    pub(crate) literal: Literal,
    pub(crate) case_sensitive: bool,
}

impl Comparison {
    pub fn operator(&self) -> ComparisonOperator {
        self.operator
    }

    pub fn property(&self) -> &PropertyRef {
        &self.property
    }

    /// Ignored by the writer when the operator is `IsNull`.
    pub fn literal(&self) -> &Literal {
        &self.literal
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Between {
    pub(crate) property: PropertyRef,
    pub(crate) lower: Literal,
    pub(crate) upper: Literal,
}

impl Between {
    pub fn property(&self) -> &PropertyRef {
        &self.property
    }

    pub fn lower(&self) -> &Literal {
        &self.lower
    }

    pub fn upper(&self) -> &Literal {
        &self.upper
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemporalKind {
    /// Absolute window; `start > end` is accepted as given.
    During {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Window ending "now"; bounds are computed when rendering.
    Relative { duration_millis: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Temporal {
    pub(crate) property: PropertyRef,
    pub(crate) kind: TemporalKind,
}

impl Temporal {
    pub fn property(&self) -> &PropertyRef {
        &self.property
    }

    pub fn kind(&self) -> &TemporalKind {
        &self.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spatial {
    pub(crate) operator: SpatialOperator,
    pub(crate) property: PropertyRef,
    /// Positions already latitude-first.
    pub(crate) geometry: Wkt,
    /// Meters; present exactly for `Beyond` and `DWithin`.
    pub(crate) distance_meters: Option<f64>,
}

impl Spatial {
    pub fn operator(&self) -> SpatialOperator {
        self.operator
    }

    pub fn property(&self) -> &PropertyRef {
        &self.property
    }

    pub fn geometry(&self) -> &Wkt {
        &self.geometry
    }

    pub fn distance_meters(&self) -> Option<f64> {
        self.distance_meters
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

impl std::fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// `Not` holds exactly one child, `And`/`Or` at least two.
#[derive(Debug, Clone, PartialEq)]
pub struct Logical {
    pub(crate) operator: LogicalOperator,
    pub(crate) children: Vec<PredicateNode>,
}

impl Logical {
    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    pub fn children(&self) -> &[PredicateNode] {
        &self.children
    }
}

impl PredicateNode {
    /// True for `And`/`Or` nodes.
    pub fn is_junction(&self) -> bool {
        matches!(
            self,
            PredicateNode::Logical(Logical {
                operator: LogicalOperator::And | LogicalOperator::Or,
                ..
            })
        )
    }
}
