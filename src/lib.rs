//! Catalog CQL
//!
//! Builds filter predicates for a federated catalog source and renders them
//! as CQL text.
//!
//! A remote catalog service advertises which filter operators and geometry
//! operands it accepts. That advertisement becomes a [`CapabilitySet`]; a
//! [`PredicateBuilder`] refuses anything outside it, resolves logical
//! property names through a [`PropertyMapping`], and normalises geometry to
//! latitude-first order. The resulting [`PredicateNode`] tree is rendered by a
//! [`CqlWriter`] in one of the [`SyntaxDialect`]s remote services expect.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use catalog_cql::{CapabilitySet, ComparisonOperator, CqlWriter, PredicateBuilder};
//! use serde_json::json;
//!
//! let caps = CapabilitySet::from_value(&json!({
//!     "comparisonOperators": ["EqualTo", "Like"],
//!     "spatialOperators": ["DWithin"],
//!     "logicalOperators": true
//! }))
//! .unwrap();
//!
//! let builder = PredicateBuilder::new(Arc::new(caps));
//! let node = builder
//!     .and(vec![
//!         builder.comparison(ComparisonOperator::EqualTo, "title", "1").unwrap(),
//!         builder.dwithin("anyGeo", "POINT (30 30)", 123.456).unwrap(),
//!     ])
//!     .unwrap();
//!
//! assert_eq!(
//!     CqlWriter::default().render(&node),
//!     r#"title = '1' AND DWITHIN("BBOX", SRID=4326;POINT (30 30), 123.456, meters)"#
//! );
//!
//! // Operators the source does not advertise are rejected before rendering.
//! assert!(builder.intersects("anyGeo", "POINT (30 30)").is_err());
//! ```
//!
//! # Dialects
//!
//! | Axis | `standard` | `legacy` |
//! |------|------------|----------|
//! | not equal | `<>` | `!=` |
//! | AND/OR | bare | parenthesised |
//! | property names | bare (identifier quoted) | quoted |
//! | numbers | `'1.0'` | `1.0` |
//! | overlap/touch | `OVERLAPS`/`TOUCHES` | `OVERLAP`/`TOUCH` |

mod builder;
mod capabilities;
mod config;
mod dialect;
mod error;
mod geometry;
mod loader;
mod mapping;
mod predicate;
mod query;
mod types;
mod writer;

pub use builder::PredicateBuilder;
pub use capabilities::{
    CapabilityRegistry, CapabilitySet, ComparisonOperator, GeometryKind, SpatialOperator,
};
pub use config::{load_config, SourceConfig};
pub use dialect::{DialectName, SyntaxDialect};
pub use error::{BuildError, CapabilityError, ConfigError, LoadError, QueryBuildError};
pub use geometry::{Position, Shape, Wkt};
pub use loader::{is_url, load_capabilities, load_document, load_document_auto, load_document_str};
pub use mapping::{PropertyMapping, PropertyRef};
pub use predicate::{
    Between, Comparison, Logical, LogicalOperator, PredicateNode, Spatial, Temporal, TemporalKind,
};
pub use query::{LiteralValue, QueryExpr};
pub use types::{
    format_timestamp, from_epoch_millis, parse_date, AxisOrder, DateInput, Distance, DistanceUnit,
    Literal,
};
pub use writer::{Clock, CqlWriter, FixedClock, SystemClock, SRID};

#[cfg(feature = "remote")]
pub use loader::load_document_url;

/// Logical property names with built-in mappings.
pub mod properties {
    pub use crate::mapping::{ANY_GEO, ANY_TEXT, CONTENT_TYPE, CREATED, EFFECTIVE, ID, MODIFIED};
}
