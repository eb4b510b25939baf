//! CQL text rendering of predicate trees.
//!
//! [`CqlWriter::render`] is a single recursive walk with no shared mutable
//! state. It never fails: every tree the builder can produce has a rendering.
//! Relative time windows read the injected [`Clock`], so they are the one
//! node kind whose rendering changes between calls.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::capabilities::ComparisonOperator;
use crate::dialect::SyntaxDialect;
use crate::mapping::PropertyRef;
use crate::predicate::{
    Between, Comparison, Logical, LogicalOperator, PredicateNode, Spatial, Temporal, TemporalKind,
};
use crate::types::{format_decimal, format_timestamp, DistanceUnit, Literal};

/// Spatial reference written in front of every geometry.
pub const SRID: &str = "SRID=4326";

/// Source of "now" for relative time windows.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct CqlWriter {
    dialect: SyntaxDialect,
    unit: DistanceUnit,
    clock: Arc<dyn Clock>,
}

impl Default for CqlWriter {
    fn default() -> Self {
        Self::new(SyntaxDialect::default())
    }
}

impl CqlWriter {
    /// Writer on the system clock with distances in meters.
    pub fn new(dialect: SyntaxDialect) -> Self {
        Self {
            dialect,
            unit: DistanceUnit::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_unit(mut self, unit: DistanceUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn dialect(&self) -> &SyntaxDialect {
        &self.dialect
    }

    pub fn render(&self, node: &PredicateNode) -> String {
        let mut out = String::new();
        self.write_node(&mut out, node);
        out
    }

    fn write_node(&self, out: &mut String, node: &PredicateNode) {
        match node {
            PredicateNode::Comparison(cmp) => self.write_comparison(out, cmp),
            PredicateNode::Between(between) => self.write_between(out, between),
            PredicateNode::Temporal(temporal) => self.write_temporal(out, temporal),
            PredicateNode::Spatial(spatial) => self.write_spatial(out, spatial),
            PredicateNode::Logical(logical) => self.write_logical(out, logical),
        }
    }

    fn write_comparison(&self, out: &mut String, cmp: &Comparison) {
        out.push_str(&self.dialect.property_name(&cmp.property));
        out.push(' ');
        match cmp.operator {
            ComparisonOperator::IsNull => {
                out.push_str(self.dialect.comparison_operator(ComparisonOperator::IsNull));
            }
            ComparisonOperator::Like if !cmp.case_sensitive => {
                out.push_str("ILIKE ");
                out.push_str(&self.literal(&cmp.literal));
            }
            op => {
                out.push_str(self.dialect.comparison_operator(op));
                out.push(' ');
                out.push_str(&self.literal(&cmp.literal));
            }
        }
    }

    fn write_between(&self, out: &mut String, between: &Between) {
        // Range bounds are quoted whatever their type.
        self.write_range(
            out,
            &between.property,
            &between.lower.text(),
            &between.upper.text(),
        );
    }

    fn write_temporal(&self, out: &mut String, temporal: &Temporal) {
        let (start, end) = match temporal.kind {
            TemporalKind::During { start, end } => (start, end),
            TemporalKind::Relative { duration_millis } => {
                let end = self.clock.now();
                (window_start(end, duration_millis), end)
            }
        };
        self.write_range(
            out,
            &temporal.property,
            &format_timestamp(&start),
            &format_timestamp(&end),
        );
    }

    fn write_range(
        &self,
        out: &mut String,
        property: &PropertyRef,
        lower: &str,
        upper: &str,
    ) {
        out.push_str(&self.dialect.property_name(property));
        out.push(' ');
        out.push_str(self.dialect.comparison_operator(ComparisonOperator::Between));
        out.push(' ');
        out.push_str(&single_quote(lower));
        out.push_str(" AND ");
        out.push_str(&single_quote(upper));
    }

    fn write_spatial(&self, out: &mut String, spatial: &Spatial) {
        out.push_str(self.dialect.spatial_keyword(spatial.operator));
        out.push('(');
        out.push_str(&self.dialect.spatial_property(&spatial.property));
        out.push_str(", ");
        out.push_str(SRID);
        out.push(';');
        out.push_str(&spatial.geometry.to_string());
        if let Some(meters) = spatial.distance_meters {
            out.push_str(", ");
            out.push_str(&format_decimal(meters / self.unit.meters_per_unit()));
            out.push_str(", ");
            out.push_str(self.unit.token());
        }
        out.push(')');
    }

    fn write_logical(&self, out: &mut String, logical: &Logical) {
        let keyword = self.dialect.logical_keyword(logical.operator);
        if logical.operator == LogicalOperator::Not {
            out.push_str(keyword);
            out.push_str(" (");
            for child in &logical.children {
                self.write_node(out, child);
            }
            out.push(')');
            return;
        }

        let wrap = self.dialect.parenthesize_junctions;
        if wrap {
            out.push('(');
        }
        for (i, child) in logical.children.iter().enumerate() {
            if i > 0 {
                out.push(' ');
                out.push_str(keyword);
                out.push(' ');
            }
            // Keep precedence when the dialect leaves junctions bare.
            let nested = !wrap && child.is_junction();
            if nested {
                out.push('(');
            }
            self.write_node(out, child);
            if nested {
                out.push(')');
            }
        }
        if wrap {
            out.push(')');
        }
    }

    fn literal(&self, literal: &Literal) -> String {
        if literal.is_numeric() && !self.dialect.quote_numeric_literals {
            literal.text()
        } else {
            single_quote(&literal.text())
        }
    }
}

fn single_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn window_start(end: DateTime<Utc>, duration_millis: i64) -> DateTime<Utc> {
    Duration::try_milliseconds(duration_millis)
        .and_then(|d| end.checked_sub_signed(d))
        .unwrap_or(if duration_millis >= 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}
