//! CQL syntax variants.
//!
//! Catalog services disagree on a handful of spellings: the not-equal
//! operator, whether AND/OR expressions are wrapped in parentheses, quoting
//! of property names and numbers, and the overlap/touch keywords. A
//! [`SyntaxDialect`] pins each of these; the writer asks it for every token.

use serde::{Deserialize, Serialize};

use crate::capabilities::{ComparisonOperator, SpatialOperator};
use crate::mapping::PropertyRef;
use crate::predicate::LogicalOperator;

/// Named dialect presets, as they appear in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectName {
    #[default]
    Standard,
    Legacy,
}

impl DialectName {
    pub fn dialect(&self) -> SyntaxDialect {
        match self {
            DialectName::Standard => SyntaxDialect::STANDARD,
            DialectName::Legacy => SyntaxDialect::LEGACY,
        }
    }

    /// Parse a preset name.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Some(DialectName::Standard),
            "legacy" => Some(DialectName::Legacy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntaxDialect {
    /// `<>` or `!=`.
    pub not_equal: &'static str,
    /// Wrap every AND/OR expression in parentheses. When false, only AND/OR
    /// expressions nested inside another AND/OR are wrapped.
    pub parenthesize_junctions: bool,
    /// Double-quote ordinary property names. The identifier field is always quoted.
    pub quote_property_names: bool,
    /// Double-quote the geometry property of spatial predicates.
    pub quote_spatial_property: bool,
    /// Single-quote numeric literals like strings.
    pub quote_numeric_literals: bool,
    /// `OVERLAP`/`TOUCH` instead of `OVERLAPS`/`TOUCHES`.
    pub short_spatial_keywords: bool,
}

impl SyntaxDialect {
    pub const STANDARD: SyntaxDialect = SyntaxDialect {
        not_equal: "<>",
        parenthesize_junctions: false,
        quote_property_names: false,
        quote_spatial_property: true,
        quote_numeric_literals: true,
        short_spatial_keywords: false,
    };

    pub const LEGACY: SyntaxDialect = SyntaxDialect {
        not_equal: "!=",
        parenthesize_junctions: true,
        quote_property_names: true,
        quote_spatial_property: true,
        quote_numeric_literals: false,
        short_spatial_keywords: true,
    };

    pub fn comparison_operator(&self, op: ComparisonOperator) -> &'static str {
        match op {
            ComparisonOperator::EqualTo => "=",
            ComparisonOperator::NotEqualTo => self.not_equal,
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqualTo => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqualTo => "<=",
            ComparisonOperator::Like => "LIKE",
            ComparisonOperator::IsNull => "IS NULL",
            ComparisonOperator::Between => "BETWEEN",
        }
    }

    pub fn spatial_keyword(&self, op: SpatialOperator) -> &'static str {
        match op {
            SpatialOperator::Intersects => "INTERSECTS",
            SpatialOperator::Crosses => "CROSSES",
            SpatialOperator::Within => "WITHIN",
            SpatialOperator::Contains => "CONTAINS",
            SpatialOperator::Beyond => "BEYOND",
            SpatialOperator::DWithin => "DWITHIN",
            SpatialOperator::Disjoint => "DISJOINT",
            SpatialOperator::Overlaps if self.short_spatial_keywords => "OVERLAP",
            SpatialOperator::Overlaps => "OVERLAPS",
            SpatialOperator::Touches if self.short_spatial_keywords => "TOUCH",
            SpatialOperator::Touches => "TOUCHES",
        }
    }

    pub fn logical_keyword(&self, op: LogicalOperator) -> &'static str {
        match op {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
            LogicalOperator::Not => "NOT",
        }
    }

    /// Property name as written on the left of a comparison.
    pub fn property_name(&self, property: &PropertyRef) -> String {
        if property.is_identifier || self.quote_property_names {
            double_quote(&property.field)
        } else {
            property.field.clone()
        }
    }

    /// Geometry reference as written as the first spatial argument.
    pub fn spatial_property(&self, property: &PropertyRef) -> String {
        if self.quote_spatial_property {
            double_quote(&property.field)
        } else {
            property.field.clone()
        }
    }
}

impl Default for SyntaxDialect {
    fn default() -> Self {
        SyntaxDialect::STANDARD
    }
}

fn double_quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(field: &str, is_identifier: bool) -> PropertyRef {
        PropertyRef {
            logical: field.to_string(),
            field: field.to_string(),
            is_identifier,
        }
    }

    #[test]
    fn not_equal_spelling_differs() {
        assert_eq!(
            SyntaxDialect::STANDARD.comparison_operator(ComparisonOperator::NotEqualTo),
            "<>"
        );
        assert_eq!(
            SyntaxDialect::LEGACY.comparison_operator(ComparisonOperator::NotEqualTo),
            "!="
        );
    }

    #[test]
    fn spatial_keyword_spelling_differs() {
        assert_eq!(
            SyntaxDialect::STANDARD.spatial_keyword(SpatialOperator::Overlaps),
            "OVERLAPS"
        );
        assert_eq!(
            SyntaxDialect::LEGACY.spatial_keyword(SpatialOperator::Touches),
            "TOUCH"
        );
    }

    #[test]
    fn identifier_always_quoted() {
        assert_eq!(
            SyntaxDialect::STANDARD.property_name(&prop("id", true)),
            "\"id\""
        );
        assert_eq!(SyntaxDialect::STANDARD.property_name(&prop("title", false)), "title");
        assert_eq!(
            SyntaxDialect::LEGACY.property_name(&prop("title", false)),
            "\"title\""
        );
    }

    #[test]
    fn preset_names() {
        assert_eq!(DialectName::parse("Legacy"), Some(DialectName::Legacy));
        assert_eq!(DialectName::parse("ecql2"), None);
        assert_eq!(DialectName::default().dialect(), SyntaxDialect::default());
    }
}
