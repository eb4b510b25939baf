//! Source-agnostic query expressions.
//!
//! A [`QueryExpr`] is what a federated caller hands over: a typed tree with
//! logical property names, dates as text or epoch milliseconds, and WKT
//! strings. Building it through a [`PredicateBuilder`] checks it against the
//! source's capabilities and resolves names, producing a [`PredicateNode`].
//!
//! ```json
//! {
//!   "op": "and",
//!   "children": [
//!     { "op": "compare", "operator": "Like", "property": "anyText",
//!       "value": { "type": "string", "value": "*bar*" } },
//!     { "op": "during", "property": "modified",
//!       "start": "2013-05-01", "end": "2013-12-31" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::builder::PredicateBuilder;
use crate::capabilities::{ComparisonOperator, SpatialOperator};
use crate::error::{BuildError, ConfigError};
use crate::predicate::PredicateNode;
use crate::types::{DateInput, Distance, DistanceUnit, Literal};

/// A literal as it arrives in a query document; dates are not yet parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum LiteralValue {
    String(String),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    /// Text date or epoch milliseconds as a JSON number.
    Date(DateInput),
}

impl LiteralValue {
    /// Convert to a typed literal, parsing dates.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::LiteralCoercion` for unparseable dates.
    pub fn to_literal(&self) -> Result<Literal, BuildError> {
        Ok(match self {
            LiteralValue::String(s) => Literal::Str(s.clone()),
            LiteralValue::Short(v) => Literal::Short(*v),
            LiteralValue::Int(v) => Literal::Int(*v),
            LiteralValue::Long(v) => Literal::Long(*v),
            LiteralValue::Float(v) => Literal::Float(*v),
            LiteralValue::Double(v) => Literal::Double(*v),
            LiteralValue::Bool(v) => Literal::Bool(*v),
            LiteralValue::Date(d) => Literal::Date(d.to_datetime()?),
        })
    }
}

fn case_sensitive_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum QueryExpr {
    Compare {
        operator: ComparisonOperator,
        property: String,
        /// Omitted for `IsNull`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<LiteralValue>,
        #[serde(rename = "caseSensitive", default = "case_sensitive_default")]
        case_sensitive: bool,
    },
    Between {
        property: String,
        lower: LiteralValue,
        upper: LiteralValue,
    },
    During {
        property: String,
        start: DateInput,
        end: DateInput,
    },
    Relative {
        property: String,
        #[serde(rename = "durationMillis")]
        duration_millis: i64,
    },
    Spatial {
        operator: SpatialOperator,
        property: String,
        wkt: String,
        /// Required for `Beyond` and `DWithin`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        distance: Option<f64>,
        /// Unit of `distance`; meters when omitted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<DistanceUnit>,
    },
    And {
        children: Vec<QueryExpr>,
    },
    Or {
        children: Vec<QueryExpr>,
    },
    Not {
        child: Box<QueryExpr>,
    },
}

impl QueryExpr {
    /// Deserialize a query document.
    pub fn from_value(document: &Value) -> Result<Self, ConfigError> {
        serde_json::from_value(document.clone()).map_err(|source| ConfigError::Invalid {
            what: "query",
            source,
        })
    }
}

impl PredicateBuilder {
    /// Build a predicate tree from a query expression.
    ///
    /// # Errors
    ///
    /// Returns the first `BuildError` met while walking the expression,
    /// depth first.
    pub fn build(&self, expr: &QueryExpr) -> Result<PredicateNode, BuildError> {
        let node = self.build_node(expr)?;
        tracing::debug!(root = node_kind(&node), "built predicate tree");
        Ok(node)
    }

    fn build_node(&self, expr: &QueryExpr) -> Result<PredicateNode, BuildError> {
        match expr {
            QueryExpr::Compare {
                operator,
                property,
                value,
                case_sensitive,
            } => {
                let literal = match (value, operator) {
                    (Some(value), _) => value.to_literal()?,
                    (None, ComparisonOperator::IsNull) => return self.is_null(property),
                    (None, op) => {
                        return Err(BuildError::MisplacedOperator {
                            operator: op.to_string(),
                            hint: "a value is required",
                        })
                    }
                };
                self.comparison_with_case(*operator, property, literal, *case_sensitive)
            }
            QueryExpr::Between {
                property,
                lower,
                upper,
            } => self.between(property, lower.to_literal()?, upper.to_literal()?),
            QueryExpr::During {
                property,
                start,
                end,
            } => self.during(property, start.to_datetime()?, end.to_datetime()?),
            QueryExpr::Relative {
                property,
                duration_millis,
            } => self.relative(property, *duration_millis),
            QueryExpr::Spatial {
                operator,
                property,
                wkt,
                distance,
                unit,
            } => {
                let meters = distance
                    .map(|value| Distance::new(value, unit.unwrap_or_default()).meters());
                self.spatial(*operator, property, wkt, meters)
            }
            QueryExpr::And { children } => self.and(self.build_all(children)?),
            QueryExpr::Or { children } => self.or(self.build_all(children)?),
            QueryExpr::Not { child } => self.not(self.build_node(child)?),
        }
    }

    fn build_all(&self, children: &[QueryExpr]) -> Result<Vec<PredicateNode>, BuildError> {
        children.iter().map(|child| self.build_node(child)).collect()
    }
}

fn node_kind(node: &PredicateNode) -> &'static str {
    match node {
        PredicateNode::Comparison(_) => "comparison",
        PredicateNode::Between(_) => "between",
        PredicateNode::Temporal(_) => "temporal",
        PredicateNode::Spatial(_) => "spatial",
        PredicateNode::Logical(_) => "logical",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilitySet;
    use serde_json::json;
    use std::sync::Arc;

    fn builder() -> PredicateBuilder {
        PredicateBuilder::new(Arc::new(CapabilitySet::all()))
    }

    #[test]
    fn deserializes_tagged_tree() {
        let expr = QueryExpr::from_value(&json!({
            "op": "not",
            "child": {
                "op": "compare",
                "operator": "EqualTo",
                "property": "title",
                "value": { "type": "int", "value": 5 }
            }
        }))
        .unwrap();

        assert_eq!(
            expr,
            QueryExpr::Not {
                child: Box::new(QueryExpr::Compare {
                    operator: ComparisonOperator::EqualTo,
                    property: "title".into(),
                    value: Some(LiteralValue::Int(5)),
                    case_sensitive: true,
                })
            }
        );
    }

    #[test]
    fn rejects_unknown_op() {
        let err = QueryExpr::from_value(&json!({ "op": "xor", "children": [] })).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { what: "query", .. }));
    }

    #[test]
    fn bad_date_is_a_coercion_error() {
        let expr = QueryExpr::During {
            property: "modified".into(),
            start: "yesterday".into(),
            end: "2013-12-31".into(),
        };
        let err = builder().build(&expr).unwrap_err();
        assert!(matches!(err, BuildError::LiteralCoercion { .. }));
    }

    #[test]
    fn epoch_millis_must_be_numbers() {
        let expr = QueryExpr::from_value(&json!({
            "op": "during", "property": "modified",
            "start": 1367366400000i64, "end": "2013-12-31"
        }))
        .unwrap();
        assert!(builder().build(&expr).is_ok());

        let expr = QueryExpr::from_value(&json!({
            "op": "compare", "operator": "EqualTo", "property": "created",
            "value": { "type": "date", "value": "2013" }
        }))
        .unwrap();
        assert!(matches!(
            builder().build(&expr),
            Err(BuildError::LiteralCoercion { .. })
        ));
    }

    #[test]
    fn missing_value_needs_is_null() {
        let expr = QueryExpr::Compare {
            operator: ComparisonOperator::IsNull,
            property: "title".into(),
            value: None,
            case_sensitive: true,
        };
        assert!(builder().build(&expr).is_ok());

        let expr = QueryExpr::Compare {
            operator: ComparisonOperator::EqualTo,
            property: "title".into(),
            value: None,
            case_sensitive: true,
        };
        assert!(matches!(
            builder().build(&expr),
            Err(BuildError::MisplacedOperator { .. })
        ));
    }

    #[test]
    fn nested_failure_propagates() {
        let expr = QueryExpr::And {
            children: vec![
                QueryExpr::Relative {
                    property: "modified".into(),
                    duration_millis: 1000,
                },
                QueryExpr::Spatial {
                    operator: SpatialOperator::Intersects,
                    property: "anyGeo".into(),
                    wkt: "POINT (1 2)".into(),
                    distance: None,
                    unit: None,
                },
            ],
        };
        let caps = CapabilitySet::all().without_spatial(SpatialOperator::Intersects);
        let err = PredicateBuilder::new(Arc::new(caps)).build(&expr).unwrap_err();
        assert_eq!(
            err,
            BuildError::UnsupportedOperator {
                operator: "Intersects".into()
            }
        );
    }
}
