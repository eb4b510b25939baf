//! Per-source configuration.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::builder::PredicateBuilder;
use crate::capabilities::CapabilitySet;
use crate::dialect::DialectName;
use crate::error::ConfigError;
use crate::loader::load_document;
use crate::mapping::PropertyMapping;
use crate::types::{AxisOrder, DistanceUnit};
use crate::writer::CqlWriter;

/// Everything a source needs besides its capabilities.
///
/// All keys are optional:
///
/// ```json
/// {
///   "axisOrder": "LON_LAT",
///   "dialect": "legacy",
///   "distanceUnit": "kilometers",
///   "mapping": { "freeTextField": "csw:AnyText" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceConfig {
    pub axis_order: AxisOrder,
    pub dialect: DialectName,
    pub distance_unit: DistanceUnit,
    pub mapping: PropertyMapping,
}

impl SourceConfig {
    pub fn from_value(document: &Value) -> Result<Self, ConfigError> {
        serde_json::from_value(document.clone()).map_err(|source| ConfigError::Invalid {
            what: "source configuration",
            source,
        })
    }

    /// Builder bound to one capability snapshot.
    pub fn builder(&self, capabilities: Arc<CapabilitySet>) -> PredicateBuilder {
        PredicateBuilder::new(capabilities)
            .with_mapping(self.mapping.clone())
            .with_axis_order(self.axis_order)
    }

    /// Writer on the system clock.
    pub fn writer(&self) -> CqlWriter {
        CqlWriter::new(self.dialect.dialect()).with_unit(self.distance_unit)
    }
}

/// Load a source configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<SourceConfig, ConfigError> {
    let document = load_document(path)?;
    SourceConfig::from_value(&document)
}
