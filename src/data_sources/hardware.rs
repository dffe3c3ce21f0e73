//! `replicate_hardware` data source.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::client::{Hardware, ReplicateClient};
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};
use crate::validation;

/// Type name of the data source.
pub const TYPE_NAME: &str = "replicate_hardware";

/// Synthetic id reported by every successful read.
pub const DATA_SOURCE_ID: &str = "replicate_hardware";

/// State of the hardware data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareDataSourceModel {
    /// Available hardware, in API order.
    #[serde(default)]
    pub hardware: Vec<HardwareModel>,
    /// Identifier for this data source.
    #[serde(default)]
    pub id: Option<String>,
}

/// One hardware option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareModel {
    /// Name of the hardware option.
    pub name: String,
    /// SKU of the hardware option.
    pub sku: String,
}

impl From<Hardware> for HardwareModel {
    fn from(hw: Hardware) -> Self {
        Self {
            name: hw.name,
            sku: hw.sku,
        }
    }
}

/// Retrieves the hardware options offered by Replicate.
#[derive(Debug, Clone)]
pub struct HardwareDataSource {
    client: Arc<ReplicateClient>,
}

impl HardwareDataSource {
    /// Create the data source around a configured client.
    pub fn new(client: Arc<ReplicateClient>) -> Self {
        Self { client }
    }

    /// Schema of the data source.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Retrieves available hardware for Replicate models")
            .with_attribute(
                "hardware",
                Attribute::computed(AttributeType::list_of_string_objects(&["name", "sku"]))
                    .with_description("List of available hardware options"),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("Identifier for this data source"),
            )
    }

    /// Validate the (empty) configuration.
    pub fn validate(config: &Value) -> Vec<Diagnostic> {
        validation::validate(&Self::schema(), config)
    }

    /// List hardware and build the data source state.
    pub async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        validation::validate_result(&Self::schema(), &config).map_err(ProviderError::InvalidConfig)?;

        let hardware = self
            .client
            .list_hardware()
            .await
            .map_err(|e| ProviderError::client("read hardware options", e))?;

        let data = HardwareDataSourceModel {
            hardware: hardware.into_iter().map(HardwareModel::from).collect(),
            id: Some(DATA_SOURCE_ID.to_string()),
        };

        trace!(count = data.hardware.len(), "read hardware data source");
        Ok(serde_json::to_value(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_is_computed_only() {
        let schema = HardwareDataSource::schema();
        assert!(schema.attribute("hardware").unwrap().flags.is_computed_only());
        assert!(schema.attribute("id").unwrap().flags.is_computed_only());
        assert!(HardwareDataSource::validate(&json!({})).is_empty());
    }

    #[test]
    fn test_model_serialization() {
        let data = HardwareDataSourceModel {
            hardware: vec![HardwareModel::from(Hardware {
                name: "CPU".to_string(),
                sku: "cpu".to_string(),
            })],
            id: Some(DATA_SOURCE_ID.to_string()),
        };

        assert_eq!(
            serde_json::to_value(data).unwrap(),
            json!({"hardware": [{"name": "CPU", "sku": "cpu"}], "id": "replicate_hardware"})
        );
    }
}
