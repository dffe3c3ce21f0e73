//! `replicate_model_version` data source.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::client::{ModelVersion, ReplicateClient};
use crate::error::ProviderError;
use crate::ident::{split_owner_name, MODEL_PATTERN, MODEL_PATTERN_MESSAGE};
use crate::schema::{Attribute, AttributeType, Diagnostic, Schema, Validator};
use crate::validation;

/// Type name of the data source.
pub const TYPE_NAME: &str = "replicate_model_version";

/// State of the model version data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersionDataSourceModel {
    /// Model identifier, `{model_owner}/{model_name}`.
    #[serde(default)]
    pub model: Option<String>,
    /// Versions of the model.
    #[serde(default)]
    pub versions: Vec<ModelVersionModel>,
    /// Identifier for this data source, `{model}/versions`.
    #[serde(default)]
    pub id: Option<String>,
}

/// One model version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersionModel {
    /// The ID of the model version.
    pub id: String,
    /// The creation time of the model version.
    pub created_at: String,
    /// The Cog version used for this model version.
    pub cog_version: String,
}

impl From<ModelVersion> for ModelVersionModel {
    fn from(version: ModelVersion) -> Self {
        Self {
            id: version.id,
            created_at: version.created_at,
            cog_version: version.cog_version,
        }
    }
}

/// The user-supplied half of the data source. Computed attributes may arrive
/// as null and are never read back.
#[derive(Debug, Deserialize)]
struct ModelVersionConfig {
    model: String,
}

/// Retrieves the versions of one model.
#[derive(Debug, Clone)]
pub struct ModelVersionDataSource {
    client: Arc<ReplicateClient>,
}

impl ModelVersionDataSource {
    /// Create the data source around a configured client.
    pub fn new(client: Arc<ReplicateClient>) -> Self {
        Self { client }
    }

    /// Schema of the data source.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Retrieves versions of a specific Replicate model")
            .with_attribute(
                "model",
                Attribute::required_string()
                    .with_description("Model identifier ({model_owner}/{model_name})")
                    .with_validator(Validator::regex_matches(MODEL_PATTERN, MODEL_PATTERN_MESSAGE)),
            )
            .with_attribute(
                "versions",
                Attribute::computed(AttributeType::list_of_string_objects(&[
                    "id",
                    "created_at",
                    "cog_version",
                ]))
                .with_description("List of model versions"),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("Identifier for this data source"),
            )
    }

    /// Validate the configuration.
    pub fn validate(config: &Value) -> Vec<Diagnostic> {
        validation::validate(&Self::schema(), config)
    }

    /// List the model's versions and build the data source state.
    pub async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        validation::validate_result(&Self::schema(), &config).map_err(ProviderError::InvalidConfig)?;

        let ModelVersionConfig { model } = serde_json::from_value(config)?;
        let (owner, name) =
            split_owner_name(&model).ok_or_else(|| ProviderError::InvalidModel(model.clone()))?;

        let page = self
            .client
            .list_model_versions(owner, name)
            .await
            .map_err(|e| ProviderError::client("read model versions", e))?;

        let data = ModelVersionDataSourceModel {
            id: Some(format!("{}/versions", model)),
            versions: page.results.into_iter().map(ModelVersionModel::from).collect(),
            model: Some(model),
        };

        trace!(id = ?data.id, count = data.versions.len(), "read model version data source");
        Ok(serde_json::to_value(data)?)
    }
}
