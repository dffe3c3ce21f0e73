//! The `replicate` provider.
//!
//! [`ReplicateProvider`] owns the API client built by `configure` and routes
//! every lifecycle verb to the resource or data source named by its type.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::{parse_base_url, ReplicateClient};
use crate::config::{ProviderConfig, PROVIDER_TYPE_NAME};
use crate::data_sources::{hardware, model_version, HardwareDataSource, ModelVersionDataSource};
use crate::error::ProviderError;
use crate::resources::{deployment, DeploymentResource};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities};
use crate::validation;

/// The Replicate provider.
#[derive(Debug)]
pub struct ReplicateProvider {
    version: String,
    client: RwLock<Option<Arc<ReplicateClient>>>,
}

impl ReplicateProvider {
    /// Create an unconfigured provider. `version` is reported in metadata and
    /// the user agent.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            client: RwLock::new(None),
        }
    }

    /// Create a provider that already holds a client.
    pub fn with_client(version: impl Into<String>, client: ReplicateClient) -> Self {
        Self {
            version: version.into(),
            client: RwLock::new(Some(Arc::new(client))),
        }
    }

    /// The provider version.
    pub fn version(&self) -> &str {
        &self.version
    }

    async fn client(&self, kind: &str) -> Result<Arc<ReplicateClient>, ProviderError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or_else(|| ProviderError::unconfigured(kind))
    }

    async fn deployment(&self) -> Result<DeploymentResource, ProviderError> {
        Ok(DeploymentResource::new(self.client("Resource").await?))
    }
}

fn unknown(type_name: &str) -> ProviderError {
    ProviderError::UnknownResource(type_name.to_string())
}

#[async_trait::async_trait]
impl ProviderService for ReplicateProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(ProviderConfig::schema())
            .with_resource(deployment::TYPE_NAME, DeploymentResource::schema())
            .with_data_source(hardware::TYPE_NAME, HardwareDataSource::schema())
            .with_data_source(model_version::TYPE_NAME, ModelVersionDataSource::schema())
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: PROVIDER_TYPE_NAME.to_string(),
            version: self.version.clone(),
            resources: vec![deployment::TYPE_NAME.to_string()],
            data_sources: vec![
                hardware::TYPE_NAME.to_string(),
                model_version::TYPE_NAME.to_string(),
            ],
            capabilities: ServerCapabilities { plan_destroy: true },
        }
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if !diagnostics.is_empty() {
            return Ok(diagnostics);
        }

        let config: ProviderConfig = serde_json::from_value(config)?;
        if let Some(base_url) = &config.base_url {
            if let Err(e) = parse_base_url(base_url) {
                diagnostics.push(
                    Diagnostic::error("Invalid Base URL")
                        .with_detail(e.to_string())
                        .with_attribute("base_url"),
                );
            }
        }
        Ok(diagnostics)
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        // A failed reconfigure must not leave the previous client usable.
        let mut slot = self.client.write().await;
        *slot = None;

        let config: ProviderConfig = serde_json::from_value(config)
            .map_err(|e| ProviderError::Configuration(format!("invalid provider block: {}", e)))?;

        if config.api_token().is_none() {
            return Ok(vec![Diagnostic::error("Missing API Token")
                .with_detail("The api_token attribute is required for the Replicate provider")
                .with_attribute("api_token")]);
        }

        let client = match config.client(&self.version) {
            Ok(client) => client,
            Err(e) => {
                return Ok(vec![Diagnostic::error("Failed to create Replicate client")
                    .with_detail(format!(
                        "An error occurred while creating the Replicate client: {}",
                        e
                    ))])
            }
        };

        info!(base_url = %client.base_url(), "configured Replicate provider");
        *slot = Some(Arc::new(client));
        Ok(vec![])
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        debug!("stopping Replicate provider");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        match resource_type {
            deployment::TYPE_NAME => Ok(DeploymentResource::validate(&config)),
            other => Err(unknown(other)),
        }
    }

    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        match resource_type {
            // Only schema version 0 exists.
            deployment::TYPE_NAME => {
                debug!(version, "upgrading deployment state");
                Ok(state)
            }
            other => Err(unknown(other)),
        }
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        match resource_type {
            deployment::TYPE_NAME => DeploymentResource::plan(prior_state, proposed_state),
            other => Err(unknown(other)),
        }
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        match resource_type {
            deployment::TYPE_NAME => self.deployment().await?.create(planned_state).await,
            other => Err(unknown(other)),
        }
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        match resource_type {
            deployment::TYPE_NAME => self.deployment().await?.read(current_state).await,
            other => Err(unknown(other)),
        }
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        match resource_type {
            deployment::TYPE_NAME => {
                self.deployment()
                    .await?
                    .update(prior_state, planned_state)
                    .await
            }
            other => Err(unknown(other)),
        }
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        match resource_type {
            deployment::TYPE_NAME => self.deployment().await?.delete(current_state).await,
            other => Err(unknown(other)),
        }
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        match resource_type {
            deployment::TYPE_NAME => Ok(vec![DeploymentResource::import(id)?]),
            other => Err(unknown(other)),
        }
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        match data_source_type {
            hardware::TYPE_NAME => Ok(HardwareDataSource::validate(&config)),
            model_version::TYPE_NAME => Ok(ModelVersionDataSource::validate(&config)),
            other => Err(unknown(other)),
        }
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        match data_source_type {
            hardware::TYPE_NAME => {
                HardwareDataSource::new(self.client("Data Source").await?)
                    .read(config)
                    .await
            }
            model_version::TYPE_NAME => {
                ModelVersionDataSource::new(self.client("Data Source").await?)
                    .read(config)
                    .await
            }
            other => Err(unknown(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_error_contains, assert_has_errors, assert_no_errors};
    use serde_json::json;

    #[test]
    fn test_metadata() {
        let provider = ReplicateProvider::new("1.2.3");
        let metadata = provider.metadata();

        assert_eq!(metadata.type_name, "replicate");
        assert_eq!(metadata.version, "1.2.3");
        assert_eq!(metadata.resources, vec!["replicate_deployment"]);
        assert_eq!(
            metadata.data_sources,
            vec!["replicate_hardware", "replicate_model_version"]
        );
        assert!(metadata.capabilities.plan_destroy);
    }

    #[test]
    fn test_schema_lists_every_type() {
        let schema = ReplicateProvider::new("dev").schema();
        assert!(schema.resources.contains_key("replicate_deployment"));
        assert_eq!(schema.data_sources.len(), 2);
        assert!(schema.provider.attribute("api_token").is_some());
    }

    #[tokio::test]
    async fn test_configure_requires_token() {
        let provider = ReplicateProvider::new("dev");

        let diagnostics = provider.configure(json!({})).await.unwrap();
        assert_error_contains(&diagnostics, "Missing API Token");

        let diagnostics = provider.configure(json!({"api_token": ""})).await.unwrap();
        assert_error_contains(&diagnostics, "Missing API Token");
    }

    #[tokio::test]
    async fn test_configure_rejects_malformed_block() {
        let provider = ReplicateProvider::new("dev");
        let err = provider.configure(json!({"api_token": 42})).await.unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert_error_contains(&err.to_diagnostics(), "Provider Configuration Error");
    }

    #[tokio::test]
    async fn test_configure_reports_bad_base_url() {
        let provider = ReplicateProvider::new("dev");
        let diagnostics = provider
            .configure(json!({"api_token": "r8_abc", "base_url": "ftp://example.com"}))
            .await
            .unwrap();
        assert_error_contains(&diagnostics, "Failed to create Replicate client");
        assert!(provider.client("Resource").await.is_err());
    }

    #[tokio::test]
    async fn test_configure_stores_client() {
        let provider = ReplicateProvider::new("dev");
        let diagnostics = provider
            .configure(json!({"api_token": "r8_abc", "base_url": "http://localhost:1/v1"}))
            .await
            .unwrap();
        assert_no_errors(&diagnostics);

        let client = provider.client("Resource").await.unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:1/v1");
    }

    #[tokio::test]
    async fn test_failed_reconfigure_drops_previous_client() {
        let provider = ReplicateProvider::new("dev");
        let diagnostics = provider
            .configure(json!({"api_token": "r8_abc", "base_url": "http://localhost:1/v1"}))
            .await
            .unwrap();
        assert_no_errors(&diagnostics);
        assert!(provider.client("Resource").await.is_ok());

        let diagnostics = provider.configure(json!({"api_token": null})).await.unwrap();
        assert_error_contains(&diagnostics, "Missing API Token");
        assert!(provider.client("Resource").await.is_err());

        provider
            .configure(json!({"api_token": "r8_abc"}))
            .await
            .unwrap();
        let diagnostics = provider
            .configure(json!({"api_token": "r8_abc", "base_url": "ftp://example.com"}))
            .await
            .unwrap();
        assert_error_contains(&diagnostics, "Failed to create Replicate client");
        assert!(provider.client("Resource").await.is_err());
    }

    #[tokio::test]
    async fn test_validate_provider_config() {
        let provider = ReplicateProvider::new("dev");

        let diagnostics = provider
            .validate_provider_config(json!({"api_token": "r8_abc"}))
            .await
            .unwrap();
        assert_no_errors(&diagnostics);

        let diagnostics = provider
            .validate_provider_config(json!({"api_token": "r8_abc", "base_url": "not a url"}))
            .await
            .unwrap();
        assert_error_contains(&diagnostics, "Invalid Base URL");

        let diagnostics = provider.validate_provider_config(json!({})).await.unwrap();
        assert_has_errors(&diagnostics);
    }

    #[tokio::test]
    async fn test_unconfigured_verbs_fail_internally() {
        let provider = ReplicateProvider::new("dev");

        let err = provider
            .read("replicate_deployment", json!({"id": "acme/web"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Internal(_)));

        let err = provider
            .read_data_source("replicate_hardware", json!({}))
            .await
            .unwrap_err();
        assert_error_contains(&err.to_diagnostics(), "Internal Provider Error");
    }

    #[tokio::test]
    async fn test_unknown_types() {
        let provider = ReplicateProvider::new("dev");

        let err = provider.plan("replicate_model", None, json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));

        let err = provider
            .read_data_source("replicate_prediction", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown resource type: replicate_prediction");
    }

    #[tokio::test]
    async fn test_import_needs_no_client() {
        let provider = ReplicateProvider::new("dev");
        let imported = provider
            .import_resource("replicate_deployment", "acme/web")
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].state["id"], "acme/web");
    }
}
