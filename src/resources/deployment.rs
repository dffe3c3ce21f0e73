//! `replicate_deployment` resource.
//!
//! A deployment pins a model version to a hardware SKU with an instance range.
//! Create and Read overwrite local state with what the API returns. Update
//! sends only the settable fields and keeps the planned state as the new
//! state, recomputing `id` alone.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::client::{CreateDeploymentOptions, Deployment, ReplicateClient, UpdateDeploymentOptions};
use crate::error::ProviderError;
use crate::ident::{
    join_owner_name, split_owner_name, MODEL_PATTERN, MODEL_PATTERN_MESSAGE, VERSION_PATTERN,
    VERSION_PATTERN_MESSAGE,
};
use crate::schema::{Attribute, Diagnostic, Schema, Validator};
use crate::types::{ImportedResource, PlanResult};
use crate::validation;

/// Type name of the resource.
pub const TYPE_NAME: &str = "replicate_deployment";

/// State of a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResourceModel {
    /// Account owning the deployment.
    #[serde(default)]
    pub owner: Option<String>,
    /// Deployment name.
    #[serde(default)]
    pub name: Option<String>,
    /// Model identifier, `{model_owner}/{model_name}`.
    #[serde(default)]
    pub model: Option<String>,
    /// Model version id.
    #[serde(default)]
    pub version: Option<String>,
    /// Hardware SKU.
    #[serde(default)]
    pub hardware: Option<String>,
    /// Minimum number of instances.
    #[serde(default)]
    pub min_instances: Option<i64>,
    /// Maximum number of instances.
    #[serde(default)]
    pub max_instances: Option<i64>,
    /// `{owner}/{name}`.
    #[serde(default)]
    pub id: Option<String>,
}

impl DeploymentResourceModel {
    /// Build the full state from an API deployment.
    pub fn from_deployment(deployment: Deployment) -> Self {
        let id = join_owner_name(&deployment.owner, &deployment.name);
        let release = deployment.current_release;
        let config = release.configuration;

        Self {
            owner: Some(deployment.owner),
            name: Some(deployment.name),
            model: Some(release.model),
            version: Some(release.version),
            hardware: Some(config.hardware),
            min_instances: Some(config.min_instances),
            max_instances: Some(config.max_instances),
            id: Some(id),
        }
    }

    /// Body of the create request.
    ///
    /// `owner` is not part of the request: deployments are created under the
    /// token's account and the response says which one that is.
    pub fn create_options(&self) -> Result<CreateDeploymentOptions, ProviderError> {
        Ok(CreateDeploymentOptions {
            name: required(&self.name, "name")?,
            model: required(&self.model, "model")?,
            version: required(&self.version, "version")?,
            hardware: required(&self.hardware, "hardware")?,
            min_instances: required(&self.min_instances, "min_instances")?,
            max_instances: required(&self.max_instances, "max_instances")?,
        })
    }

    /// Body of the update request. Null fields are left out.
    pub fn update_options(&self) -> UpdateDeploymentOptions {
        UpdateDeploymentOptions {
            version: self.version.clone(),
            hardware: self.hardware.clone(),
            min_instances: self.min_instances,
            max_instances: self.max_instances,
        }
    }

    /// The `owner/name` key, from the attributes or else from `id`.
    fn lookup_key(&self) -> Result<(String, String), ProviderError> {
        if let (Some(owner), Some(name)) = (&self.owner, &self.name) {
            return Ok((owner.clone(), name.clone()));
        }
        let id = self.id.clone().unwrap_or_default();
        split_owner_name(&id)
            .map(|(owner, name)| (owner.to_string(), name.to_string()))
            .ok_or_else(|| ProviderError::InvalidId(id.clone()))
    }
}

fn required<T: Clone>(value: &Option<T>, name: &str) -> Result<T, ProviderError> {
    value.clone().ok_or_else(|| {
        ProviderError::InvalidConfig(vec![Diagnostic::error(format!(
            "Missing required attribute '{}'",
            name
        ))
        .with_attribute(name)])
    })
}

/// Manages deployments through the Replicate API.
#[derive(Debug, Clone)]
pub struct DeploymentResource {
    client: Arc<ReplicateClient>,
}

impl DeploymentResource {
    /// Create the resource around a configured client.
    pub fn new(client: Arc<ReplicateClient>) -> Self {
        Self { client }
    }

    /// Schema of the resource.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Manages a Replicate deployment")
            .with_attribute(
                "owner",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The owner of the deployment"),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The name of the deployment"),
            )
            .with_attribute(
                "model",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The model identifier ({model_owner}/{model_name})")
                    .with_validator(Validator::regex_matches(MODEL_PATTERN, MODEL_PATTERN_MESSAGE)),
            )
            .with_attribute(
                "version",
                Attribute::required_string()
                    .with_description("The version ID of the model")
                    .with_validator(Validator::regex_matches(
                        VERSION_PATTERN,
                        VERSION_PATTERN_MESSAGE,
                    )),
            )
            .with_attribute(
                "hardware",
                Attribute::required_string().with_description("The hardware SKU to use"),
            )
            .with_attribute(
                "min_instances",
                Attribute::required_int64()
                    .with_description("The minimum number of instances")
                    .with_validator(Validator::at_least(0)),
            )
            .with_attribute(
                "max_instances",
                Attribute::required_int64()
                    .with_description("The maximum number of instances")
                    .with_validator(Validator::at_least_sum_of(["min_instances"])),
            )
            .with_attribute(
                "id",
                Attribute::computed_string()
                    .with_description("The ID of the deployment ({owner}/{name})"),
            )
    }

    /// Validate a configuration.
    pub fn validate(config: &Value) -> Vec<Diagnostic> {
        validation::validate(&Self::schema(), config)
    }

    /// Plan a create, update or destroy.
    ///
    /// `id` is carried over from prior state and dropped when the change
    /// requires replacement.
    pub fn plan(prior: Option<Value>, proposed: Value) -> Result<PlanResult, ProviderError> {
        let schema = Self::schema();
        let prior = prior.filter(|p| !p.is_null());

        if proposed.is_null() {
            return Ok(match prior {
                Some(prior) => PlanResult::destroy(&schema, &prior),
                None => PlanResult::no_change(Value::Null),
            });
        }

        validation::validate_result(&schema, &proposed).map_err(ProviderError::InvalidConfig)?;

        let mut planned: DeploymentResourceModel = serde_json::from_value(proposed)?;
        planned.id = match &prior {
            Some(prior) => serde_json::from_value::<DeploymentResourceModel>(prior.clone())?.id,
            None => None,
        };

        let plan = PlanResult::diff(&schema, prior.as_ref(), serde_json::to_value(&planned)?);
        if !plan.requires_replace || planned.id.is_none() {
            return Ok(plan);
        }

        planned.id = None;
        Ok(PlanResult::diff(
            &schema,
            prior.as_ref(),
            serde_json::to_value(&planned)?,
        ))
    }

    /// Import by id. Everything else is filled in by the following read.
    pub fn import(id: &str) -> Result<ImportedResource, ProviderError> {
        let state = DeploymentResourceModel {
            id: Some(id.to_string()),
            ..Default::default()
        };
        Ok(ImportedResource::new(TYPE_NAME, serde_json::to_value(state)?))
    }

    /// Create the deployment and return the state reported by the API.
    pub async fn create(&self, planned: Value) -> Result<Value, ProviderError> {
        validation::validate_result(&Self::schema(), &planned).map_err(ProviderError::InvalidConfig)?;

        let data: DeploymentResourceModel = serde_json::from_value(planned)?;
        let options = data.create_options()?;

        let deployment = self
            .client
            .create_deployment(&options)
            .await
            .map_err(|e| {
                error!(name = %options.name, error = %e, "failed to create deployment");
                ProviderError::client("create deployment", e)
            })?;

        let state = DeploymentResourceModel::from_deployment(deployment);
        info!(id = state.id.as_deref().unwrap_or_default(), "created deployment");
        Ok(serde_json::to_value(state)?)
    }

    /// Refresh state from the API, looking the deployment up by `id`.
    pub async fn read(&self, current: Value) -> Result<Value, ProviderError> {
        let data: DeploymentResourceModel = serde_json::from_value(current)?;
        let id = data.id.unwrap_or_default();
        let (owner, name) =
            split_owner_name(&id).ok_or_else(|| ProviderError::InvalidId(id.clone()))?;

        let deployment = self
            .client
            .get_deployment(owner, name)
            .await
            .map_err(|e| ProviderError::client("read deployment", e))?;

        Ok(serde_json::to_value(DeploymentResourceModel::from_deployment(
            deployment,
        ))?)
    }

    /// Apply the planned settings. The response is not merged into state.
    pub async fn update(&self, prior: Value, planned: Value) -> Result<Value, ProviderError> {
        validation::validate_result(&Self::schema(), &planned).map_err(ProviderError::InvalidConfig)?;

        let prior: DeploymentResourceModel = serde_json::from_value(prior)?;
        let mut data: DeploymentResourceModel = serde_json::from_value(planned)?;
        let (owner, name) = match data.lookup_key() {
            Ok(key) => key,
            Err(_) => prior.lookup_key()?,
        };

        self.client
            .update_deployment(&owner, &name, &data.update_options())
            .await
            .map_err(|e| {
                error!(owner = %owner, name = %name, error = %e, "failed to update deployment");
                ProviderError::client("update deployment", e)
            })?;

        data.id = Some(join_owner_name(&owner, &name));
        info!(owner = %owner, name = %name, "updated deployment");
        Ok(serde_json::to_value(data)?)
    }

    /// Delete the deployment.
    pub async fn delete(&self, current: Value) -> Result<(), ProviderError> {
        let data: DeploymentResourceModel = serde_json::from_value(current)?;
        let (owner, name) = data.lookup_key()?;

        self.client
            .delete_deployment(&owner, &name)
            .await
            .map_err(|e| {
                error!(owner = %owner, name = %name, error = %e, "failed to delete deployment");
                ProviderError::client("delete deployment", e)
            })?;

        info!(owner = %owner, name = %name, "deleted deployment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{DeploymentConfiguration, DeploymentRelease};
    use crate::testing::{assert_error_contains, assert_no_errors};
    use proptest::prelude::*;
    use serde_json::json;

    const VERSION: &str = "5c7d5dc6dd8bf75c1acaa8565735e7986bc5b66206b55cca93cb72c9bf15ccaa";

    fn config() -> Value {
        json!({
            "owner": "replicate-testing",
            "name": "web",
            "model": "replicate/hello-world",
            "version": VERSION,
            "hardware": "cpu",
            "min_instances": 0,
            "max_instances": 1
        })
    }

    fn deployment() -> Deployment {
        Deployment {
            owner: "replicate-testing".to_string(),
            name: "web".to_string(),
            current_release: DeploymentRelease {
                number: 1,
                model: "replicate/hello-world".to_string(),
                version: VERSION.to_string(),
                created_at: None,
                configuration: DeploymentConfiguration {
                    hardware: "cpu".to_string(),
                    min_instances: 0,
                    max_instances: 1,
                },
            },
        }
    }

    #[test]
    fn test_validate_accepts_valid_config() {
        assert_no_errors(&DeploymentResource::validate(&config()));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = config();
        cfg["model"] = json!("hello-world");
        assert_error_contains(
            &DeploymentResource::validate(&cfg),
            "Invalid Attribute Value Match",
        );

        let mut cfg = config();
        cfg["version"] = json!("not-hex");
        let diagnostics = DeploymentResource::validate(&cfg);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("version"));

        let mut cfg = config();
        cfg["min_instances"] = json!(-1);
        let diagnostics = DeploymentResource::validate(&cfg);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("min_instances"));

        let mut cfg = config();
        cfg["min_instances"] = json!(3);
        cfg["max_instances"] = json!(2);
        let diagnostics = DeploymentResource::validate(&cfg);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("max_instances"));
    }

    #[test]
    fn test_validate_rejects_float_instance_counts() {
        let mut cfg = config();
        cfg["max_instances"] = json!(1.0);
        let diagnostics = DeploymentResource::validate(&cfg);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("max_instances"));
        assert_error_contains(&diagnostics, "Invalid type for attribute 'max_instances'");

        let mut cfg = config();
        cfg["min_instances"] = json!(0.0);
        let diagnostics = DeploymentResource::validate(&cfg);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("min_instances"));
    }

    #[test]
    fn test_from_deployment_maps_release() {
        let state = DeploymentResourceModel::from_deployment(deployment());
        assert_eq!(state.id.as_deref(), Some("replicate-testing/web"));
        assert_eq!(state.model.as_deref(), Some("replicate/hello-world"));
        assert_eq!(state.hardware.as_deref(), Some("cpu"));
        assert_eq!(state.min_instances, Some(0));
        assert_eq!(state.max_instances, Some(1));
    }

    #[test]
    fn test_create_options_require_fields() {
        let data: DeploymentResourceModel = serde_json::from_value(config()).unwrap();
        let options = data.create_options().unwrap();
        assert_eq!(options.name, "web");
        assert_eq!(options.max_instances, 1);

        let partial = DeploymentResourceModel {
            hardware: None,
            ..data
        };
        let err = partial.create_options().unwrap_err();
        assert_error_contains(&err.to_diagnostics(), "Missing required attribute 'hardware'");
    }

    #[test]
    fn test_update_options_skip_nulls() {
        let data = DeploymentResourceModel {
            hardware: Some("gpu-t4".to_string()),
            max_instances: Some(4),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(data.update_options()).unwrap(),
            json!({"hardware": "gpu-t4", "max_instances": 4})
        );
    }

    #[test]
    fn test_lookup_key_falls_back_to_id() {
        let data = DeploymentResourceModel {
            id: Some("acme/web".to_string()),
            ..Default::default()
        };
        assert_eq!(
            data.lookup_key().unwrap(),
            ("acme".to_string(), "web".to_string())
        );

        let bad = DeploymentResourceModel {
            id: Some("acme".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad.lookup_key(), Err(ProviderError::InvalidId(_))));
    }

    #[test]
    fn test_plan_create() {
        let plan = DeploymentResource::plan(None, config()).unwrap();
        assert!(!plan.requires_replace);
        assert_eq!(plan.changes.len(), 7);
        assert_eq!(plan.planned_state["id"], Value::Null);
    }

    #[test]
    fn test_plan_update_in_place_keeps_id() {
        let prior = serde_json::to_value(DeploymentResourceModel::from_deployment(deployment())).unwrap();
        let mut proposed = config();
        proposed["hardware"] = json!("gpu-t4");

        let plan = DeploymentResource::plan(Some(prior), proposed).unwrap();
        assert!(!plan.requires_replace);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].path, "hardware");
        assert_eq!(plan.planned_state["id"], "replicate-testing/web");
    }

    #[test]
    fn test_plan_model_change_requires_replace() {
        let prior = serde_json::to_value(DeploymentResourceModel::from_deployment(deployment())).unwrap();
        let mut proposed = config();
        proposed["model"] = json!("replicate/other");

        let plan = DeploymentResource::plan(Some(prior), proposed).unwrap();
        assert!(plan.requires_replace);
        assert_eq!(plan.planned_state["id"], Value::Null);
        assert!(plan.changes.iter().any(|c| c.path == "id" && c.after.is_none()));
    }

    #[test]
    fn test_plan_destroy() {
        let prior = serde_json::to_value(DeploymentResourceModel::from_deployment(deployment())).unwrap();
        let plan = DeploymentResource::plan(Some(prior), Value::Null).unwrap();
        assert_eq!(plan.planned_state, Value::Null);
        assert_eq!(plan.changes.len(), 8);
    }

    #[test]
    fn test_plan_rejects_invalid_config() {
        let mut proposed = config();
        proposed["max_instances"] = json!(-5);
        let err = DeploymentResource::plan(None, proposed).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidConfig(_)));
    }

    #[test]
    fn test_import_sets_only_id() {
        let imported = DeploymentResource::import("acme/web").unwrap();
        assert_eq!(imported.resource_type, TYPE_NAME);
        assert_eq!(imported.state["id"], "acme/web");
        assert_eq!(imported.state["owner"], Value::Null);
        assert_eq!(imported.state["max_instances"], Value::Null);
    }

    proptest! {
        #[test]
        fn instance_bounds_validated(min in -3i64..6, max in -3i64..6) {
            let mut cfg = config();
            cfg["min_instances"] = json!(min);
            cfg["max_instances"] = json!(max);
            let valid = DeploymentResource::validate(&cfg).is_empty();
            prop_assert_eq!(valid, min >= 0 && max >= min);
        }
    }
}
