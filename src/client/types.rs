//! Request and response bodies of the Replicate HTTP API.

use serde::{Deserialize, Serialize};

/// A hardware tier offered by Replicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hardware {
    /// Display name, e.g. "Nvidia T4 GPU".
    pub name: String,
    /// SKU used when creating deployments, e.g. "gpu-t4".
    pub sku: String,
}

/// A version of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Version id (hex string).
    pub id: String,
    /// Creation timestamp as returned by the API.
    #[serde(default)]
    pub created_at: String,
    /// Version of Cog used to build this model version.
    #[serde(default)]
    pub cog_version: String,
}

/// One page of a paginated list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// URL of the previous page, if any.
    #[serde(default)]
    pub previous: Option<String>,
    /// URL of the next page, if any.
    #[serde(default)]
    pub next: Option<String>,
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// A deployment as returned by create, get and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Account owning the deployment.
    pub owner: String,
    /// Deployment name, unique per owner.
    pub name: String,
    /// The active release.
    pub current_release: DeploymentRelease,
}

/// The canonical snapshot of a deployment's active configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRelease {
    /// Release number, incremented on every update.
    #[serde(default)]
    pub number: i64,
    /// Model identifier, `owner/name`.
    pub model: String,
    /// Model version id.
    pub version: String,
    /// Creation timestamp as returned by the API.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Hardware and scaling settings.
    pub configuration: DeploymentConfiguration,
}

/// Hardware and scaling settings of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfiguration {
    /// Hardware SKU.
    pub hardware: String,
    /// Minimum number of instances.
    pub min_instances: i64,
    /// Maximum number of instances.
    pub max_instances: i64,
}

/// Body of `POST /deployments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDeploymentOptions {
    /// Deployment name.
    pub name: String,
    /// Model identifier, `owner/name`.
    pub model: String,
    /// Model version id.
    pub version: String,
    /// Hardware SKU.
    pub hardware: String,
    /// Minimum number of instances.
    pub min_instances: i64,
    /// Maximum number of instances.
    pub max_instances: i64,
}

/// Body of `PATCH /deployments/{owner}/{name}`.
///
/// `None` means "leave unchanged"; such fields are left out of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UpdateDeploymentOptions {
    /// New model version id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// New hardware SKU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<String>,
    /// New minimum number of instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_instances: Option<i64>,
    /// New maximum number of instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_instances: Option<i64>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_options_skip_absent_fields() {
        let opts = UpdateDeploymentOptions {
            hardware: Some("gpu-t4".to_string()),
            min_instances: Some(0),
            ..Default::default()
        };

        let body = serde_json::to_value(&opts).unwrap();
        assert_eq!(body, json!({"hardware": "gpu-t4", "min_instances": 0}));
        assert_eq!(
            serde_json::to_value(UpdateDeploymentOptions::default()).unwrap(),
            json!({})
        );
    }

    #[test]
    fn test_deployment_decodes_api_shape() {
        let deployment: Deployment = serde_json::from_value(json!({
            "owner": "replicate-testing",
            "name": "hello",
            "current_release": {
                "number": 3,
                "model": "replicate/hello-world",
                "version": "5c7d5dc6dd8bf75c",
                "created_at": "2024-02-15T16:32:57.018467Z",
                "created_by": {"type": "organization", "username": "replicate-testing"},
                "configuration": {
                    "hardware": "gpu-t4",
                    "min_instances": 2,
                    "max_instances": 4
                }
            }
        }))
        .unwrap();

        assert_eq!(deployment.current_release.number, 3);
        assert_eq!(deployment.current_release.configuration.hardware, "gpu-t4");
        assert_eq!(deployment.current_release.configuration.max_instances, 4);
    }

    #[test]
    fn test_page_tolerates_missing_links() {
        let page: Page<ModelVersion> = serde_json::from_value(json!({
            "results": [{"id": "abc", "created_at": "2024-01-01T00:00:00Z", "cog_version": "0.9.4"}]
        }))
        .unwrap();

        assert!(page.next.is_none());
        assert_eq!(page.results[0].cog_version, "0.9.4");
    }
}
