//! Provider configuration.
//!
//! The provider block accepts an API token and an optional base URL:
//!
//! ```hcl
//! provider "replicate" {
//!   api_token = var.replicate_api_token
//!   base_url  = "https://api.replicate.com/v1"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::client::{ApiError, ReplicateClient};
use crate::schema::{Attribute, Schema};

/// Provider type name; resources and data sources are prefixed with it.
pub const PROVIDER_TYPE_NAME: &str = "replicate";

/// Base URL used when `base_url` is not configured.
pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";

/// Product part of the `User-Agent` header.
pub const USER_AGENT_PREFIX: &str = "terraform-provider-replicate";

/// `User-Agent` for a provider `version`, e.g. `terraform-provider-replicate/dev`.
pub fn user_agent(version: &str) -> String {
    format!("{}/{}", USER_AGENT_PREFIX, version)
}

/// Environment variable holding the token used by live acceptance tests.
pub const ENV_ACC_API_TOKEN: &str = "REPLICATE_API_TOKEN";

/// Decoded provider configuration block.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Replicate API token.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Replicate API base URL.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderConfig {
    /// Schema of the provider configuration block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Interact with the Replicate API")
            .with_attribute(
                "api_token",
                Attribute::required_string()
                    .sensitive()
                    .with_description("Replicate API token for authentication"),
            )
            .with_attribute(
                "base_url",
                Attribute::optional_string().with_description("Replicate API base URL"),
            )
    }

    /// The API token, if set and non-empty.
    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref().filter(|token| !token.is_empty())
    }

    /// Build a client from this configuration.
    ///
    /// `version` is appended to the user agent, e.g. `dev` or a release tag.
    pub fn client(&self, version: &str) -> Result<ReplicateClient, ApiError> {
        let mut builder = ReplicateClient::builder(self.api_token().unwrap_or_default())
            .user_agent(user_agent(version));
        if let Some(base_url) = &self.base_url {
            builder = builder.base_url(base_url.clone());
        }
        builder.build()
    }
}
