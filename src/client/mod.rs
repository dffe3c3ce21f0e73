//! HTTP client for the Replicate API.
//!
//! A thin typed wrapper over `reqwest`: one method per endpoint the provider
//! needs, bearer-token auth, JSON bodies. It never retries and never
//! classifies failures; callers get the raw [`ApiError`].

mod types;

pub use types::{
    CreateDeploymentOptions, Deployment, DeploymentConfiguration, DeploymentRelease, Hardware,
    ModelVersion, Page, UpdateDeploymentOptions,
};

use std::fmt;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::config::{user_agent, DEFAULT_BASE_URL};
use types::ErrorBody;

/// Maximum length of a response body written to the log.
const MAX_LOG_BODY_LENGTH: usize = 200;

const NO_BODY: Option<&()> = None;

/// Errors returned by [`ReplicateClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL cannot be used.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No API token was supplied.
    #[error("API token is empty")]
    MissingToken,

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request could not be sent or the response could not be read.
    #[error("{method} {url}: {source}")]
    Transport {
        /// HTTP method.
        method: Method,
        /// Request URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("{title} ({status}): {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Short error title from the response, or the status reason.
        title: String,
        /// Error detail from the response, or the raw body.
        detail: String,
    },

    /// The response body did not have the expected shape.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        /// Request URL.
        url: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// The HTTP status, if the API answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the API answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let title = parsed
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("HTTP error").to_string());
        let detail = parsed
            .detail
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| body.trim().to_string());

        Self::Status {
            status: status.as_u16(),
            title,
            detail,
        }
    }
}

/// Truncate and strip control characters from a body before logging it.
fn sanitize_for_log(body: &str) -> String {
    let char_count = body.chars().count();
    let truncated = if char_count > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Builder for [`ReplicateClient`].
#[derive(Clone)]
pub struct ClientBuilder {
    token: String,
    base_url: Option<String>,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Use a different API base URL (default: [`DEFAULT_BASE_URL`]).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the `User-Agent` header (default: this crate's version).
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ReplicateClient, ApiError> {
        if self.token.is_empty() {
            return Err(ApiError::MissingToken);
        }

        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let base_url = parse_base_url(raw)?;

        let http = reqwest::Client::builder()
            .user_agent(
                self.user_agent
                    .unwrap_or_else(|| user_agent(env!("CARGO_PKG_VERSION"))),
            )
            .build()
            .map_err(ApiError::Build)?;

        Ok(ReplicateClient {
            http,
            base_url,
            token: self.token,
        })
    }
}

/// Parse and check an API base URL.
pub fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base".to_string()));
    }
    Ok(url)
}

/// Authenticated client for the Replicate API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ReplicateClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl fmt::Debug for ReplicateClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicateClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

impl ReplicateClient {
    /// Start building a client authenticated with `token`.
    pub fn builder(token: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            token: token.into(),
            base_url: None,
            user_agent: None,
        }
    }

    /// A client for the default base URL.
    pub fn new(token: impl Into<String>) -> Result<Self, ApiError> {
        Self::builder(token).build()
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /hardware`
    pub async fn list_hardware(&self) -> Result<Vec<Hardware>, ApiError> {
        self.request(Method::GET, &["hardware"], NO_BODY).await
    }

    /// `GET /models/{owner}/{name}/versions` (first page only).
    pub async fn list_model_versions(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Page<ModelVersion>, ApiError> {
        self.request(Method::GET, &["models", owner, name, "versions"], NO_BODY)
            .await
    }

    /// `POST /deployments`
    pub async fn create_deployment(
        &self,
        options: &CreateDeploymentOptions,
    ) -> Result<Deployment, ApiError> {
        self.request(Method::POST, &["deployments"], Some(options))
            .await
    }

    /// `GET /deployments/{owner}/{name}`
    pub async fn get_deployment(&self, owner: &str, name: &str) -> Result<Deployment, ApiError> {
        self.request(Method::GET, &["deployments", owner, name], NO_BODY)
            .await
    }

    /// `PATCH /deployments/{owner}/{name}`
    pub async fn update_deployment(
        &self,
        owner: &str,
        name: &str,
        options: &UpdateDeploymentOptions,
    ) -> Result<Deployment, ApiError> {
        self.request(Method::PATCH, &["deployments", owner, name], Some(options))
            .await
    }

    /// `DELETE /deployments/{owner}/{name}`
    pub async fn delete_deployment(&self, owner: &str, name: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, &["deployments", owner, name], NO_BODY)
            .await
            .map(|_| ())
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn request<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let (url, text) = self.execute(method, segments, body).await?;
        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn execute<B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<(Url, String), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments);
        debug!(method = %method, url = %url, "Replicate API request");

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let transport = |source| ApiError::Transport {
            method: method.clone(),
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let text = response.text().await.map_err(transport)?;

        if !status.is_success() {
            error!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                body = %sanitize_for_log(&text),
                "Replicate API error"
            );
            return Err(ApiError::from_response(status, &text));
        }

        debug!(method = %method, url = %url, status = status.as_u16(), "Replicate API response");
        Ok((url, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ReplicateClient {
        ReplicateClient::builder("r8_test").base_url(base).build().unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let c = client("https://api.replicate.com/v1");
        assert_eq!(
            c.endpoint(&["deployments", "acme", "web"]).as_str(),
            "https://api.replicate.com/v1/deployments/acme/web"
        );

        let c = client("https://api.replicate.com/v1/");
        assert_eq!(
            c.endpoint(&["hardware"]).as_str(),
            "https://api.replicate.com/v1/hardware"
        );

        let c = client("http://127.0.0.1:8080");
        assert_eq!(c.endpoint(&["hardware"]).as_str(), "http://127.0.0.1:8080/hardware");
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let c = client("https://api.replicate.com/v1");
        let url = c.endpoint(&["deployments", "acme", "a b/c"]);
        assert_eq!(url.path(), "/v1/deployments/acme/a%20b%2Fc");
    }

    #[test]
    fn test_default_base_url() {
        let c = ReplicateClient::new("r8_test").unwrap();
        assert_eq!(c.base_url().as_str(), "https://api.replicate.com/v1");
    }

    #[test]
    fn test_parse_base_url_rejects_bad_input() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(ApiError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            parse_base_url("ftp://example.com"),
            Err(ApiError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            parse_base_url("mailto:ops@example.com"),
            Err(ApiError::InvalidBaseUrl { .. })
        ));
        assert!(parse_base_url("http://localhost:9999/v1").is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let c = client("https://api.replicate.com/v1");
        let debug = format!("{:?}", c);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("r8_test"));
    }

    #[test]
    fn test_status_error_from_json_body() {
        let err = ApiError::from_response(
            StatusCode::NOT_FOUND,
            r#"{"title":"Not found","detail":"Deployment not found","status":404}"#,
        );
        assert_eq!(err.to_string(), "Not found (404): Deployment not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_status_error_from_plain_body() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "upstream down\n");
        assert_eq!(err.to_string(), "Bad Gateway (502): upstream down");
        assert_eq!(err.status(), Some(502));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_sanitize_for_log() {
        assert_eq!(sanitize_for_log("ok body"), "ok body");
        assert_eq!(sanitize_for_log("line\nbreak"), "linebreak");

        let long = "é".repeat(300);
        let sanitized = sanitize_for_log(&long);
        assert!(sanitized.contains("[truncated, 600 bytes total]"));
    }
}
