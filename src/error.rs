//! Error types for the Replicate provider.
//!
//! Every failure a lifecycle verb can hit is a [`ProviderError`]. Hosts never
//! see the error values directly: they receive the [`Diagnostic`]s produced by
//! [`ProviderError::to_diagnostics`].

use thiserror::Error;

use crate::client::ApiError;
use crate::schema::Diagnostic;

/// Errors that can occur while serving a provider operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Configuration failed schema validation. Nothing was sent to the API.
    #[error("Invalid configuration: {}", summarize(.0))]
    InvalidConfig(Vec<Diagnostic>),

    /// A resource id did not have the `owner/name` shape.
    #[error("Expected ID in format owner/name, got: {0}")]
    InvalidId(String),

    /// A model identifier did not have the `owner/name` shape.
    #[error("Expected {{model_owner}}/{{model_name}}, got: {0}")]
    InvalidModel(String),

    /// The provider could not be configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A provider bug, e.g. a verb invoked before `configure`.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// State or configuration could not be decoded into the typed model.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The Replicate API call failed.
    #[error("Unable to {operation}, got error: {source}")]
    Client {
        /// What the provider was doing, e.g. "create deployment".
        operation: &'static str,
        /// The underlying client error.
        #[source]
        source: ApiError,
    },
}

impl ProviderError {
    /// Wrap a client error with the operation that produced it.
    pub fn client(operation: &'static str, source: ApiError) -> Self {
        Self::Client { operation, source }
    }

    /// The internal error raised when a verb runs before `configure`.
    pub fn unconfigured(kind: &str) -> Self {
        Self::Internal(format!(
            "{} invoked before the provider was configured with a Replicate client. \
             Please report this issue to the provider developers.",
            kind
        ))
    }

    /// Whether this error came from a 404 response of the Replicate API.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Client { source, .. } if source.is_not_found())
    }

    /// Convert this error into the diagnostics reported to the host.
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Self::InvalidConfig(diagnostics) => diagnostics.clone(),
            Self::InvalidId(_) => vec![Diagnostic::error("Invalid ID")
                .with_detail(self.to_string())
                .with_attribute("id")],
            Self::InvalidModel(_) => vec![Diagnostic::error("Invalid model identifier")
                .with_detail(self.to_string())
                .with_attribute("model")],
            Self::Configuration(msg) => vec![Diagnostic::error("Provider Configuration Error")
                .with_detail(msg.clone())],
            Self::Internal(msg) => {
                vec![Diagnostic::error("Internal Provider Error").with_detail(msg.clone())]
            }
            Self::UnknownResource(name) => {
                vec![Diagnostic::error(format!("Unknown resource type: {}", name))]
            }
            Self::Serialization(err) => {
                vec![Diagnostic::error("Invalid State").with_detail(err.to_string())]
            }
            Self::Client { .. } => vec![Diagnostic::error("Client Error").with_detail(self.to_string())],
        }
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match (&d.attribute, &d.detail) {
            (Some(attr), Some(detail)) => format!("{} ({}): {}", d.summary, attr, detail),
            (Some(attr), None) => format!("{} ({})", d.summary, attr),
            (None, Some(detail)) => format!("{}: {}", d.summary, detail),
            (None, None) => d.summary.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;

    fn not_found() -> ApiError {
        ApiError::Status {
            status: 404,
            title: "Not found".to_string(),
            detail: "Deployment not found".to_string(),
        }
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::InvalidId("just-one-part".to_string());
        assert_eq!(
            format!("{}", err),
            "Expected ID in format owner/name, got: just-one-part"
        );

        let err = ProviderError::InvalidModel("sdxl".to_string());
        assert_eq!(
            format!("{}", err),
            "Expected {model_owner}/{model_name}, got: sdxl"
        );

        let err = ProviderError::UnknownResource("replicate_model".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: replicate_model");
    }

    #[test]
    fn test_client_error_carries_raw_text() {
        let err = ProviderError::client("read deployment", not_found());
        assert_eq!(
            err.to_string(),
            "Unable to read deployment, got error: Not found (404): Deployment not found"
        );
        assert!(err.is_not_found());

        let diagnostics = err.to_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Client Error");
        assert_eq!(diagnostics[0].detail.as_deref(), Some(err.to_string().as_str()));
    }

    #[test]
    fn test_invalid_config_keeps_diagnostics() {
        let diags = vec![
            Diagnostic::error("Invalid Attribute Value").with_attribute("min_instances"),
            Diagnostic::error("Missing required attribute 'name'").with_detail("required"),
        ];
        let err = ProviderError::InvalidConfig(diags.clone());

        assert_eq!(err.to_diagnostics(), diags);
        let text = err.to_string();
        assert!(text.contains("Invalid Attribute Value (min_instances)"));
        assert!(text.contains("Missing required attribute 'name': required"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_unconfigured_is_internal() {
        let err = ProviderError::unconfigured("Resource");
        let diagnostics = err.to_diagnostics();
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostics[0].summary, "Internal Provider Error");
        assert!(diagnostics[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("Please report this issue to the provider developers"));
    }

    #[test]
    fn test_input_errors_point_at_attribute() {
        let diagnostics = ProviderError::InvalidId("x".into()).to_diagnostics();
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("id"));

        let diagnostics = ProviderError::InvalidModel("x".into()).to_diagnostics();
        assert_eq!(diagnostics[0].summary, "Invalid model identifier");
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("model"));
    }
}
