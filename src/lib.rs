//! Replicate Provider
//!
//! A Terraform provider for [Replicate](https://replicate.com): it manages
//! deployments and exposes the available hardware and a model's versions as
//! data sources.
//!
//! # Overview
//!
//! - **`replicate_hardware`** data source: the hardware SKUs Replicate offers
//! - **`replicate_model_version`** data source: the versions of one model
//! - **`replicate_deployment`** resource: a model version pinned to hardware
//!   with a min/max instance range
//!
//! The crate is organised in layers:
//!
//! - [`client`]: typed HTTP client for the Replicate API
//! - [`schema`] and [`validation`]: attribute schemas and configuration checks
//! - [`resources`] and [`data_sources`]: the Terraform-facing objects
//! - [`ProviderService`]: the lifecycle seam a plugin host drives, implemented
//!   by [`ReplicateProvider`]
//!
//! # Quick Start
//!
//! ```ignore
//! use replicate_provider::{init_logging, ProviderService, ReplicateProvider};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let provider = ReplicateProvider::new(env!("CARGO_PKG_VERSION"));
//!     provider.configure(json!({"api_token": std::env::var("REPLICATE_API_TOKEN")?})).await?;
//!
//!     let versions = provider
//!         .read_data_source("replicate_model_version", json!({"model": "stability-ai/sdxl"}))
//!         .await?;
//!     println!("{}", versions["versions"]);
//!     Ok(())
//! }
//! ```
//!
//! # Provider Configuration
//!
//! ```hcl
//! provider "replicate" {
//!   api_token = var.replicate_api_token
//! }
//!
//! resource "replicate_deployment" "web" {
//!   owner         = "replicate-testing"
//!   name          = "web"
//!   model         = "replicate/hello-world"
//!   version       = "5c7d5dc6dd8bf75c1acaa8565735e7986bc5b66206b55cca93cb72c9bf15ccaa"
//!   hardware      = "cpu"
//!   min_instances = 0
//!   max_instances = 1
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod ident;
pub mod logging;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::{ApiError, ReplicateClient};
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::ReplicateProvider;
pub use schema::{Diagnostic, ProviderSchema};
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities};
pub use validation::{validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
