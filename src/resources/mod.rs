//! Managed resources.

pub mod deployment;

pub use deployment::{DeploymentResource, DeploymentResourceModel};
