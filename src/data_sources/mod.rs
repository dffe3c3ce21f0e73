//! Read-only data sources.

pub mod hardware;
pub mod model_version;

pub use hardware::{HardwareDataSource, HardwareDataSourceModel, HardwareModel};
pub use model_version::{ModelVersionDataSource, ModelVersionDataSourceModel, ModelVersionModel};
