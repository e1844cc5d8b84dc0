use std::{io, path::PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::container::{engine::ContainerEngineError, image_load::ImageNameError};
use crate::storage::app_metadata::DeployedApp;
use crate::virtualization::hypervisor::HypervisorError;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to open image file {path}: {source}")]
    ImageFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Container engine {operation} failed: {source}")]
    Engine {
        operation: &'static str,
        #[source]
        source: ContainerEngineError,
    },
    #[error(transparent)]
    ImageName(#[from] ImageNameError),
    #[error("Hypervisor {operation} failed: {source}")]
    Hypervisor {
        operation: &'static str,
        #[source]
        source: HypervisorError,
    },
    #[error("Failed to build domain descriptor: {0}")]
    Descriptor(String),
}

impl BackendError {
    pub fn engine(operation: &'static str) -> impl FnOnce(ContainerEngineError) -> Self {
        move |source| BackendError::Engine { operation, source }
    }

    pub fn hypervisor(operation: &'static str) -> impl FnOnce(HypervisorError) -> Self {
        move |source| BackendError::Hypervisor { operation, source }
    }
}

/// Execution backend for one runtime type. `deploy` provisions the workload
/// for an application whose image is already staged and returns its handle.
#[async_trait]
pub trait Backend {
    async fn deploy(&self, app: &DeployedApp) -> Result<String, BackendError>;
    async fn undeploy(&self, app: &DeployedApp) -> Result<(), BackendError>;
}
