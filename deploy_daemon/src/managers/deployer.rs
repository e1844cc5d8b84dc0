use async_trait::async_trait;
use deploy_api::application::{ApplicationDescription, ApplicationSpec, RuntimeType};
use deploy_api::command::ErrorClass;
use thiserror::Error;

use super::backend::BackendError;
use super::sanitize::SanitizeError;
use crate::storage::{app_metadata::MetadataError, image_fetcher::ImageFetchError};

#[derive(Debug, Error)]
pub enum DeployerError {
    #[error(transparent)]
    InvalidApplication(#[from] SanitizeError),
    #[error("unknown app source: {0}")]
    UnsupportedSource(String),
    #[error("app {0} already deployed")]
    AlreadyDeployed(String),
    #[error("Application {id} not found: {source}")]
    NoSuchApplication {
        id: String,
        #[source]
        source: MetadataError,
    },
    #[error("Application {id} not found: {source}")]
    MissingForUndeploy {
        id: String,
        #[source]
        source: MetadataError,
    },
    #[error("Application {0} is not deployed")]
    NotDeployed(String),
    #[error("Failed to {operation} metadata of {id}: {source}")]
    Metadata {
        id: String,
        operation: &'static str,
        #[source]
        source: MetadataError,
    },
    #[error("Failed to download image of {id}: {source}")]
    ImageDownload {
        id: String,
        #[source]
        source: ImageFetchError,
    },
    #[error("{runtime} deployment of {id} failed: {source}")]
    BackendDeploy {
        id: String,
        runtime: RuntimeType,
        #[source]
        source: BackendError,
    },
    #[error("Undeploy({id}) failed: {source}")]
    BackendUndeploy {
        id: String,
        #[source]
        source: BackendError,
    },
}

impl DeployerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            DeployerError::InvalidApplication(_) => ErrorClass::InvalidArgument,
            DeployerError::UnsupportedSource(_) => ErrorClass::Unimplemented,
            DeployerError::AlreadyDeployed(_) => ErrorClass::AlreadyExists,
            DeployerError::NoSuchApplication { .. } => ErrorClass::NotFound,
            DeployerError::MissingForUndeploy { .. } | DeployerError::NotDeployed(_) => {
                ErrorClass::FailedPrecondition
            }
            DeployerError::Metadata { .. }
            | DeployerError::ImageDownload { .. }
            | DeployerError::BackendDeploy { .. }
            | DeployerError::BackendUndeploy { .. } => ErrorClass::Internal,
        }
    }
}

/// Application lifecycle entry point. Calls for the same identifier are
/// serialised by the implementation, so callers share it without locking.
#[async_trait]
pub trait Deployer {
    async fn deploy_container(&self, app: ApplicationSpec) -> Result<(), DeployerError>;
    async fn deploy_vm(&self, app: ApplicationSpec) -> Result<(), DeployerError>;
    async fn redeploy(&self, id: &str) -> Result<(), DeployerError>;
    async fn undeploy(&self, id: &str) -> Result<(), DeployerError>;
    async fn inspect_application(&self, id: &str)
        -> Result<ApplicationDescription, DeployerError>;
}
