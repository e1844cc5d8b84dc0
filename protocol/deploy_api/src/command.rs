use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::{ApplicationDescription, ApplicationSpec};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, PartialOrd)]
pub enum DeployCommand {
    DeployContainer { application: ApplicationSpec },
    DeployVm { application: ApplicationSpec },
    Redeploy { id: String },
    Undeploy { id: String },
    InspectApplication { id: String },
}

/// Coarse classification of a failed operation, mirroring the status codes
/// callers are expected to branch on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd)]
pub enum ErrorClass {
    InvalidArgument,
    AlreadyExists,
    FailedPrecondition,
    NotFound,
    Unimplemented,
    Internal,
}

#[derive(Debug, Error, Clone, Serialize, Deserialize, PartialEq, PartialOrd)]
pub enum DeployDaemonError {
    #[error("Failed to read request.")]
    ReadingRequestFail,
    #[error("{class:?}: {message}")]
    OperationFail { class: ErrorClass, message: String },
}

impl DeployDaemonError {
    pub fn class(&self) -> ErrorClass {
        match self {
            DeployDaemonError::ReadingRequestFail => ErrorClass::InvalidArgument,
            DeployDaemonError::OperationFail { class, .. } => *class,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, PartialOrd)]
pub enum DeployResponse {
    Ok,
    InspectedApplication { description: ApplicationDescription },
    Error { deploy_error: DeployDaemonError },
}
