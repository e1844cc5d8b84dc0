use std::{io, path::PathBuf};

use deploy_api::command::{DeployDaemonError, DeployResponse};
use thiserror::Error;
use utils::serde::json_framed::JsonFramedError;

#[derive(Debug, Error)]
pub enum DeployClientError {
    #[error(
        "Failed to connect to deploy daemon socket at path: {socket_path}. More details: {details}"
    )]
    ConnectionFailed {
        socket_path: PathBuf,
        #[source]
        details: io::Error,
    },
    #[error("Deploy operation failed: {0}")]
    DeployOperationFail(#[from] DeployDaemonError),
    #[error("Failed to communicate with deploy daemon: {0}")]
    CommunicationFail(#[from] JsonFramedError),
    #[error("Invalid response: {response:#?}")]
    InvalidResponse { response: DeployResponse },
}
