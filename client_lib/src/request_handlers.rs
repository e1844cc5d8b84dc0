use std::path::PathBuf;

use deploy_api::{
    application::{ApplicationDescription, ApplicationSpec},
    command::{DeployCommand, DeployResponse},
};
use tokio::net::UnixStream;
use utils::serde::json_framed::JsonFramed;

use crate::deploy_client_error::DeployClientError;

pub(crate) type Communicator = JsonFramed<UnixStream, DeployResponse, DeployCommand>;

pub async fn deploy_container(
    communicator: &mut Communicator,
    application: ApplicationSpec,
) -> Result<(), DeployClientError> {
    match communicate(communicator, DeployCommand::DeployContainer { application }).await? {
        DeployResponse::Ok => Ok(()),
        response => Err(handle_error_response(response)),
    }
}

pub async fn deploy_vm(
    communicator: &mut Communicator,
    application: ApplicationSpec,
) -> Result<(), DeployClientError> {
    match communicate(communicator, DeployCommand::DeployVm { application }).await? {
        DeployResponse::Ok => Ok(()),
        response => Err(handle_error_response(response)),
    }
}

pub async fn redeploy(communicator: &mut Communicator, id: String) -> Result<(), DeployClientError> {
    match communicate(communicator, DeployCommand::Redeploy { id }).await? {
        DeployResponse::Ok => Ok(()),
        response => Err(handle_error_response(response)),
    }
}

pub async fn undeploy(communicator: &mut Communicator, id: String) -> Result<(), DeployClientError> {
    match communicate(communicator, DeployCommand::Undeploy { id }).await? {
        DeployResponse::Ok => Ok(()),
        response => Err(handle_error_response(response)),
    }
}

pub async fn inspect_application(
    communicator: &mut Communicator,
    id: String,
) -> Result<ApplicationDescription, DeployClientError> {
    match communicate(communicator, DeployCommand::InspectApplication { id }).await? {
        DeployResponse::InspectedApplication { description } => Ok(description),
        response => Err(handle_error_response(response)),
    }
}

pub async fn connect_to_deploy_socket(socket_path: PathBuf) -> Result<UnixStream, DeployClientError> {
    UnixStream::connect(&socket_path)
        .await
        .map_err(|err| DeployClientError::ConnectionFailed {
            socket_path,
            details: err,
        })
}

async fn communicate(
    communicator: &mut Communicator,
    command: DeployCommand,
) -> Result<DeployResponse, DeployClientError> {
    communicator
        .send(command)
        .await
        .map_err(DeployClientError::CommunicationFail)?;
    communicator
        .recv()
        .await
        .map_err(DeployClientError::CommunicationFail)
}

fn handle_error_response(response: DeployResponse) -> DeployClientError {
    match response {
        DeployResponse::Error { deploy_error } => DeployClientError::DeployOperationFail(deploy_error),
        response => DeployClientError::InvalidResponse { response },
    }
}
