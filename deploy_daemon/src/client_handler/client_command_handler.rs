use std::sync::Arc;

use async_trait::async_trait;
use deploy_api::command::{DeployCommand, DeployDaemonError, DeployResponse};
use log::{error, info, trace};
use thiserror::Error;
use tokio::{net::UnixStream, select};
use tokio_util::sync::CancellationToken;
use utils::serde::json_framed::{JsonFramed, JsonFramedError};

use crate::managers::deployer::Deployer;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to send response: {0}")]
    SendingResponseFail(#[source] JsonFramedError),
}

#[async_trait]
pub trait Client {
    async fn handle_connection(
        deployer: Arc<dyn Deployer + Send + Sync>,
        socket: UnixStream,
        token: Arc<CancellationToken>,
    ) -> Result<(), ClientError>;
}

pub struct ClientHandler {
    deployer: Arc<dyn Deployer + Send + Sync>,
    communicator: JsonFramed<UnixStream, DeployCommand, DeployResponse>,
    token: Arc<CancellationToken>,
}

impl ClientHandler {
    pub async fn handle_requests(&mut self) -> Result<(), ClientError> {
        loop {
            select! {
                request = self.communicator.try_recv() => {
                    let response = match request {
                        Ok(Some(command)) => {
                            trace!("Received command: {:?}", command);
                            select! {
                                response = self.handle_command(command) => response,
                                _ = self.token.cancelled() => break,
                            }
                        }
                        Ok(None) => break, // Client disconnected
                        Err(err) => {
                            error!("Failed to read client request: {}", err);
                            DeployResponse::Error {
                                deploy_error: DeployDaemonError::ReadingRequestFail,
                            }
                        }
                    };
                    self.communicator
                        .send(response)
                        .await
                        .map_err(ClientError::SendingResponseFail)?;
                }
                _ = self.token.cancelled() => {
                    break;
                }
            }
        }
        Ok(())
    }

    async fn handle_command(&self, command: DeployCommand) -> DeployResponse {
        let result = match command {
            DeployCommand::DeployContainer { application } => {
                info!("Deploying container application: {}", application.id);
                self.deployer
                    .deploy_container(application)
                    .await
                    .map(|_| DeployResponse::Ok)
            }
            DeployCommand::DeployVm { application } => {
                info!("Deploying VM application: {}", application.id);
                self.deployer
                    .deploy_vm(application)
                    .await
                    .map(|_| DeployResponse::Ok)
            }
            DeployCommand::Redeploy { id } => {
                info!("Redeploying application: {id}");
                self.deployer.redeploy(&id).await.map(|_| DeployResponse::Ok)
            }
            DeployCommand::Undeploy { id } => {
                info!("Undeploying application: {id}");
                self.deployer.undeploy(&id).await.map(|_| DeployResponse::Ok)
            }
            DeployCommand::InspectApplication { id } => self
                .deployer
                .inspect_application(&id)
                .await
                .map(|description| DeployResponse::InspectedApplication { description }),
        };
        result.unwrap_or_else(|err| {
            error!("Command failed: {}", err);
            DeployResponse::Error {
                deploy_error: err.into(),
            }
        })
    }
}

#[async_trait]
impl Client for ClientHandler {
    async fn handle_connection(
        deployer: Arc<dyn Deployer + Send + Sync>,
        socket: UnixStream,
        token: Arc<CancellationToken>,
    ) -> Result<(), ClientError> {
        let mut handler = ClientHandler {
            deployer,
            communicator: JsonFramed::new(socket),
            token,
        };
        handler.handle_requests().await
    }
}
