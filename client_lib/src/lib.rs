use std::path::PathBuf;

use deploy_api::application::{ApplicationDescription, ApplicationSpec};

pub use deploy_client_error::DeployClientError;
use request_handlers::Communicator;

mod deploy_client_error;
mod request_handlers;

/// Connection to a running deploy daemon. Requests are answered in order,
/// one at a time.
pub struct DeployConnection {
    communicator: Communicator,
}

impl DeployConnection {
    pub async fn connect(socket_path: PathBuf) -> Result<Self, DeployClientError> {
        let stream = request_handlers::connect_to_deploy_socket(socket_path).await?;
        Ok(Self {
            communicator: Communicator::new(stream),
        })
    }

    pub async fn deploy_container(
        &mut self,
        application: ApplicationSpec,
    ) -> Result<(), DeployClientError> {
        request_handlers::deploy_container(&mut self.communicator, application).await
    }

    pub async fn deploy_vm(&mut self, application: ApplicationSpec) -> Result<(), DeployClientError> {
        request_handlers::deploy_vm(&mut self.communicator, application).await
    }

    pub async fn redeploy(&mut self, id: String) -> Result<(), DeployClientError> {
        request_handlers::redeploy(&mut self.communicator, id).await
    }

    pub async fn undeploy(&mut self, id: String) -> Result<(), DeployClientError> {
        request_handlers::undeploy(&mut self.communicator, id).await
    }

    pub async fn inspect_application(
        &mut self,
        id: String,
    ) -> Result<ApplicationDescription, DeployClientError> {
        request_handlers::inspect_application(&mut self.communicator, id).await
    }
}
