use deploy_api::command::DeployDaemonError;

use crate::managers::deployer::DeployerError;

impl From<DeployerError> for DeployDaemonError {
    fn from(err: DeployerError) -> Self {
        DeployDaemonError::OperationFail {
            class: err.class(),
            message: err.to_string(),
        }
    }
}
