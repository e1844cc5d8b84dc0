use client_lib::DeployConnection;
use log::info;

use crate::commands::Command;

pub struct CommandHandler {
    connection: DeployConnection,
}

impl CommandHandler {
    pub fn new(connection: DeployConnection) -> Self {
        Self { connection }
    }

    pub async fn handle_command(&mut self, command: Command) -> Result<(), anyhow::Error> {
        match command {
            Command::DeployContainer(args) => self.connection.deploy_container(args.into()).await?,
            Command::DeployVm(args) => self.connection.deploy_vm(args.into()).await?,
            Command::Redeploy { id } => self.connection.redeploy(id).await?,
            Command::Undeploy { id } => self.connection.undeploy(id).await?,
            Command::Inspect { id } => {
                let description = self.connection.inspect_application(id).await?;
                info!("{:#?}", description);
            }
        }
        Ok(())
    }
}
