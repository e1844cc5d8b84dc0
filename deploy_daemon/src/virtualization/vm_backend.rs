use std::path::PathBuf;

use async_trait::async_trait;
use log::{debug, info, warn};

use super::domain::{DomainDescriptor, DomainParameters};
use super::hypervisor::{Hypervisor, HypervisorConnection, HypervisorError};
use crate::managers::backend::{Backend, BackendError};
use crate::storage::app_metadata::DeployedApp;

pub struct VmBackend {
    hypervisor: Box<dyn Hypervisor + Send + Sync>,
    emulator_path: PathBuf,
    vhost_socket: PathBuf,
    start_on_deploy: bool,
}

impl VmBackend {
    pub fn new(
        hypervisor: Box<dyn Hypervisor + Send + Sync>,
        emulator_path: PathBuf,
        vhost_socket: PathBuf,
        start_on_deploy: bool,
    ) -> Self {
        Self {
            hypervisor,
            emulator_path,
            vhost_socket,
            start_on_deploy,
        }
    }

    fn descriptor(&self, app: &DeployedApp) -> Result<String, BackendError> {
        let spec = &app.data().app;
        let cores = u32::try_from(spec.cores)
            .map_err(|_| BackendError::Descriptor(format!("invalid core count {}", spec.cores)))?;
        let memory_mib = u32::try_from(spec.memory)
            .map_err(|_| BackendError::Descriptor(format!("invalid memory size {}", spec.memory)))?;
        let image_path = app.image_file_path();
        let descriptor = DomainDescriptor::new(DomainParameters {
            name: app.id(),
            cores,
            memory_mib,
            image_path: &image_path,
            emulator_path: &self.emulator_path,
            vhost_socket: &self.vhost_socket,
        });
        descriptor.to_xml().map_err(BackendError::Descriptor)
    }

    async fn connect(&self) -> Result<Box<dyn HypervisorConnection + Send + Sync>, BackendError> {
        self.hypervisor
            .connect()
            .await
            .map_err(BackendError::hypervisor("connect"))
    }
}

#[async_trait]
impl Backend for VmBackend {
    async fn deploy(&self, app: &DeployedApp) -> Result<String, BackendError> {
        let descriptor = self.descriptor(app)?;
        debug!("Domain descriptor for {}:\n{}", app.id(), descriptor);

        let connection = self.connect().await?;
        let name = connection
            .define_domain(&descriptor)
            .await
            .map_err(BackendError::hypervisor("define"))?;
        info!("VM '{}' defined", name);

        if self.start_on_deploy {
            if let Err(err) = connection.start_domain(&name).await {
                if let Err(cleanup_err) = connection.undefine_domain(&name).await {
                    warn!("Failed to undefine '{}' after start failure: {}", name, cleanup_err);
                }
                return Err(BackendError::hypervisor("start")(err));
            }
            info!("VM '{}' started", name);
        }
        Ok(app.id().to_owned())
    }

    async fn undeploy(&self, app: &DeployedApp) -> Result<(), BackendError> {
        let connection = self.connect().await?;
        let name = app.id();

        let needs_destroy = match connection.domain_state(name).await {
            Ok(state) => state.needs_destroy(),
            Err(HypervisorError::DomainNotFound(_)) => {
                warn!("Domain (VM) '{}' was already removed", name);
                return Ok(());
            }
            Err(err) => {
                warn!("Could not get domain '{}' state, destroying anyway: {}", name, err);
                true
            }
        };

        if needs_destroy {
            info!("Domain (VM) '{}' may be running - stopping before undeploy", name);
            match connection.destroy_domain(name).await {
                Ok(()) => {}
                Err(HypervisorError::DomainNotRunning(_) | HypervisorError::DomainNotFound(_)) => {
                    debug!("Domain (VM) '{}' was not running", name)
                }
                Err(err) => return Err(BackendError::hypervisor("destroy")(err)),
            }
        }

        match connection.undefine_domain(name).await {
            Ok(()) => info!("Domain (VM) '{}' undefined", name),
            Err(HypervisorError::DomainNotFound(_)) => {
                warn!("Domain (VM) '{}' was already removed", name)
            }
            Err(err) => return Err(BackendError::hypervisor("undefine")(err)),
        }
        Ok(())
    }
}
