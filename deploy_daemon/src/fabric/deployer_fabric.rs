use std::sync::Arc;

use log::Log;

use crate::container::{container_backend::ContainerBackend, docker_client::DockerConnector};
use crate::managers::backend::Backend;
use crate::managers::deploy_configuration::DeployConfig;
use crate::managers::deployer::Deployer;
use crate::managers::deployment_manager::DeploymentManager;
use crate::storage::app_metadata::{AppMetadata, MetadataError};
use crate::storage::image_fetcher::{HttpsImageFetcher, ImageFetcher};
use crate::virtualization::{virsh::VirshHypervisor, vm_backend::VmBackend};

pub struct DeployerFabric;

impl DeployerFabric {
    /// Deployer backed by the Docker Engine API and `virsh`.
    pub async fn create_deployer(
        config: &DeployConfig,
        logger: Arc<dyn Log>,
    ) -> Result<Arc<dyn Deployer + Send + Sync>, MetadataError> {
        let container_backend = ContainerBackend::new(
            Box::new(DockerConnector::new(config.container.docker_host.clone())),
            config.container.image_only,
        );
        let vm_backend = VmBackend::new(
            Box::new(VirshHypervisor::new(
                config.vm.virsh_path.clone(),
                config.vm.libvirt_uri.clone(),
            )),
            config.vm.emulator_path.clone(),
            config.vm.vhost_socket.clone(),
            config.vm.start_on_deploy,
        );
        Self::create_deployer_with(
            config,
            Box::new(HttpsImageFetcher::new()),
            Box::new(container_backend),
            Box::new(vm_backend),
            logger,
        )
        .await
    }

    pub async fn create_deployer_with(
        config: &DeployConfig,
        fetcher: Box<dyn ImageFetcher + Send + Sync>,
        container_backend: Box<dyn Backend + Send + Sync>,
        vm_backend: Box<dyn Backend + Send + Sync>,
        logger: Arc<dyn Log>,
    ) -> Result<Arc<dyn Deployer + Send + Sync>, MetadataError> {
        let metadata = AppMetadata::new(config.metadata_path.clone()).await?;
        Ok(Arc::new(DeploymentManager::new(
            config,
            metadata,
            fetcher,
            container_backend,
            vm_backend,
            logger,
        )))
    }
}
