use async_trait::async_trait;
use deploy_api::application::LifecycleStatus;
use log::{error, info, warn};
use tokio::fs::File;

use super::engine::{
    ContainerEngine, ContainerEngineConnector, ContainerEngineError, ContainerResources,
};
use super::image_load::parse_loaded_image;
use crate::managers::backend::{Backend, BackendError};
use crate::storage::app_metadata::DeployedApp;

pub struct ContainerBackend {
    connector: Box<dyn ContainerEngineConnector + Send + Sync>,
    image_only: bool,
}

impl ContainerBackend {
    pub const NET_ADMIN_CAPABILITY: &'static str = "NET_ADMIN";

    pub fn new(connector: Box<dyn ContainerEngineConnector + Send + Sync>, image_only: bool) -> Self {
        Self {
            connector,
            image_only,
        }
    }

    fn connect(&self) -> Result<Box<dyn ContainerEngine + Send + Sync>, BackendError> {
        self.connector
            .connect()
            .map_err(BackendError::engine("connect"))
    }

    /// Loads the staged archive and leaves it tagged with the application
    /// identifier. A tag carried by the archive itself is dropped afterwards.
    async fn load_image(
        engine: &(dyn ContainerEngine + Send + Sync),
        app: &DeployedApp,
    ) -> Result<(), BackendError> {
        let image_path = app.image_file_path();
        let archive = File::open(&image_path)
            .await
            .map_err(|source| BackendError::ImageFile {
                path: image_path.clone(),
                source,
            })?;
        let response = engine
            .load_image(archive)
            .await
            .map_err(BackendError::engine("image load"))?;
        let loaded = parse_loaded_image(&response)?;

        engine
            .tag_image(&loaded.name, app.id())
            .await
            .map_err(BackendError::engine("image tag"))?;
        info!("Image '{}' retagged to '{}'", loaded.name, app.id());

        if loaded.had_tag {
            if let Err(err) = engine.remove_image(&loaded.name).await {
                warn!("Failed to remove original tag '{}': {}", loaded.name, err);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for ContainerBackend {
    async fn deploy(&self, app: &DeployedApp) -> Result<String, BackendError> {
        let engine = self.connect()?;
        Self::load_image(engine.as_ref(), app).await?;

        if self.image_only {
            info!("Image of '{}' staged, container creation skipped", app.id());
            return Ok(String::new());
        }

        let spec = &app.data().app;
        let resources = ContainerResources {
            memory_bytes: i64::from(spec.memory) * 1024 * 1024,
            cpu_shares: i64::from(spec.cores),
        };
        let container_id = engine
            .create_container(
                app.id(),
                app.id(),
                resources,
                &[String::from(Self::NET_ADMIN_CAPABILITY)],
            )
            .await
            .map_err(BackendError::engine("container create"))?;
        info!("Container '{}' created for '{}'", container_id, app.id());
        Ok(container_id)
    }

    async fn undeploy(&self, app: &DeployedApp) -> Result<(), BackendError> {
        let engine = self.connect()?;
        let container_id = &app.data().deployed_id;

        if !container_id.is_empty() {
            if app.status() == LifecycleStatus::Running {
                warn!("Removing running container '{}'", container_id);
            }
            match engine.remove_container(container_id, true).await {
                Ok(()) => info!("Removed container '{}'", container_id),
                Err(ContainerEngineError::NotFound(_)) => {
                    warn!("Container '{}' was already removed", container_id)
                }
                Err(err) => return Err(BackendError::engine("container remove")(err)),
            }
        } else if !self.image_only {
            error!("Could not find container ID for '{}'", app.id());
        }

        match engine.remove_image(app.id()).await {
            Ok(()) => info!("Container image '{}' removed", app.id()),
            Err(ContainerEngineError::NotFound(_)) => {
                warn!("Container image '{}' was already removed", app.id())
            }
            Err(err) => return Err(BackendError::engine("image remove")(err)),
        }
        Ok(())
    }
}
