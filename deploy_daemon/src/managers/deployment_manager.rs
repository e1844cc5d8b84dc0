use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use deploy_api::application::{
    ApplicationDescription, ApplicationSource, ApplicationSpec, LifecycleStatus, RuntimeType,
};
use log::{Level, Log};

use super::backend::Backend;
use super::deploy_configuration::{ApplicationLimits, DeployConfig};
use super::deployer::{Deployer, DeployerError};
use super::identifier_locks::IdentifierLocks;
use super::sanitize::sanitize_application;
use crate::storage::app_metadata::{AppMetadata, DeployedApp, MetadataError};
use crate::storage::image_fetcher::ImageFetcher;
use crate::utils::logging::emit;

/// Drives applications through deploy, redeploy and undeploy on the
/// container or VM backend, keeping the metadata record in step with what
/// actually exists on the backend.
///
/// Once the `Deploying` record has been written every exit path saves the
/// final state: a failed deployment is left as `Error` with `deployed` unset,
/// a failed teardown as `Error` with `deployed` still set.
pub struct DeploymentManager {
    limits: ApplicationLimits,
    download_timeout: Duration,
    metadata: AppMetadata,
    fetcher: Box<dyn ImageFetcher + Send + Sync>,
    container_backend: Box<dyn Backend + Send + Sync>,
    vm_backend: Box<dyn Backend + Send + Sync>,
    locks: IdentifierLocks,
    logger: Arc<dyn Log>,
}

impl DeploymentManager {
    pub fn new(
        config: &DeployConfig,
        metadata: AppMetadata,
        fetcher: Box<dyn ImageFetcher + Send + Sync>,
        container_backend: Box<dyn Backend + Send + Sync>,
        vm_backend: Box<dyn Backend + Send + Sync>,
        logger: Arc<dyn Log>,
    ) -> Self {
        Self {
            limits: config.limits,
            download_timeout: config.download_timeout,
            metadata,
            fetcher,
            container_backend,
            vm_backend,
            locks: IdentifierLocks::new(),
            logger,
        }
    }

    fn backend(&self, runtime: RuntimeType) -> &(dyn Backend + Send + Sync) {
        match runtime {
            RuntimeType::Container => self.container_backend.as_ref(),
            RuntimeType::Vm => self.vm_backend.as_ref(),
        }
    }

    async fn load_existing(&self, id: &str) -> Result<DeployedApp, DeployerError> {
        self.metadata.load(id).await.map_err(|source| match source {
            MetadataError::NotFound(_) | MetadataError::InvalidIdentifier(_) => {
                DeployerError::NoSuchApplication {
                    id: id.to_owned(),
                    source,
                }
            }
            source => DeployerError::Metadata {
                id: id.to_owned(),
                operation: "load",
                source,
            },
        })
    }

    /// Validation and the initial `Deploying` record. Nothing is written
    /// unless the request is acceptable.
    async fn prepare_deployment(
        &self,
        runtime: RuntimeType,
        spec: ApplicationSpec,
    ) -> Result<DeployedApp, DeployerError> {
        sanitize_application(&spec, &self.limits)?;

        match self.metadata.load(&spec.id).await {
            Ok(existing) if existing.data().is_deployed => {
                return Err(DeployerError::AlreadyDeployed(spec.id));
            }
            Ok(_) | Err(MetadataError::NotFound(_)) => {}
            Err(source) => {
                return Err(DeployerError::Metadata {
                    id: spec.id,
                    operation: "load",
                    source,
                })
            }
        }

        let url = match &spec.source {
            ApplicationSource::HttpUri { http_uri } => http_uri.clone(),
            ApplicationSource::Unsupported { kind } => {
                return Err(DeployerError::UnsupportedSource(kind.clone()))
            }
        };

        let id = spec.id.clone();
        let metadata_error = |operation| {
            let id = id.clone();
            move |source| DeployerError::Metadata {
                id,
                operation,
                source,
            }
        };
        let mut app = self
            .metadata
            .new_deployed_app(runtime, spec)
            .map_err(metadata_error("create"))?;
        app.data_mut().url = url;
        app.set_status(LifecycleStatus::Deploying);
        app.create().await.map_err(metadata_error("create"))?;
        Ok(app)
    }

    async fn provision(
        &self,
        runtime: RuntimeType,
        app: &mut DeployedApp,
    ) -> Result<(), DeployerError> {
        let url = app.data().url.clone();
        self.fetcher
            .fetch(&url, &app.image_file_path(), self.download_timeout)
            .await
            .map_err(|source| DeployerError::ImageDownload {
                id: app.id().to_owned(),
                source,
            })?;

        let handle = self
            .backend(runtime)
            .deploy(app)
            .await
            .map_err(|source| DeployerError::BackendDeploy {
                id: app.id().to_owned(),
                runtime,
                source,
            })?;
        app.set_deployed(handle);
        app.set_status(LifecycleStatus::Ready);
        Ok(())
    }

    async fn deploy_locked(
        &self,
        runtime: RuntimeType,
        spec: ApplicationSpec,
    ) -> Result<(), DeployerError> {
        emit!(self.logger, Level::Info, "Deploy{}({}) running", runtime, spec.id);
        let mut app = self.prepare_deployment(runtime, spec).await?;

        let result = self.provision(runtime, &mut app).await;
        if let Err(err) = &result {
            emit!(self.logger, Level::Error, "Deploy{}({}) failed: {}", runtime, app.id(), err);
            app.set_status(LifecycleStatus::Error);
        }

        let saved = app.save().await;
        match (result, saved) {
            (Ok(()), Ok(())) => {
                emit!(
                    self.logger,
                    Level::Info,
                    "{} application {} deployed as '{}'",
                    runtime,
                    app.id(),
                    app.data().deployed_id
                );
                Ok(())
            }
            (Ok(()), Err(source)) => Err(DeployerError::Metadata {
                id: app.id().to_owned(),
                operation: "save",
                source,
            }),
            (Err(err), saved) => {
                if let Err(save_err) = saved {
                    emit!(
                        self.logger,
                        Level::Error,
                        "Failed to save final state of {}: {}",
                        app.id(),
                        save_err
                    );
                }
                Err(err)
            }
        }
    }

    async fn undeploy_locked(&self, id: &str) -> Result<(), DeployerError> {
        emit!(self.logger, Level::Info, "Undeploy({}) running", id);
        let mut app = self.metadata.load(id).await.map_err(|source| match source {
            MetadataError::NotFound(_) | MetadataError::InvalidIdentifier(_) => {
                DeployerError::MissingForUndeploy {
                    id: id.to_owned(),
                    source,
                }
            }
            source => DeployerError::Metadata {
                id: id.to_owned(),
                operation: "load",
                source,
            },
        })?;
        if !app.data().is_deployed {
            return Err(DeployerError::NotDeployed(id.to_owned()));
        }

        let runtime = app.data().runtime;
        let result = self.backend(runtime).undeploy(&app).await;
        match &result {
            Ok(()) => {
                app.set_undeployed();
                app.set_status(LifecycleStatus::Unknown);
            }
            Err(err) => {
                emit!(self.logger, Level::Error, "Undeploy({}) failed: {}", id, err);
                app.set_status(LifecycleStatus::Error);
            }
        }

        if let Err(err) = app.save().await {
            emit!(self.logger, Level::Error, "Failed to save final state of {}: {}", id, err);
        }

        result.map_err(|source| DeployerError::BackendUndeploy {
            id: id.to_owned(),
            source,
        })?;

        if tokio::fs::remove_file(app.image_file_path()).await.is_ok() {
            emit!(self.logger, Level::Info, "Deleted image file of {}", id);
        }
        Ok(())
    }
}

#[async_trait]
impl Deployer for DeploymentManager {
    async fn deploy_container(&self, app: ApplicationSpec) -> Result<(), DeployerError> {
        let _guard = self.locks.lock(&app.id).await;
        self.deploy_locked(RuntimeType::Container, app).await
    }

    async fn deploy_vm(&self, app: ApplicationSpec) -> Result<(), DeployerError> {
        let _guard = self.locks.lock(&app.id).await;
        self.deploy_locked(RuntimeType::Vm, app).await
    }

    async fn redeploy(&self, id: &str) -> Result<(), DeployerError> {
        let _guard = self.locks.lock(id).await;
        emit!(self.logger, Level::Info, "Redeploy({}) running", id);
        let existing = self.load_existing(id).await?;
        let runtime = existing.data().runtime;
        let mut spec = existing.data().app.clone();

        self.undeploy_locked(id).await?;
        spec.status = LifecycleStatus::Unknown;
        self.deploy_locked(runtime, spec).await
    }

    async fn undeploy(&self, id: &str) -> Result<(), DeployerError> {
        let _guard = self.locks.lock(id).await;
        self.undeploy_locked(id).await
    }

    async fn inspect_application(&self, id: &str) -> Result<ApplicationDescription, DeployerError> {
        Ok(self.load_existing(id).await?.describe())
    }
}
