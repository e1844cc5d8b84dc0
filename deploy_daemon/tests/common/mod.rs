use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Error;
use async_trait::async_trait;
use deploy_api::application::{ApplicationSource, ApplicationSpec, LifecycleStatus};
use deploy_daemon::{
    daemon::Daemon,
    fabric::deployer_fabric::DeployerFabric,
    managers::{
        backend::{Backend, BackendError},
        deploy_configuration::DeployConfig,
    },
    socket::unix_socket_server::UnixSocketServer,
    storage::{
        app_metadata::DeployedApp,
        image_fetcher::{ImageFetchError, ImageFetcher},
    },
    utils::logging::GlobalLogger,
};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const UNREACHABLE_IMAGE: &str = "https://images.example.com/missing.tar";

/// Stages a fixed payload, failing like a 404 for `UNREACHABLE_IMAGE`.
pub struct StagingFetcher;

#[async_trait]
impl ImageFetcher for StagingFetcher {
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        _timeout: Duration,
    ) -> Result<(), ImageFetchError> {
        if url == UNREACHABLE_IMAGE {
            return Err(ImageFetchError::UnexpectedStatus(404));
        }
        tokio::fs::write(destination, url.as_bytes())
            .await
            .map_err(ImageFetchError::WriteFile)
    }
}

/// Keeps the set of running workloads in memory. Identifiers listed in
/// `stuck` cannot be undeployed.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    prefix: &'static str,
    running: Arc<Mutex<HashSet<String>>>,
    stuck: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryBackend {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            ..Default::default()
        }
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.running.lock().unwrap().contains(id)
    }

    pub fn make_stuck(&self, id: &str) {
        self.stuck.lock().unwrap().insert(id.to_owned());
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn deploy(&self, app: &DeployedApp) -> Result<String, BackendError> {
        if !app.image_file_path().exists() {
            return Err(BackendError::Descriptor(String::from("image not staged")));
        }
        self.running.lock().unwrap().insert(app.id().to_owned());
        Ok(format!("{}-{}", self.prefix, app.id()))
    }

    async fn undeploy(&self, app: &DeployedApp) -> Result<(), BackendError> {
        if self.stuck.lock().unwrap().contains(app.id()) {
            return Err(BackendError::Descriptor(format!("{} is stuck", app.id())));
        }
        self.running.lock().unwrap().remove(app.id());
        Ok(())
    }
}

pub struct TestDaemon {
    pub socket_path: PathBuf,
    pub metadata_path: PathBuf,
    pub containers: InMemoryBackend,
    pub vms: InMemoryBackend,
    token: Arc<CancellationToken>,
    handle: JoinHandle<Result<(), Error>>,
    _workdir: TempDir,
}

impl TestDaemon {
    pub async fn start() -> Self {
        let workdir = tempfile::tempdir().unwrap();
        let socket_path = workdir.path().join("deploy.sock");
        let metadata_path = workdir.path().join("applications");
        let config = DeployConfig {
            metadata_path: metadata_path.clone(),
            ..Default::default()
        };
        let containers = InMemoryBackend::new("container");
        let vms = InMemoryBackend::new("domain");
        let deployer = DeployerFabric::create_deployer_with(
            &config,
            Box::new(StagingFetcher),
            Box::new(containers.clone()),
            Box::new(vms.clone()),
            Arc::new(GlobalLogger),
        )
        .await
        .unwrap();
        let server = UnixSocketServer::bind(socket_path.clone()).unwrap();
        let daemon = Daemon::new(deployer, server);
        let token = daemon.cancellation_token();
        let handle = daemon.run().await.unwrap();
        Self {
            socket_path,
            metadata_path,
            containers,
            vms,
            token,
            handle,
            _workdir: workdir,
        }
    }

    pub async fn shutdown(self) {
        self.token.cancel();
        self.handle.await.unwrap().unwrap();
        assert!(!self.socket_path.exists());
    }
}

pub fn create_application(id: &str, http_uri: &str) -> ApplicationSpec {
    ApplicationSpec {
        id: id.to_owned(),
        cores: 2,
        memory: 512,
        source: ApplicationSource::HttpUri {
            http_uri: http_uri.to_owned(),
        },
        status: LifecycleStatus::Unknown,
    }
}
