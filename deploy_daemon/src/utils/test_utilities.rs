use std::{
    path::Path,
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use deploy_api::application::{
    ApplicationDescription, ApplicationSource, ApplicationSpec, LifecycleStatus, RuntimeType,
};
use log::{Level, Log, Metadata, Record};
use mockall::mock;
use tokio::fs::File;

use crate::container::engine::{
    ContainerEngine, ContainerEngineConnector, ContainerEngineError, ContainerResources,
};
use crate::managers::backend::{Backend, BackendError};
use crate::managers::deployer::{Deployer, DeployerError};
use crate::storage::app_metadata::{AppMetadata, DeployedApp};
use crate::storage::image_fetcher::{ImageFetchError, ImageFetcher};
use crate::virtualization::hypervisor::{
    DomainState, Hypervisor, HypervisorConnection, HypervisorError,
};

pub fn create_example_application(id: &str) -> ApplicationSpec {
    ApplicationSpec {
        id: id.to_owned(),
        cores: 2,
        memory: 256,
        source: ApplicationSource::HttpUri {
            http_uri: format!("https://images.example.com/{id}.tar"),
        },
        status: LifecycleStatus::Unknown,
    }
}

pub fn create_example_description(id: &str) -> ApplicationDescription {
    ApplicationDescription {
        id: id.to_owned(),
        runtime: RuntimeType::Container,
        status: LifecycleStatus::Ready,
        deployed: true,
        backend_handle: String::from("c0ffee"),
    }
}

/// Persisted, not yet deployed record with a staged image file.
pub async fn create_staged_app(root: &Path, runtime: RuntimeType, id: &str) -> DeployedApp {
    let metadata = AppMetadata::new(root.to_path_buf()).await.unwrap();
    let app = metadata
        .new_deployed_app(runtime, create_example_application(id))
        .unwrap();
    app.create().await.unwrap();
    std::fs::write(app.image_file_path(), b"image").unwrap();
    app
}

#[derive(Default)]
pub struct CapturingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl CapturingLogger {
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.lock().unwrap().clone()
    }

    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.records()
            .iter()
            .any(|(recorded_level, recorded)| *recorded_level == level && recorded == message)
    }
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

mock! {
    pub ContainerEngine {}

    #[async_trait]
    impl ContainerEngine for ContainerEngine {
        async fn load_image(&self, archive: File) -> Result<Vec<u8>, ContainerEngineError>;
        async fn tag_image(&self, source: &str, target: &str) -> Result<(), ContainerEngineError>;
        async fn remove_image(&self, name: &str) -> Result<(), ContainerEngineError>;
        async fn create_container(
            &self,
            name: &str,
            image: &str,
            resources: ContainerResources,
            capabilities: &[String],
        ) -> Result<String, ContainerEngineError>;
        async fn remove_container(&self, id: &str, force: bool) -> Result<(), ContainerEngineError>;
    }
}

mock! {
    pub ContainerEngineConnector {}

    impl ContainerEngineConnector for ContainerEngineConnector {
        fn connect(&self) -> Result<Box<dyn ContainerEngine + Send + Sync>, ContainerEngineError>;
    }
}

mock! {
    pub Hypervisor {}

    #[async_trait]
    impl Hypervisor for Hypervisor {
        async fn connect(&self) -> Result<Box<dyn HypervisorConnection + Send + Sync>, HypervisorError>;
    }
}

mock! {
    pub HypervisorConnection {}

    #[async_trait]
    impl HypervisorConnection for HypervisorConnection {
        async fn define_domain(&self, descriptor: &str) -> Result<String, HypervisorError>;
        async fn start_domain(&self, name: &str) -> Result<(), HypervisorError>;
        async fn domain_state(&self, name: &str) -> Result<DomainState, HypervisorError>;
        async fn destroy_domain(&self, name: &str) -> Result<(), HypervisorError>;
        async fn undefine_domain(&self, name: &str) -> Result<(), HypervisorError>;
    }
}

mock! {
    pub Backend {}

    #[async_trait]
    impl Backend for Backend {
        async fn deploy(&self, app: &DeployedApp) -> Result<String, BackendError>;
        async fn undeploy(&self, app: &DeployedApp) -> Result<(), BackendError>;
    }
}

mock! {
    pub ImageFetcher {}

    #[async_trait]
    impl ImageFetcher for ImageFetcher {
        async fn fetch(
            &self,
            url: &str,
            destination: &Path,
            timeout: Duration,
        ) -> Result<(), ImageFetchError>;
    }
}

mock! {
    pub Deployer {}

    #[async_trait]
    impl Deployer for Deployer {
        async fn deploy_container(&self, app: ApplicationSpec) -> Result<(), DeployerError>;
        async fn deploy_vm(&self, app: ApplicationSpec) -> Result<(), DeployerError>;
        async fn redeploy(&self, id: &str) -> Result<(), DeployerError>;
        async fn undeploy(&self, id: &str) -> Result<(), DeployerError>;
        async fn inspect_application(&self, id: &str)
            -> Result<ApplicationDescription, DeployerError>;
    }
}
