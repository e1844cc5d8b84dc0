use async_trait::async_trait;
use thiserror::Error;
use tokio::fs::File;

#[derive(Debug, Error)]
pub enum ContainerEngineError {
    #[error("Invalid container engine address: {0}")]
    InvalidAddress(String),
    #[error("Container engine request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Container engine object not found: {0}")]
    NotFound(String),
    #[error("Container engine returned {status}: {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerResources {
    pub memory_bytes: i64,
    pub cpu_shares: i64,
}

#[async_trait]
pub trait ContainerEngine {
    /// Streams an image archive into the engine and returns the raw response body.
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

pub trait ContainerEngineConnector {
    fn connect(&self) -> Result<Box<dyn ContainerEngine + Send + Sync>, ContainerEngineError>;
}
