use std::path::PathBuf;

use deploy_api::application::{
    ApplicationDescription, ApplicationSpec, LifecycleStatus, RuntimeType,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utils::file_system::fs_repository::{FileRepository, FileRepositoryError};

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("No metadata found for application {0}.")]
    NotFound(String),
    #[error("Application identifier {0:?} is invalid.")]
    InvalidIdentifier(String),
    #[error("Failed to create metadata root {path}: {source}")]
    RootCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Metadata repository failure: {0}")]
    Repository(#[source] FileRepositoryError),
}

/// Persisted state of one application. The `is_deployed` flag together with
/// `deployed_id` is the recovery checkpoint: a record with `is_deployed` set
/// is assumed to reference a live backend resource until undeployed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployedAppData {
    pub app: ApplicationSpec,
    pub runtime: RuntimeType,
    pub url: String,
    pub deployed_id: String,
    pub is_deployed: bool,
}

pub struct DeployedApp {
    repository: FileRepository<DeployedAppData>,
    directory: PathBuf,
}

impl DeployedApp {
    pub fn id(&self) -> &str {
        &self.repository.get().app.id
    }

    pub fn data(&self) -> &DeployedAppData {
        self.repository.get()
    }

    pub fn data_mut(&mut self) -> &mut DeployedAppData {
        self.repository.get_mut()
    }

    pub fn status(&self) -> LifecycleStatus {
        self.data().app.status
    }

    pub fn set_status(&mut self, status: LifecycleStatus) {
        self.data_mut().app.status = status;
    }

    pub fn image_file_path(&self) -> PathBuf {
        self.directory.join(AppMetadata::IMAGE_FILE_NAME)
    }

    pub fn set_deployed(&mut self, deployed_id: String) {
        let data = self.data_mut();
        data.deployed_id = deployed_id;
        data.is_deployed = true;
    }

    pub fn set_undeployed(&mut self) {
        let data = self.data_mut();
        data.deployed_id.clear();
        data.is_deployed = false;
    }

    /// Initial save: creates the application directory when it is absent.
    pub async fn create(&self) -> Result<(), MetadataError> {
        self.repository
            .create()
            .await
            .map_err(MetadataError::Repository)
    }

    pub async fn save(&self) -> Result<(), MetadataError> {
        self.repository.save().await.map_err(MetadataError::Repository)
    }

    pub fn describe(&self) -> ApplicationDescription {
        let data = self.data();
        ApplicationDescription {
            id: data.app.id.clone(),
            runtime: data.runtime,
            status: data.app.status,
            deployed: data.is_deployed,
            backend_handle: data.deployed_id.clone(),
        }
    }
}

/// Directory-per-application metadata store rooted at a single path.
pub struct AppMetadata {
    root: PathBuf,
}

impl AppMetadata {
    pub const METADATA_FILE_NAME: &'static str = "metadata.yaml";
    pub const IMAGE_FILE_NAME: &'static str = "image";

    pub async fn new(root: PathBuf) -> Result<Self, MetadataError> {
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| MetadataError::RootCreation {
                path: root.clone(),
                source,
            })?;
        Ok(Self { root })
    }

    /// Identifiers name a directory and a container image tag, so they are
    /// restricted to lowercase alphanumerics, `-`, `_` and `.`.
    pub fn validate_identifier(id: &str) -> Result<(), MetadataError> {
        let valid_characters = id.chars().all(|character| {
            character.is_ascii_lowercase()
                || character.is_ascii_digit()
                || matches!(character, '-' | '_' | '.')
        });
        let starts_alphanumeric = id
            .chars()
            .next()
            .is_some_and(|first| first.is_ascii_alphanumeric());
        if valid_characters && starts_alphanumeric {
            Ok(())
        } else {
            Err(MetadataError::InvalidIdentifier(id.to_owned()))
        }
    }

    pub fn new_deployed_app(
        &self,
        runtime: RuntimeType,
        app: ApplicationSpec,
    ) -> Result<DeployedApp, MetadataError> {
        Self::validate_identifier(&app.id)?;
        let directory = self.root.join(&app.id);
        let data = DeployedAppData {
            app,
            runtime,
            url: String::new(),
            deployed_id: String::new(),
            is_deployed: false,
        };
        Ok(DeployedApp {
            repository: FileRepository::new(data, &directory.join(Self::METADATA_FILE_NAME)),
            directory,
        })
    }

    pub async fn load(&self, id: &str) -> Result<DeployedApp, MetadataError> {
        Self::validate_identifier(id)?;
        let directory = self.root.join(id);
        let repository = FileRepository::<DeployedAppData>::from_file_path(
            &directory.join(Self::METADATA_FILE_NAME),
        )
        .await
        .map_err(|err| match err {
            FileRepositoryError::NotFound(_) => MetadataError::NotFound(id.to_owned()),
            err => MetadataError::Repository(err),
        })?;
        Ok(DeployedApp {
            repository,
            directory,
        })
    }
}

#[cfg(test)]
mod test {
    use deploy_api::application::{LifecycleStatus, RuntimeType};
    use parameterized::parameterized;
    use tempfile::tempdir;

    use super::{AppMetadata, MetadataError};
    use crate::utils::test_utilities::create_example_application;

    #[tokio::test]
    async fn load_missing_record() {
        let workdir = tempdir().unwrap();
        let metadata = AppMetadata::new(workdir.path().to_path_buf()).await.unwrap();
        assert!(matches!(
            metadata.load("app1").await,
            Err(MetadataError::NotFound(id)) if id == "app1"
        ));
    }

    #[tokio::test]
    async fn create_then_load() {
        let workdir = tempdir().unwrap();
        let metadata = AppMetadata::new(workdir.path().to_path_buf()).await.unwrap();
        let mut app = metadata
            .new_deployed_app(RuntimeType::Vm, create_example_application("app1"))
            .unwrap();
        app.set_status(LifecycleStatus::Deploying);
        app.create().await.unwrap();

        let loaded = metadata.load("app1").await.unwrap();
        assert_eq!(loaded.data(), app.data());
        assert_eq!(loaded.status(), LifecycleStatus::Deploying);
        assert_eq!(loaded.image_file_path(), workdir.path().join("app1").join("image"));
    }

    #[tokio::test]
    async fn deployed_transitions_are_persisted() {
        let workdir = tempdir().unwrap();
        let metadata = AppMetadata::new(workdir.path().to_path_buf()).await.unwrap();
        let mut app = metadata
            .new_deployed_app(RuntimeType::Container, create_example_application("app1"))
            .unwrap();
        app.create().await.unwrap();

        app.set_deployed(String::from("c0ffee"));
        app.save().await.unwrap();
        let loaded = metadata.load("app1").await.unwrap();
        assert!(loaded.data().is_deployed);
        assert_eq!(loaded.describe().backend_handle, "c0ffee");

        app.set_undeployed();
        app.save().await.unwrap();
        let loaded = metadata.load("app1").await.unwrap();
        assert!(!loaded.data().is_deployed);
        assert!(loaded.data().deployed_id.is_empty());
    }

    #[parameterized(id = {"", "../etc", "App1", "app/1", "-app", ".hidden"})]
    fn invalid_identifiers(id: &str) {
        assert!(matches!(
            AppMetadata::validate_identifier(id),
            Err(MetadataError::InvalidIdentifier(_))
        ));
    }

    #[parameterized(id = {"app1", "my-app_2.0", "7zip"})]
    fn valid_identifiers(id: &str) {
        assert!(AppMetadata::validate_identifier(id).is_ok());
    }
}
