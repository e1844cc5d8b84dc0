use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};

#[derive(Debug, Error)]
pub enum FileRepositoryError {
    #[error("File {0} doesn't exist.")]
    NotFound(PathBuf),
    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize data: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error("Failed to write file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// YAML document kept in memory and written back to a single file on demand.
///
/// Writes go to a sibling temporary file first and are renamed into place, so
/// a crash mid-save leaves either the previous or the new document on disk.
pub struct FileRepository<Struct: Serialize + DeserializeOwned> {
    data: Struct,
    path: PathBuf,
}

impl<Struct: Serialize + DeserializeOwned> FileRepository<Struct> {
    /// Wraps `data` without touching the file system.
    pub fn new(data: Struct, path: &Path) -> Self {
        Self {
            data,
            path: path.to_path_buf(),
        }
    }

    pub async fn from_file_path(path: &Path) -> Result<Self, FileRepositoryError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(FileRepositoryError::NotFound(path.to_path_buf()))
            }
            Err(source) => {
                return Err(FileRepositoryError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let data = serde_yaml::from_str(&content).map_err(|source| FileRepositoryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            data,
            path: path.to_path_buf(),
        })
    }

    /// Saves the document, creating its parent directory first if needed.
    pub async fn create(&self) -> Result<(), FileRepositoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| FileRepositoryError::DirectoryCreation {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        self.save().await
    }

    pub async fn save(&self) -> Result<(), FileRepositoryError> {
        let yaml_data = serde_yaml::to_string(&self.data).map_err(FileRepositoryError::Serialize)?;
        let temporary_path = self.temporary_path();
        let write_error = |source| FileRepositoryError::Write {
            path: temporary_path.clone(),
            source,
        };

        let mut file = File::create(&temporary_path).await.map_err(write_error)?;
        file.write_all(yaml_data.as_bytes())
            .await
            .map_err(write_error)?;
        file.sync_all().await.map_err(write_error)?;
        drop(file);

        fs::rename(&temporary_path, &self.path)
            .await
            .map_err(|source| FileRepositoryError::Write {
                path: self.path.clone(),
                source,
            })
    }

    pub fn get_mut(&mut self) -> &mut Struct {
        &mut self.data
    }

    pub fn get(&self) -> &Struct {
        &self.data
    }

    fn temporary_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| OsString::from("repository"));
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }
}
