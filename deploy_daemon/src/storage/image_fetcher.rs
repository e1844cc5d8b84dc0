use std::{io, path::Path, time::Duration};

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tokio::{fs::File, io::AsyncWriteExt};

#[derive(Debug, Error)]
pub enum ImageFetchError {
    #[error("HTTP image path unsupported as insecure, please use HTTPS")]
    InsecureTransport,
    #[error("Image path {url} is not a valid URL: {details}")]
    InvalidUrl { url: String, details: String },
    #[error("Image URL scheme '{0}' is unsupported, please use HTTPS")]
    UnsupportedScheme(String),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected HTTP code {0} returned")]
    UnexpectedStatus(u16),
    #[error("Failed to create image file: {0}")]
    CreateFile(#[source] io::Error),
    #[error("Failed to write image file: {0}")]
    WriteFile(#[source] io::Error),
}

#[async_trait]
pub trait ImageFetcher {
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        timeout: Duration,
    ) -> Result<(), ImageFetchError>;
}

/// Downloads images over HTTPS only. Plain HTTP is refused before any
/// connection is attempted.
#[derive(Default)]
pub struct HttpsImageFetcher {}

impl HttpsImageFetcher {
    pub fn new() -> Self {
        Self {}
    }

    pub fn parse_secure_url(url: &str) -> Result<Url, ImageFetchError> {
        let parsed = Url::parse(url).map_err(|err| ImageFetchError::InvalidUrl {
            url: url.to_owned(),
            details: err.to_string(),
        })?;
        match parsed.scheme() {
            "https" => Ok(parsed),
            "http" => Err(ImageFetchError::InsecureTransport),
            scheme => Err(ImageFetchError::UnsupportedScheme(scheme.to_owned())),
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpsImageFetcher {
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        timeout: Duration,
    ) -> Result<(), ImageFetchError> {
        let parsed = Self::parse_secure_url(url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ImageFetchError::Client)?;

        debug!("Downloading {} with timeout {:?}", url, timeout);
        let download_error = |source| ImageFetchError::Download {
            url: url.to_owned(),
            source,
        };
        let mut response = client.get(parsed).send().await.map_err(download_error)?;
        if response.status() != StatusCode::OK {
            return Err(ImageFetchError::UnexpectedStatus(response.status().as_u16()));
        }

        let mut output = File::create(destination)
            .await
            .map_err(ImageFetchError::CreateFile)?;
        while let Some(chunk) = response.chunk().await.map_err(download_error)? {
            output
                .write_all(&chunk)
                .await
                .map_err(ImageFetchError::WriteFile)?;
        }
        output.flush().await.map_err(ImageFetchError::WriteFile)?;

        info!("Downloaded {} to {}", url, destination.display());
        Ok(())
    }
}
