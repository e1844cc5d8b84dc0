use async_trait::async_trait;
use log::{debug, trace};
use reqwest::{header::CONTENT_TYPE, Body, Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use super::engine::{
    ContainerEngine, ContainerEngineConnector, ContainerEngineError, ContainerResources,
};

const API_VERSION: &str = "v1.41";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct HostConfig<'a> {
    memory: i64,
    cpu_shares: i64,
    cap_add: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateContainerBody<'a> {
    image: &'a str,
    host_config: HostConfig<'a>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateContainerResponse {
    id: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Docker Engine REST client reached over TCP.
pub struct DockerClient {
    client: Client,
    base: Url,
}

impl DockerClient {
    pub fn new(docker_host: &str) -> Result<Self, ContainerEngineError> {
        let base = Url::parse(docker_host)
            .map_err(|err| ContainerEngineError::InvalidAddress(format!("{docker_host}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(ContainerEngineError::InvalidAddress(docker_host.to_owned()));
        }
        let client = Client::builder()
            .build()
            .map_err(ContainerEngineError::Request)?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ContainerEngineError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ContainerEngineError::InvalidAddress(self.base.to_string()))?
            .pop_if_empty()
            .push(API_VERSION)
            .extend(segments);
        Ok(url)
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        object: &str,
    ) -> Result<Response, ContainerEngineError> {
        let response = request.send().await.map_err(ContainerEngineError::Request)?;
        let status = response.status();
        trace!("Container engine answered {} for {}", status, object);
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|error| error.message)
            .unwrap_or(body);
        if status == StatusCode::NOT_FOUND {
            Err(ContainerEngineError::NotFound(object.to_owned()))
        } else {
            Err(ContainerEngineError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl ContainerEngine for DockerClient {
    async fn load_image(&self, archive: File) -> Result<Vec<u8>, ContainerEngineError> {
        let mut url = self.endpoint(&["images", "load"])?;
        url.query_pairs_mut().append_pair("quiet", "1");
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-tar")
            .body(Body::wrap_stream(ReaderStream::new(archive)));
        let response = self.execute(request, "image archive").await?;
        let body = response
            .bytes()
            .await
            .map_err(ContainerEngineError::Request)?;
        Ok(body.to_vec())
    }

    async fn tag_image(&self, source: &str, target: &str) -> Result<(), ContainerEngineError> {
        let mut url = self.endpoint(&["images", source, "tag"])?;
        url.query_pairs_mut().append_pair("repo", target);
        self.execute(self.client.post(url), source).await?;
        debug!("Tagged image {} as {}", source, target);
        Ok(())
    }

    async fn remove_image(&self, name: &str) -> Result<(), ContainerEngineError> {
        let url = self.endpoint(&["images", name])?;
        self.execute(self.client.delete(url), name).await?;
        Ok(())
    }

    async fn create_container(
        &self,
        name: &str,
        image: &str,
        resources: ContainerResources,
        capabilities: &[String],
    ) -> Result<String, ContainerEngineError> {
        let mut url = self.endpoint(&["containers", "create"])?;
        url.query_pairs_mut().append_pair("name", name);
        let body = CreateContainerBody {
            image,
            host_config: HostConfig {
                memory: resources.memory_bytes,
                cpu_shares: resources.cpu_shares,
                cap_add: capabilities,
            },
        };
        let response = self
            .execute(self.client.post(url).json(&body), image)
            .await?;
        let created: CreateContainerResponse = response
            .json()
            .await
            .map_err(ContainerEngineError::Request)?;
        Ok(created.id)
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<(), ContainerEngineError> {
        let mut url = self.endpoint(&["containers", id])?;
        url.query_pairs_mut()
            .append_pair("force", if force { "true" } else { "false" });
        self.execute(self.client.delete(url), id).await?;
        Ok(())
    }
}

/// Opens a fresh engine client per lifecycle call.
pub struct DockerConnector {
    docker_host: String,
}

impl DockerConnector {
    pub fn new(docker_host: String) -> Self {
        Self { docker_host }
    }
}

impl ContainerEngineConnector for DockerConnector {
    fn connect(&self) -> Result<Box<dyn ContainerEngine + Send + Sync>, ContainerEngineError> {
        Ok(Box::new(DockerClient::new(&self.docker_host)?))
    }
}
