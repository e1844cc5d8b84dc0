use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ImageNameError {
    #[error("failed to parse docker image name: {0}")]
    Json(String),
    #[error("failed to parse docker image name: stream empty")]
    StreamEmpty,
    #[error("failed to parse docker image name: stream malformed")]
    StreamMalformed,
    #[error("container engine rejected the image archive: {0}")]
    EngineReported(String),
}

#[derive(Debug, PartialEq)]
pub struct LoadedImage {
    pub name: String,
    /// The archive carried its own `name:tag`, which becomes redundant once
    /// the image is retagged to the application identifier.
    pub had_tag: bool,
}

#[derive(Deserialize)]
struct LoadMessage {
    #[serde(default)]
    stream: String,
    #[serde(default)]
    error: Option<String>,
}

const LOADED_MARKER: &str = "Loaded image";
const UNTAGGED_PREFIX: &str = "Loaded image ID: ";
const TAGGED_PREFIX: &str = "Loaded image: ";

/// Extracts the image name from the JSON message stream returned by an image
/// load. The first message with a non-empty `stream` decides the outcome.
pub fn parse_loaded_image(body: &[u8]) -> Result<LoadedImage, ImageNameError> {
    let messages = serde_json::Deserializer::from_slice(body).into_iter::<LoadMessage>();
    for message in messages {
        let message = message.map_err(|err| ImageNameError::Json(err.to_string()))?;
        if let Some(error) = message.error {
            return Err(ImageNameError::EngineReported(error));
        }
        if message.stream.is_empty() {
            continue;
        }
        return parse_stream_line(&message.stream);
    }
    Err(ImageNameError::StreamEmpty)
}

fn parse_stream_line(stream: &str) -> Result<LoadedImage, ImageNameError> {
    if !stream.contains(LOADED_MARKER) {
        return Err(ImageNameError::StreamMalformed);
    }
    let line = stream.strip_suffix('\n').unwrap_or(stream);
    let (name, had_tag) = if let Some(name) = line.strip_prefix(UNTAGGED_PREFIX) {
        (name, false)
    } else if let Some(name) = line.strip_prefix(TAGGED_PREFIX) {
        (name, true)
    } else {
        return Err(ImageNameError::StreamMalformed);
    };
    if name.is_empty() {
        return Err(ImageNameError::StreamMalformed);
    }
    Ok(LoadedImage {
        name: name.to_owned(),
        had_tag,
    })
}
