use std::fmt;

use serde::{Deserialize, Serialize};

/// Externally visible lifecycle state of an application.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd)]
pub enum LifecycleStatus {
    #[default]
    Unknown,
    Deploying,
    Ready,
    Running,
    Error,
}

/// Where the application image is fetched from. Only `HttpUri` is deployable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd)]
pub enum ApplicationSource {
    HttpUri { http_uri: String },
    Unsupported { kind: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd)]
pub struct ApplicationSpec {
    pub id: String,
    pub cores: i32,
    /// Memory size in MiB.
    pub memory: i32,
    pub source: ApplicationSource,
    #[serde(default)]
    pub status: LifecycleStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Hash)]
pub enum RuntimeType {
    Container,
    Vm,
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeType::Container => write!(f, "Container"),
            RuntimeType::Vm => write!(f, "VM"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd)]
pub struct ApplicationDescription {
    pub id: String,
    pub runtime: RuntimeType,
    pub status: LifecycleStatus,
    pub deployed: bool,
    pub backend_handle: String,
}
