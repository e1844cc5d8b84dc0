use std::io;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainState {
    NoState,
    Running,
    Blocked,
    Paused,
    ShuttingDown,
    ShutOff,
    Crashed,
    Suspended,
}

impl DomainState {
    /// Anything but a clean `ShutOff` may still own a qemu process, which
    /// `destroy` has to release before the domain is undefined.
    pub fn needs_destroy(&self) -> bool {
        !matches!(self, DomainState::ShutOff)
    }
}

#[derive(Debug, Error)]
pub enum HypervisorError {
    #[error("Failed to launch {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("Domain {0} not found")]
    DomainNotFound(String),
    #[error("Domain {0} is not running")]
    DomainNotRunning(String),
    #[error("Unexpected hypervisor output: {0}")]
    UnexpectedOutput(String),
}

#[async_trait]
pub trait Hypervisor {
    async fn connect(&self) -> Result<Box<dyn HypervisorConnection + Send + Sync>, HypervisorError>;
}

/// Open session with a hypervisor. Dropping it releases the session.
#[async_trait]
pub trait HypervisorConnection {
    /// Registers a persistent domain and returns its name.
    async fn define_domain(&self, descriptor: &str) -> Result<String, HypervisorError>;
    async fn start_domain(&self, name: &str) -> Result<(), HypervisorError>;
    async fn domain_state(&self, name: &str) -> Result<DomainState, HypervisorError>;
    async fn destroy_domain(&self, name: &str) -> Result<(), HypervisorError>;
    async fn undefine_domain(&self, name: &str) -> Result<(), HypervisorError>;
}
