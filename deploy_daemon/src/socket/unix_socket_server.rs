use std::{io, path::PathBuf, sync::Arc};

use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::{select, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::client_handler::client_command_handler::Client;
use crate::managers::deployer::Deployer;

#[derive(Debug, Error)]
pub enum UnixSocketServerError {
    #[error("Failed to bind socket {path}: {source}")]
    SocketBindingFail {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to accept client: {0}")]
    ClientAcceptFail(#[source] io::Error),
}

pub struct UnixSocketServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl UnixSocketServer {
    /// Binds the socket, replacing a stale socket file left by a previous run.
    pub fn bind(socket_path: PathBuf) -> Result<Self, UnixSocketServerError> {
        if socket_path.exists() {
            warn!("Removing stale socket {}", socket_path.display());
            let _ = std::fs::remove_file(&socket_path);
        }
        let listener = UnixListener::bind(&socket_path).map_err(|source| {
            UnixSocketServerError::SocketBindingFail {
                path: socket_path.clone(),
                source,
            }
        })?;
        Ok(Self {
            listener,
            socket_path,
        })
    }

    pub async fn listen<T: Client + 'static>(
        self,
        deployer: Arc<dyn Deployer + Send + Sync>,
        token: Arc<CancellationToken>,
    ) -> Result<(), UnixSocketServerError> {
        info!("Starting Unix Socket Server on {}", self.socket_path.display());
        let mut clients_set = JoinSet::new();

        let result = loop {
            select! {
                accepted_connection = self.listener.accept() => {
                    let (stream, _addr) = match accepted_connection {
                        Ok(connection) => connection,
                        Err(err) => break Err(UnixSocketServerError::ClientAcceptFail(err)),
                    };
                    let deployer = deployer.clone();
                    let token = token.clone();
                    info!("Client connected to the server!");
                    let _ = clients_set.spawn(async move {
                        if let Err(e) = T::handle_connection(deployer, stream, token).await {
                            error!("{e}");
                        }
                    });
                }
                Some(exited_client) = clients_set.join_next() => {
                    debug!("Client {:?} has exited", exited_client);
                }
                _ = token.cancelled() => {
                    break Ok(());
                }
            }
        };

        while let Some(v) = clients_set.join_next().await {
            debug!("Client thread {:?} joined", v);
        }
        result
    }
}

impl Drop for UnixSocketServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}
