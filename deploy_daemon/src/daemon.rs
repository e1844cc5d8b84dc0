use std::sync::Arc;

use anyhow::Error;
use log::{debug, error, info};
use tokio::select;
use tokio::signal::unix::{signal, SignalKind};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::client_handler::client_command_handler::ClientHandler;
use crate::fabric::deployer_fabric::DeployerFabric;
use crate::managers::deployer::Deployer;
use crate::socket::unix_socket_server::{UnixSocketServer, UnixSocketServerError};
use crate::utils::logging::GlobalLogger;

pub struct DaemonBuilder;

impl DaemonBuilder {
    pub async fn build(cli: &Cli) -> Result<Daemon, Error> {
        let config = cli.deploy_config();
        let deployer = DeployerFabric::create_deployer(&config, Arc::new(GlobalLogger)).await?;
        let usock_server = UnixSocketServer::bind(cli.unix_sock_path.clone())?;
        Ok(Daemon::new(deployer, usock_server))
    }
}

pub struct Daemon {
    deployer: Arc<dyn Deployer + Send + Sync>,
    usock_server: UnixSocketServer,
    cancellation_token: Arc<CancellationToken>,
}

impl Daemon {
    pub fn new(deployer: Arc<dyn Deployer + Send + Sync>, usock_server: UnixSocketServer) -> Self {
        Self {
            deployer,
            usock_server,
            cancellation_token: Arc::new(CancellationToken::new()),
        }
    }

    /// Cancelling the token stops the daemon as if it got SIGTERM.
    pub fn cancellation_token(&self) -> Arc<CancellationToken> {
        self.cancellation_token.clone()
    }

    /// Starts serving and returns the handle of the supervising task, which
    /// completes after shutdown.
    pub async fn run(self) -> anyhow::Result<JoinHandle<Result<(), Error>>, Error> {
        info!("Starting deploy daemon.");
        let cancellation_token = self.cancellation_token;
        let mut usock_thread = Self::spawn_unix_socket_server_thread(
            self.usock_server,
            self.deployer,
            cancellation_token.clone(),
        );
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        Ok(spawn(async move {
            select! {
                _ = sigint.recv() => {
                    info!("SIGINT received shutting down");
                }

                _ = sigterm.recv() => {
                    info!("SIGTERM received shutting down");
                }

                _ = cancellation_token.cancelled() => {
                    info!("Shutdown requested");
                }

                v = &mut usock_thread => {
                    error!("Error while listening on unixsocket: {:?}", v);
                }
            }
            info!("Shutting down deploy daemon.");
            cancellation_token.cancel();

            if !usock_thread.is_finished() {
                let result = usock_thread.await;
                debug!("UnixSocketServer result: {:#?}", result);
            }

            info!("Deploy daemon succesfully shutdown.");
            Ok(())
        }))
    }

    fn spawn_unix_socket_server_thread(
        usock_server: UnixSocketServer,
        deployer: Arc<dyn Deployer + Send + Sync>,
        token: Arc<CancellationToken>,
    ) -> JoinHandle<Result<(), UnixSocketServerError>> {
        tokio::spawn(async move { usock_server.listen::<ClientHandler>(deployer, token).await })
    }
}
