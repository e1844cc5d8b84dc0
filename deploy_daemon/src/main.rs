use anyhow::Error;
use clap::Parser;
use deploy_daemon::{cli::Cli, daemon::DaemonBuilder};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<(), Error> {
    env_logger::init();
    let cli = Cli::parse();

    let daemon = DaemonBuilder::build(&cli).await?;
    let daemon_thread_handle = daemon.run().await?;
    daemon_thread_handle.await?
}
