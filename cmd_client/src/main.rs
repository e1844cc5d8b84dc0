use clap::Parser;
use cmd_handler::CommandHandler;
use client_lib::DeployConnection;
use log::{error, info};
use std::path::PathBuf;
use utils::read_command_line;

mod cmd_handler;
mod cmd_parser;
mod commands;
mod utils;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    #[arg(short, long)]
    unix_socket_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    info!("Starting deploy cmd client! Press Ctrl^C to exit.");
    let cli_args = Args::parse();
    let deploy_connection = DeployConnection::connect(cli_args.unix_socket_path).await?;
    let mut handler = CommandHandler::new(deploy_connection);
    loop {
        info!("Insert new command:");
        let cmd = match read_command_line() {
            Ok(Some(cmd)) => cmd,
            Ok(None) => break,
            Err(err) => {
                error!("{err}");
                continue;
            }
        };
        match handler.handle_command(cmd.command).await {
            Err(err) => error!("Error occured while handling command: {:#?}!", err),
            Ok(_) => info!("Command handled successfully."),
        }
    }
    info!("Input closed, exiting.");
    Ok(())
}
