use clap::{Args, Subcommand};
use deploy_api::application::{ApplicationSource, ApplicationSpec, LifecycleStatus};

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ApplicationArgs {
    #[arg(short, long)]
    pub id: String,
    #[arg(short, long)]
    pub cores: i32,
    /// Memory in MiB
    #[arg(short, long)]
    pub memory: i32,
    #[arg(short = 'u', long)]
    pub http_uri: String,
}

impl From<ApplicationArgs> for ApplicationSpec {
    fn from(args: ApplicationArgs) -> Self {
        ApplicationSpec {
            id: args.id,
            cores: args.cores,
            memory: args.memory,
            source: ApplicationSource::HttpUri {
                http_uri: args.http_uri,
            },
            status: LifecycleStatus::Unknown,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    DeployContainer(ApplicationArgs),
    DeployVm(ApplicationArgs),
    Redeploy {
        #[arg(short, long)]
        id: String,
    },
    Undeploy {
        #[arg(short, long)]
        id: String,
    },
    Inspect {
        #[arg(short, long)]
        id: String,
    },
}
