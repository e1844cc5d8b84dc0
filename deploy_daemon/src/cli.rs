use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::managers::deploy_configuration::{
    ApplicationLimits, ContainerConfig, DeployConfig, VmConfig,
};

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    #[arg(short, long)]
    pub unix_sock_path: PathBuf,
    #[arg(short, long, default_value = "/var/lib/appliance/applications")]
    pub metadata_path: PathBuf,
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..), default_value_t = 8)]
    pub max_cores: i32,
    /// Per-application memory cap in MiB
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..), default_value_t = 4096)]
    pub max_app_mem: i32,
    #[arg(short = 't', long, default_value_t = 600)]
    pub download_timeout_secs: u64,
    /// Stage and tag container images without creating containers
    #[arg(short = 'k', long)]
    pub image_only: bool,
    #[arg(long, default_value = "http://localhost:2375")]
    pub docker_host: String,
    #[arg(long, default_value = "qemu:///system")]
    pub libvirt_uri: String,
    #[arg(long, default_value = "/var/run/openvswitch/vhost-user0")]
    pub vhost_socket: PathBuf,
    #[arg(long, default_value = "/usr/local/bin/qemu-system-x86_64")]
    pub emulator_path: PathBuf,
    #[arg(long)]
    pub start_vms_on_deploy: bool,
    #[arg(long, default_value = "virsh")]
    pub virsh_path: PathBuf,
}

impl Cli {
    pub fn deploy_config(&self) -> DeployConfig {
        DeployConfig {
            limits: ApplicationLimits {
                max_cores: self.max_cores,
                max_app_mem: self.max_app_mem,
            },
            download_timeout: Duration::from_secs(self.download_timeout_secs),
            metadata_path: self.metadata_path.clone(),
            container: ContainerConfig {
                image_only: self.image_only,
                docker_host: self.docker_host.clone(),
            },
            vm: VmConfig {
                libvirt_uri: self.libvirt_uri.clone(),
                vhost_socket: self.vhost_socket.clone(),
                emulator_path: self.emulator_path.clone(),
                start_on_deploy: self.start_vms_on_deploy,
                virsh_path: self.virsh_path.clone(),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use std::{path::PathBuf, time::Duration};

    use clap::Parser;

    use super::Cli;
    use crate::managers::deploy_configuration::DeployConfig;

    #[test]
    fn defaults_match_deploy_config() {
        let cli = Cli::try_parse_from([
            "deploy_daemon",
            "-u",
            "/tmp/deploy.sock",
        ])
        .unwrap();
        assert_eq!(cli.unix_sock_path, PathBuf::from("/tmp/deploy.sock"));
        assert_eq!(cli.deploy_config(), DeployConfig::default());
    }

    #[test]
    fn flags() {
        let cli = Cli::try_parse_from([
            "deploy_daemon",
            "-u",
            "/tmp/deploy.sock",
            "--max-cores",
            "4",
            "--max-app-mem",
            "1024",
            "-t",
            "30",
            "-k",
            "--start-vms-on-deploy",
        ])
        .unwrap();
        let config = cli.deploy_config();
        assert_eq!(config.limits.max_cores, 4);
        assert_eq!(config.limits.max_app_mem, 1024);
        assert_eq!(config.download_timeout, Duration::from_secs(30));
        assert!(config.container.image_only);
        assert!(config.vm.start_on_deploy);
    }

    #[test]
    fn rejects_non_positive_limits() {
        assert!(Cli::try_parse_from([
            "deploy_daemon",
            "-u",
            "/tmp/deploy.sock",
            "--max-cores",
            "0",
        ])
        .is_err());
    }
}
