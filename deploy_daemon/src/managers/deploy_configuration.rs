use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplicationLimits {
    pub max_cores: i32,
    /// MiB
    pub max_app_mem: i32,
}

impl Default for ApplicationLimits {
    fn default() -> Self {
        Self {
            max_cores: 8,
            max_app_mem: 4096,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    /// Only stage and tag images, leaving container creation to an external
    /// orchestrator.
    pub image_only: bool,
    pub docker_host: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            image_only: false,
            docker_host: String::from("http://localhost:2375"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VmConfig {
    pub libvirt_uri: String,
    pub vhost_socket: PathBuf,
    pub emulator_path: PathBuf,
    pub start_on_deploy: bool,
    pub virsh_path: PathBuf,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            libvirt_uri: String::from("qemu:///system"),
            vhost_socket: PathBuf::from("/var/run/openvswitch/vhost-user0"),
            emulator_path: PathBuf::from("/usr/local/bin/qemu-system-x86_64"),
            start_on_deploy: false,
            virsh_path: PathBuf::from("virsh"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeployConfig {
    pub limits: ApplicationLimits,
    pub download_timeout: Duration,
    pub metadata_path: PathBuf,
    pub container: ContainerConfig,
    pub vm: VmConfig,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            limits: ApplicationLimits::default(),
            download_timeout: Duration::from_secs(600),
            metadata_path: PathBuf::from("/var/lib/appliance/applications"),
            container: ContainerConfig::default(),
            vm: VmConfig::default(),
        }
    }
}
