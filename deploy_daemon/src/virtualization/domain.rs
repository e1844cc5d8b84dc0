use std::path::Path;

use serde::Serialize;

const MEMORY_UNIT: &str = "MiB";
const HUGE_PAGE_SIZE_MIB: u32 = 2;

/// Rounds a MiB amount up to the next huge page boundary.
pub fn round_up_to_huge_page(memory_mib: u32) -> u32 {
    memory_mib.div_ceil(HUGE_PAGE_SIZE_MIB) * HUGE_PAGE_SIZE_MIB
}

#[derive(Debug, Serialize)]
struct Memory {
    #[serde(rename = "@unit")]
    unit: &'static str,
    #[serde(rename = "$text")]
    value: u32,
}

#[derive(Debug, Serialize)]
struct OsType {
    #[serde(rename = "@arch")]
    arch: &'static str,
    #[serde(rename = "$text")]
    value: &'static str,
}

#[derive(Debug, Serialize)]
struct Os {
    #[serde(rename = "type")]
    os_type: OsType,
}

#[derive(Debug, Serialize)]
pub struct NumaCell {
    #[serde(rename = "@id")]
    pub id: u32,
    #[serde(rename = "@cpus")]
    pub cpus: String,
    #[serde(rename = "@memory")]
    pub memory: u32,
    #[serde(rename = "@unit")]
    unit: &'static str,
    #[serde(rename = "@memAccess")]
    pub mem_access: &'static str,
}

#[derive(Debug, Serialize)]
struct Numa {
    cell: Vec<NumaCell>,
}

#[derive(Debug, Serialize)]
struct Cpu {
    #[serde(rename = "@mode")]
    mode: &'static str,
    numa: Numa,
}

#[derive(Debug, Serialize)]
struct HugePage {
    #[serde(rename = "@size")]
    size: u32,
    #[serde(rename = "@unit")]
    unit: &'static str,
}

#[derive(Debug, Serialize)]
struct HugePages {
    page: Vec<HugePage>,
}

#[derive(Debug, Serialize)]
struct MemoryBacking {
    hugepages: HugePages,
}

#[derive(Debug, Serialize)]
struct DiskDriver {
    #[serde(rename = "@name")]
    name: &'static str,
    #[serde(rename = "@type")]
    format: &'static str,
}

#[derive(Debug, Serialize)]
struct DiskSource {
    #[serde(rename = "@file")]
    file: String,
}

#[derive(Debug, Serialize)]
struct DiskTarget {
    #[serde(rename = "@dev")]
    dev: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Disk {
    #[serde(rename = "@type")]
    disk_type: &'static str,
    #[serde(rename = "@device")]
    device: &'static str,
    driver: DiskDriver,
    source: DiskSource,
    target: DiskTarget,
}

#[derive(Debug, Default, Serialize)]
pub struct InterfaceSource {
    #[serde(rename = "@network", skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub socket_type: Option<&'static str>,
    #[serde(rename = "@path", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(rename = "@mode", skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct InterfaceModel {
    #[serde(rename = "@type")]
    model_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Interface {
    #[serde(rename = "@type")]
    pub interface_type: &'static str,
    pub source: InterfaceSource,
    model: InterfaceModel,
}

#[derive(Debug, Serialize)]
struct Devices {
    emulator: String,
    disk: Vec<Disk>,
    interface: Vec<Interface>,
}

/// What a VM domain needs from the deployed application and daemon settings.
pub struct DomainParameters<'a> {
    pub name: &'a str,
    pub cores: u32,
    pub memory_mib: u32,
    pub image_path: &'a Path,
    pub emulator_path: &'a Path,
    pub vhost_socket: &'a Path,
}

/// libvirt domain definition of a single-NUMA-cell KVM guest backed by huge
/// pages, with a bridged and a vhost-user network interface.
#[derive(Debug, Serialize)]
#[serde(rename = "domain")]
pub struct DomainDescriptor {
    #[serde(rename = "@type")]
    domain_type: &'static str,
    pub name: String,
    memory: Memory,
    pub vcpu: u32,
    os: Os,
    cpu: Cpu,
    #[serde(rename = "memoryBacking")]
    memory_backing: MemoryBacking,
    devices: Devices,
}

impl DomainDescriptor {
    pub fn new(parameters: DomainParameters) -> Self {
        let memory = round_up_to_huge_page(parameters.memory_mib);
        let virtio = || InterfaceModel {
            model_type: "virtio",
        };
        DomainDescriptor {
            domain_type: "kvm",
            name: parameters.name.to_owned(),
            memory: Memory {
                unit: MEMORY_UNIT,
                value: memory,
            },
            vcpu: parameters.cores,
            os: Os {
                os_type: OsType {
                    arch: "x86_64",
                    value: "hvm",
                },
            },
            cpu: Cpu {
                mode: "host-passthrough",
                numa: Numa {
                    cell: vec![NumaCell {
                        id: 0,
                        cpus: format!("0-{}", parameters.cores.saturating_sub(1)),
                        memory,
                        unit: MEMORY_UNIT,
                        mem_access: "shared",
                    }],
                },
            },
            memory_backing: MemoryBacking {
                hugepages: HugePages {
                    page: vec![HugePage {
                        size: HUGE_PAGE_SIZE_MIB,
                        unit: MEMORY_UNIT,
                    }],
                },
            },
            devices: Devices {
                emulator: parameters.emulator_path.display().to_string(),
                disk: vec![Disk {
                    disk_type: "file",
                    device: "disk",
                    driver: DiskDriver {
                        name: "qemu",
                        format: "qcow2",
                    },
                    source: DiskSource {
                        file: parameters.image_path.display().to_string(),
                    },
                    target: DiskTarget { dev: "hda" },
                }],
                interface: vec![
                    Interface {
                        interface_type: "network",
                        source: InterfaceSource {
                            network: Some(String::from("default")),
                            ..Default::default()
                        },
                        model: virtio(),
                    },
                    Interface {
                        interface_type: "vhostuser",
                        source: InterfaceSource {
                            socket_type: Some("unix"),
                            path: Some(parameters.vhost_socket.display().to_string()),
                            mode: Some("client"),
                            ..Default::default()
                        },
                        model: virtio(),
                    },
                ],
            },
        }
    }

    pub fn numa_cells(&self) -> &[NumaCell] {
        &self.cpu.numa.cell
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.devices.interface
    }

    pub fn to_xml(&self) -> Result<String, String> {
        quick_xml::se::to_string(self).map_err(|err| err.to_string())
    }
}
