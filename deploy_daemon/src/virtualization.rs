pub mod domain;
pub mod hypervisor;
pub mod virsh;
pub mod vm_backend;
