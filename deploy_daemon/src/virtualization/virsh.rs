use std::{path::PathBuf, process::Stdio};

use async_trait::async_trait;
use log::{debug, trace};
use tokio::{io::AsyncWriteExt, process::Command};

use super::hypervisor::{DomainState, Hypervisor, HypervisorConnection, HypervisorError};

/// Drives libvirt through the `virsh` executable.
pub struct VirshHypervisor {
    virsh_path: PathBuf,
    uri: String,
}

impl VirshHypervisor {
    pub fn new(virsh_path: PathBuf, uri: String) -> Self {
        Self { virsh_path, uri }
    }
}

#[async_trait]
impl Hypervisor for VirshHypervisor {
    async fn connect(&self) -> Result<Box<dyn HypervisorConnection + Send + Sync>, HypervisorError> {
        let connection = VirshConnection {
            virsh_path: self.virsh_path.clone(),
            uri: self.uri.clone(),
        };
        connection.run(&["uri"], None).await?;
        debug!("Connected to hypervisor at {}", self.uri);
        Ok(Box::new(connection))
    }
}

pub struct VirshConnection {
    virsh_path: PathBuf,
    uri: String,
}

impl VirshConnection {
    async fn run(&self, args: &[&str], input: Option<&str>) -> Result<String, HypervisorError> {
        let mut command = Command::new(&self.virsh_path);
        command
            .arg("-c")
            .arg(&self.uri)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let description = format!("{} {}", self.virsh_path.display(), args.join(" "));
        trace!("Running {}", description);

        let spawn_error = |source| HypervisorError::Spawn {
            command: description.clone(),
            source,
        };
        let mut child = command.spawn().map_err(spawn_error)?;
        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(input.as_bytes()).await.map_err(spawn_error)?;
        }
        let output = child.wait_with_output().await.map_err(spawn_error)?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(classify_failure(
                description.clone(),
                args.last().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            ))
        }
    }
}

fn classify_failure(command: String, object: &str, stderr: String) -> HypervisorError {
    if stderr.contains("Domain not found") || stderr.contains("failed to get domain") {
        HypervisorError::DomainNotFound(object.to_owned())
    } else if stderr.contains("domain is not running") {
        HypervisorError::DomainNotRunning(object.to_owned())
    } else {
        HypervisorError::CommandFailed { command, stderr }
    }
}

/// `virsh define` answers with `Domain 'name' defined from <file>`; older
/// releases omit the quotes.
fn parse_defined_name(output: &str) -> Result<String, HypervisorError> {
    output
        .trim()
        .strip_prefix("Domain ")
        .and_then(|rest| rest.split(" defined").next())
        .map(|name| name.trim_matches('\'').to_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| HypervisorError::UnexpectedOutput(output.to_owned()))
}

fn parse_domain_state(output: &str) -> Result<DomainState, HypervisorError> {
    match output.trim() {
        "no state" => Ok(DomainState::NoState),
        "running" => Ok(DomainState::Running),
        "idle" | "blocked" => Ok(DomainState::Blocked),
        "paused" => Ok(DomainState::Paused),
        "in shutdown" => Ok(DomainState::ShuttingDown),
        "shut off" => Ok(DomainState::ShutOff),
        "crashed" => Ok(DomainState::Crashed),
        "pmsuspended" => Ok(DomainState::Suspended),
        other => Err(HypervisorError::UnexpectedOutput(other.to_owned())),
    }
}

#[async_trait]
impl HypervisorConnection for VirshConnection {
    async fn define_domain(&self, descriptor: &str) -> Result<String, HypervisorError> {
        let output = self.run(&["define", "/dev/stdin"], Some(descriptor)).await?;
        parse_defined_name(&output)
    }

    async fn start_domain(&self, name: &str) -> Result<(), HypervisorError> {
        self.run(&["start", name], None).await.map(|_| ())
    }

    async fn domain_state(&self, name: &str) -> Result<DomainState, HypervisorError> {
        let output = self.run(&["domstate", name], None).await?;
        parse_domain_state(&output)
    }

    async fn destroy_domain(&self, name: &str) -> Result<(), HypervisorError> {
        self.run(&["destroy", name], None).await.map(|_| ())
    }

    async fn undefine_domain(&self, name: &str) -> Result<(), HypervisorError> {
        self.run(&["undefine", name], None).await.map(|_| ())
    }
}

impl Drop for VirshConnection {
    fn drop(&mut self) {
        debug!("Released hypervisor connection to {}", self.uri);
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use parameterized::parameterized;

    use super::{
        classify_failure, parse_defined_name, parse_domain_state, VirshHypervisor,
    };
    use crate::virtualization::hypervisor::{DomainState, Hypervisor, HypervisorError};

    #[parameterized(output = {
        "Domain 'app1' defined from /dev/stdin\n\n",
        "Domain app1 defined from /dev/stdin",
    })]
    fn defined_name(output: &str) {
        assert_eq!(parse_defined_name(output).unwrap(), "app1");
    }

    #[test]
    fn defined_name_garbage() {
        assert!(matches!(
            parse_defined_name("error: something"),
            Err(HypervisorError::UnexpectedOutput(_))
        ));
    }

    #[parameterized(input = {
        ("running\n\n", DomainState::Running),
        ("shut off\n", DomainState::ShutOff),
        ("paused", DomainState::Paused),
        ("pmsuspended\n", DomainState::Suspended),
    })]
    fn domain_states(input: (&str, DomainState)) {
        let (output, state) = input;
        assert_eq!(parse_domain_state(output).unwrap(), state);
    }

    #[test]
    fn missing_domain_is_recognised() {
        let err = classify_failure(
            String::from("virsh domstate app1"),
            "app1",
            String::from("error: failed to get domain 'app1'"),
        );
        assert!(matches!(err, HypervisorError::DomainNotFound(name) if name == "app1"));

        let err = classify_failure(
            String::from("virsh start app1"),
            "app1",
            String::from("error: internal error: process exited"),
        );
        assert!(matches!(err, HypervisorError::CommandFailed { .. }));
    }

    #[test]
    fn stopped_domain_is_recognised() {
        let err = classify_failure(
            String::from("virsh destroy app1"),
            "app1",
            String::from("error: Failed to destroy domain 'app1'\nerror: Requested operation is not valid: domain is not running"),
        );
        assert!(matches!(err, HypervisorError::DomainNotRunning(name) if name == "app1"));
    }

    #[tokio::test]
    async fn connect_missing_executable() {
        let hypervisor = VirshHypervisor::new(
            PathBuf::from("/nonexistent/virsh"),
            String::from("qemu:///system"),
        );
        assert!(matches!(
            hypervisor.connect().await,
            Err(HypervisorError::Spawn { .. })
        ));
    }

    #[tokio::test]
    async fn connect_rejected() {
        let hypervisor = VirshHypervisor::new(PathBuf::from("false"), String::from("qemu:///system"));
        assert!(matches!(
            hypervisor.connect().await,
            Err(HypervisorError::CommandFailed { .. })
        ));
    }

    #[tokio::test]
    async fn connect_accepted() {
        let hypervisor = VirshHypervisor::new(PathBuf::from("true"), String::from("qemu:///system"));
        assert!(hypervisor.connect().await.is_ok());
    }
}
