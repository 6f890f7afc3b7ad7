//! Remote command execution on managed switches.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;

/// Captured result of a remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RemoteOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Failed to start remote session to {target}: {source}")]
    Spawn {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs a shell command on a remote host.
///
/// Implementations report what happened; callers decide whether a failure
/// matters.
#[allow(async_fn_in_trait)]
pub trait RemoteExecutor {
    async fn run(&self, target: &str, command: &str) -> Result<RemoteOutput, RemoteError>;
}

/// `ssh -i <identity> <user>@<target> <command>`
#[derive(Debug, Clone)]
pub struct SshExecutor {
    identity_file: PathBuf,
    username: String,
}

impl SshExecutor {
    pub fn new(identity_file: impl Into<PathBuf>, username: impl Into<String>) -> Self {
        Self {
            identity_file: identity_file.into(),
            username: username.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.ssh_identity_file, &config.ssh_username)
    }

    fn args(&self, target: &str, command: &str) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.identity_file.display().to_string(),
            format!("{}@{}", self.username, target),
            command.to_string(),
        ]
    }
}

impl RemoteExecutor for SshExecutor {
    async fn run(&self, target: &str, command: &str) -> Result<RemoteOutput, RemoteError> {
        debug!(host = target, command, "Running remote command");

        let output = Command::new("ssh")
            .args(self.args(target, command))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RemoteError::Spawn {
                target: target.to_string(),
                source,
            })?;

        Ok(RemoteOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Route change sent to a switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteCommand {
    Add {
        prefix: String,
        prefix_len: u8,
        gateway: String,
    },
    Delete {
        prefix: String,
        prefix_len: u8,
        gateway: String,
    },
}

impl RouteCommand {
    pub fn add(prefix: &str, prefix_len: u8, gateway: &str) -> Self {
        Self::Add {
            prefix: prefix.to_string(),
            prefix_len,
            gateway: gateway.to_string(),
        }
    }

    pub fn delete(prefix: &str, prefix_len: u8, gateway: &str) -> Self {
        Self::Delete {
            prefix: prefix.to_string(),
            prefix_len,
            gateway: gateway.to_string(),
        }
    }
}

impl fmt::Display for RouteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (verb, prefix, prefix_len, gateway) = match self {
            Self::Add { prefix, prefix_len, gateway } => ("add", prefix, prefix_len, gateway),
            Self::Delete { prefix, prefix_len, gateway } => ("del", prefix, prefix_len, gateway),
        };
        write!(f, "sudo ip route {verb} {prefix}/{prefix_len} via {gateway}")
    }
}
