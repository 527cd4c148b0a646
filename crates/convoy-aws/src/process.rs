use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{AwsError, Result};

// ─── Tool ─────────────────────────────────────────────────────────────────

/// A resolved external executable.
#[derive(Debug, Clone)]
pub(crate) struct Tool {
    pub(crate) name: &'static str,
    pub(crate) path: PathBuf,
}

impl Tool {
    pub(crate) fn locate(name: &'static str) -> Result<Self> {
        let path = which::which(name).map_err(|_| AwsError::BinaryNotFound(name))?;
        Ok(Self { name, path })
    }

    pub(crate) fn command(&self) -> Command {
        Command::new(&self.path)
    }

    /// Run `cmd`, optionally feeding `stdin`, and return stdout. A non-zero
    /// exit becomes [`AwsError::CommandFailed`] carrying stderr.
    pub(crate) fn run(&self, mut cmd: Command, stdin: Option<&[u8]>) -> Result<String> {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let spawn_err = |source| AwsError::Spawn {
            program: self.name.to_string(),
            source,
        };
        let mut child = cmd.spawn().map_err(spawn_err)?;
        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input).map_err(spawn_err)?;
        }
        let output = child.wait_with_output().map_err(spawn_err)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AwsError::CommandFailed {
                program: self.name.to_string(),
                status: output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                stderr: stderr.trim().to_string(),
            });
        }
        let stdout = String::from_utf8(output.stdout).map_err(|e| AwsError::Decode(e.to_string()))?;
        tracing::debug!(program = self.name, bytes = stdout.len(), "command finished");
        Ok(stdout)
    }
}

// ─── AwsCli ───────────────────────────────────────────────────────────────

/// Driver for the `aws` command-line tool. One value serves the control
/// plane, registry and edge-cache traits.
#[derive(Debug, Clone)]
pub struct AwsCli {
    tool: Tool,
    profile: Option<String>,
    region: Option<String>,
}

impl AwsCli {
    /// Find `aws` on `PATH`.
    pub fn locate(profile: Option<String>, region: Option<String>) -> Result<Self> {
        Ok(Self {
            tool: Tool::locate("aws")?,
            profile: profile.filter(|p| !p.is_empty()),
            region: region.filter(|r| !r.is_empty()),
        })
    }

    /// `aws <service> <operation> --cli-input-json <input> --output json`
    pub(crate) fn call<I, T>(&self, service: &str, operation: &str, input: &I) -> Result<T>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let context = format!("{service} {operation}");
        let input = serde_json::to_string(input).map_err(|source| AwsError::Parse {
            context: context.clone(),
            source,
        })?;

        let mut cmd = self.tool.command();
        cmd.env("AWS_PAGER", "")
            .args([service, operation, "--output", "json", "--cli-input-json"])
            .arg(&input);
        if let Some(profile) = &self.profile {
            cmd.args(["--profile", profile]);
        }
        if let Some(region) = &self.region {
            cmd.args(["--region", region]);
        }

        tracing::debug!(call = %context, "aws");
        let stdout = self.tool.run(cmd, None)?;
        parse_output(&context, &stdout)
    }
}

/// Decode CLI JSON output. Empty output (operations without a response
/// body) decodes as `null`.
pub(crate) fn parse_output<T: DeserializeOwned>(context: &str, stdout: &str) -> Result<T> {
    let body = if stdout.trim().is_empty() {
        "null"
    } else {
        stdout
    };
    serde_json::from_str(body).map_err(|source| AwsError::Parse {
        context: context.to_string(),
        source,
    })
}
