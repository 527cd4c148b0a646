//! `ContainerRuntime` over the `docker` CLI.

use convoy_core::platform::{ContainerRuntime, RegistryAuth};

use crate::process::Tool;
use crate::Result;

#[derive(Debug, Clone)]
pub struct DockerCli {
    tool: Tool,
}

impl DockerCli {
    /// Find `docker` on `PATH`.
    pub fn locate() -> Result<Self> {
        Ok(Self {
            tool: Tool::locate("docker")?,
        })
    }

    fn docker(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<String> {
        let mut cmd = self.tool.command();
        cmd.args(args);
        tracing::debug!(args = ?args, "docker");
        self.tool.run(cmd, stdin)
    }

    /// `docker login` for the registry holding `reference`. The password
    /// goes through stdin.
    fn login(&self, reference: &str, auth: &RegistryAuth) -> Result<()> {
        let server = login_server(reference, auth);
        let mut args = vec!["login", "--username", auth.username.as_str(), "--password-stdin"];
        if let Some(server) = server.as_deref() {
            args.push(server);
        }
        self.docker(&args, Some(auth.password.as_bytes()))?;
        tracing::debug!(server = server.as_deref().unwrap_or("default"), "logged in");
        Ok(())
    }
}

/// Registry host named by a reference's first path segment, if any.
pub fn registry_host(reference: &str) -> Option<&str> {
    let (first, _) = reference.split_once('/')?;
    if first.contains('.') || first.contains(':') || first == "localhost" {
        Some(first)
    } else {
        None
    }
}

fn login_server(reference: &str, auth: &RegistryAuth) -> Option<String> {
    if !auth.server_address.is_empty() {
        return Some(auth.server_address.clone());
    }
    registry_host(reference).map(str::to_string)
}

impl ContainerRuntime for DockerCli {
    fn pull(&self, reference: &str, auth: Option<&RegistryAuth>) -> convoy_core::Result<()> {
        if let Some(auth) = auth {
            self.login(reference, auth)?;
        }
        self.docker(&["pull", "--quiet", reference], None)?;
        Ok(())
    }

    fn tag(&self, source: &str, target: &str) -> convoy_core::Result<()> {
        self.docker(&["tag", source, target], None)?;
        Ok(())
    }

    fn push(&self, reference: &str, auth: &RegistryAuth) -> convoy_core::Result<()> {
        self.login(reference, auth)?;
        self.docker(&["push", "--quiet", reference], None)?;
        Ok(())
    }
}
