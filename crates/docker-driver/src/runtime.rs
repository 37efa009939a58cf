use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::process::{find_docker, DockerProcess};
use crate::types::{status_line, ExecOutput, ImageRef, RegistryAuth};
use crate::{DockerError, Result};

/// Exit code docker itself uses when it could not run the container at all.
const DOCKER_RUN_FAILED: i32 = 125;

// ─── ContainerRuntime ─────────────────────────────────────────────────────

/// The two operations lurch needs from a container runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Refresh the local copy of `image` from its registry and return the
    /// runtime's status text for the pull.
    async fn pull(&self, image: &ImageRef, auth: Option<&RegistryAuth>) -> Result<String>;

    /// Run `argv` in a fresh container of `image` with the given environment
    /// overrides. A non-zero exit of the command itself is not an error.
    async fn exec(
        &self,
        image: &ImageRef,
        argv: &[String],
        env: &[(String, String)],
    ) -> Result<ExecOutput>;
}

// ─── DockerCli ────────────────────────────────────────────────────────────

/// [`ContainerRuntime`] backed by the `docker` command line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: PathBuf,
}

impl DockerCli {
    /// Use the `docker` binary found on `PATH`.
    pub fn detect() -> Result<Self> {
        Ok(Self {
            program: find_docker()?,
        })
    }

    /// Use a specific executable in place of `docker`.
    pub fn with_executable(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn login(&self, auth: &RegistryAuth) -> Result<()> {
        let mut args = vec![
            "login".to_string(),
            "--username".to_string(),
            auth.username.clone(),
            "--password-stdin".to_string(),
        ];
        if let Some(server) = &auth.server {
            args.push(server.clone());
        }
        debug!(username = %auth.username, server = ?auth.server, "docker login");

        let out = DockerProcess::new(&self.program, args)
            .stdin(&auth.password)
            .run()
            .await?;
        if !out.success() {
            return Err(DockerError::Login(out.stderr_text().trim().to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn pull(&self, image: &ImageRef, auth: Option<&RegistryAuth>) -> Result<String> {
        if let Some(auth) = auth {
            self.login(auth).await?;
        }

        debug!(image = %image, "docker pull");
        let out = DockerProcess::new(&self.program, vec!["pull".into(), image.to_string()])
            .run()
            .await?;
        if !out.success() {
            return Err(DockerError::Failed {
                command: "pull".into(),
                code: out.exit_code,
                stderr: out.stderr_text().trim().to_string(),
            });
        }
        Ok(status_line(&out.stdout_text()))
    }

    async fn exec(
        &self,
        image: &ImageRef,
        argv: &[String],
        env: &[(String, String)],
    ) -> Result<ExecOutput> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];
        for (k, v) in env {
            args.push("-e".to_string());
            args.push(format!("{k}={v}"));
        }
        args.push(image.to_string());
        args.extend(argv.iter().cloned());

        debug!(image = %image, argv = ?argv, "docker run");
        let out = DockerProcess::new(&self.program, args).run().await?;
        if out.exit_code == DOCKER_RUN_FAILED {
            return Err(DockerError::Failed {
                command: "run".into(),
                code: out.exit_code,
                stderr: out.stderr_text().trim().to_string(),
            });
        }
        Ok(out)
    }
}
