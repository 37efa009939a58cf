use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::types::ExecOutput;
use crate::{DockerError, Result};

// ─── DockerProcess ────────────────────────────────────────────────────────

/// Runs one invocation of the docker CLI to completion.
///
/// Stdout and stderr are captured in full; nothing is streamed because every
/// caller needs the whole output before it can act on it.
pub(crate) struct DockerProcess<'a> {
    program: &'a Path,
    args: Vec<String>,
    stdin: Option<&'a str>,
}

impl<'a> DockerProcess<'a> {
    pub(crate) fn new(program: &'a Path, args: Vec<String>) -> Self {
        Self {
            program,
            args,
            stdin: None,
        }
    }

    /// Feed `data` to the process on stdin, then close it.
    pub(crate) fn stdin(mut self, data: &'a str) -> Self {
        self.stdin = Some(data);
        self
    }

    pub(crate) async fn run(self) -> Result<ExecOutput> {
        let mut cmd = Command::new(self.program);
        cmd.args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if self.stdin.is_some() {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }

        let mut child = cmd.spawn().map_err(|source| DockerError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        if let Some(data) = self.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(data.as_bytes()).await?;
                stdin.flush().await?;
                // Dropping stdin closes the pipe so the child sees EOF.
            }
        }

        let output = child.wait_with_output().await?;
        Ok(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Locate the `docker` binary on `PATH`.
pub(crate) fn find_docker() -> Result<PathBuf> {
    which::which("docker").map_err(|_| DockerError::NotInstalled)
}
