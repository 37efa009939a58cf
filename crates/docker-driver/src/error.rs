use thiserror::Error;

#[derive(Debug, Error)]
pub enum DockerError {
    #[error("docker is not installed or not on PATH")]
    NotInstalled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("docker {command} exited with code {code}: {stderr}")]
    Failed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("registry login failed: {0}")]
    Login(String),

    #[error("background task failed: {0}")]
    Task(String),
}
