use thiserror::Error;

#[derive(Debug, Error)]
pub enum LurchError {
    #[error("busy: {0}")]
    Busy(String),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("service '{service}' not found in project '{project}'")]
    ServiceNotFound { project: String, service: String },

    #[error("action '{action}' not found for service '{service}'")]
    ActionNotFound { action: String, service: String },

    #[error("container runtime failure: {0}")]
    RuntimeFailure(String),

    #[error("malformed tool output: {0}")]
    MalformedOutput(String),

    #[error("tool exited with code {exit_code}")]
    ToolFailure { exit_code: i32 },

    #[error("catalogue refresh failed: {0}")]
    ConfigFailure(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl LurchError {
    /// True for the errors the user resolves by correcting the command.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LurchError::ProjectNotFound(_)
                | LurchError::ServiceNotFound { .. }
                | LurchError::ActionNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LurchError>;
