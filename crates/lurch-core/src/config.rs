use crate::error::{LurchError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest message size that still fits a failure header plus one entry.
pub const MIN_MESSAGE_LEN: usize = 256;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SlackConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub signing_secret: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

fn default_api_base() -> String {
    "https://slack.com/api".to_string()
}

fn default_max_message_len() -> usize {
    4000
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            signing_secret: None,
            api_base: default_api_base(),
            max_message_len: default_max_message_len(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelConfig
// ---------------------------------------------------------------------------

/// The one channel where deployments may be requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl ChannelConfig {
    /// Name to show users; falls back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

// ---------------------------------------------------------------------------
// DockerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerConfig {
    pub image: String,
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default = "default_update_image")]
    pub update_image: bool,
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

fn default_tag() -> String {
    "latest".to_string()
}

fn default_update_image() -> bool {
    true
}

fn default_command() -> String {
    "ansible-playbook".to_string()
}

/// Registry credentials used before each pull.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub server: Option<String>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub slack: SlackConfig,
    pub deploy_channel: ChannelConfig,
    pub docker: DockerConfig,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

impl Config {
    pub fn new(image: &str, deploy_channel: &str) -> Self {
        Self {
            listen: default_listen(),
            slack: SlackConfig::default(),
            deploy_channel: ChannelConfig {
                id: deploy_channel.to_string(),
                name: String::new(),
            },
            docker: DockerConfig {
                image: image.to_string(),
                tag: default_tag(),
                update_image: default_update_image(),
                command: default_command(),
                auth: None,
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            LurchError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&data)
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// `image:tag` of the devops image.
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.docker.image, self.docker.tag)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.docker.image.trim().is_empty() {
            warnings.push(ConfigWarning::error("docker.image must not be empty"));
        }
        if self.docker.tag.trim().is_empty() {
            warnings.push(ConfigWarning::error("docker.tag must not be empty"));
        }
        if self.docker.command.trim().is_empty() {
            warnings.push(ConfigWarning::error("docker.command must not be empty"));
        }
        if self.deploy_channel.id.trim().is_empty() {
            warnings.push(ConfigWarning::error("deploy_channel.id must not be empty"));
        }
        if self.slack.token.trim().is_empty() {
            warnings.push(ConfigWarning::error(
                "slack.token is empty: set it in the file or via LURCH_SLACK_TOKEN",
            ));
        }
        if self.slack.max_message_len < MIN_MESSAGE_LEN {
            warnings.push(ConfigWarning::error(format!(
                "slack.max_message_len must be at least {MIN_MESSAGE_LEN}"
            )));
        }
        if self
            .slack
            .signing_secret
            .as_deref()
            .map_or(true, |s| s.trim().is_empty())
        {
            warnings.push(ConfigWarning::warning(
                "slack.signing_secret is not set: incoming requests will not be verified",
            ));
        }
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            warnings.push(ConfigWarning::error(format!(
                "listen '{}' is not a socket address",
                self.listen
            )));
        }

        warnings
    }
}
