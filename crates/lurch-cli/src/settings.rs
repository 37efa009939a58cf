use anyhow::Context;
use lurch_core::config::Config;
use std::path::Path;

/// Values from the command line or environment that win over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub slack_token: Option<String>,
    pub signing_secret: Option<String>,
}

/// Load `path` and apply `overrides`.
pub fn load(path: &Path, overrides: &Overrides) -> anyhow::Result<Config> {
    let mut config = Config::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    if let Some(token) = &overrides.slack_token {
        config.slack.token = token.clone();
    }
    if let Some(secret) = &overrides.signing_secret {
        config.slack.signing_secret = Some(secret.clone());
    }
    Ok(config)
}
