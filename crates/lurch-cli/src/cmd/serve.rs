use crate::settings::{self, Overrides};
use anyhow::Context;
use docker_driver::DockerCli;
use lurch_core::config::WarnLevel;
use std::path::Path;
use std::sync::Arc;

pub fn run(path: &Path, overrides: &Overrides, listen: Option<String>) -> anyhow::Result<()> {
    let mut config = settings::load(path, overrides)?;
    if let Some(listen) = listen {
        config.listen = listen;
    }

    let mut errors = Vec::new();
    for w in config.validate() {
        match w.level {
            WarnLevel::Warning => tracing::warn!("{}", w.message),
            WarnLevel::Error => errors.push(w.message),
        }
    }
    if !errors.is_empty() {
        anyhow::bail!("invalid config: {}", errors.join("; "));
    }

    let docker = DockerCli::detect().context("cannot run deployments")?;

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(lurch_server::serve(config, Arc::new(docker)))
}
