//! The deployment orchestration engine.
//!
//! ```text
//! chat message ─► router ─► sync (pull image, reload catalogue)
//!                   │
//!                   ├─► listing (help / list / service prompt)
//!                   └─► deploy  (lock project, run playbook, report)
//! ```
//!
//! One [`Orchestrator`] is shared by every message handler. Its only mutable
//! state is the catalogue (replaced wholesale), the pull toggle and the
//! per-project deployment locks.

pub mod deploy;
pub mod listing;
pub mod router;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use docker_driver::{ContainerRuntime, ImageRef, RegistryAuth};
use lurch_core::catalogue::CatalogueStore;
use lurch_core::config::{ChannelConfig, Config};
use lurch_core::lock::{KeyLockSet, PullToggle};

pub use sync::PROGRESS_AFTER;

pub struct Orchestrator {
    image: ImageRef,
    auth: Option<RegistryAuth>,
    update_image: bool,
    command: String,
    deploy_channel: ChannelConfig,
    runtime: Arc<dyn ContainerRuntime>,
    catalogue: CatalogueStore,
    /// Set when a newer image arrived but its catalogue has not been read yet.
    refresh_pending: AtomicBool,
    pulling: PullToggle,
    deploying: KeyLockSet,
}

impl Orchestrator {
    pub fn new(config: &Config, runtime: Arc<dyn ContainerRuntime>) -> Self {
        let auth = config.docker.auth.as_ref().map(|a| RegistryAuth {
            username: a.username.clone(),
            password: a.password.clone(),
            server: a.server.clone(),
        });
        Self {
            image: ImageRef::new(&config.docker.image, &config.docker.tag),
            auth,
            update_image: config.docker.update_image,
            command: config.docker.command.clone(),
            deploy_channel: config.deploy_channel.clone(),
            runtime,
            catalogue: CatalogueStore::new(),
            refresh_pending: AtomicBool::new(false),
            pulling: PullToggle::new(),
            deploying: KeyLockSet::new(),
        }
    }

    pub fn catalogue(&self) -> &CatalogueStore {
        &self.catalogue
    }

    /// True while a deployment of `project` is running.
    pub fn is_deploying(&self, project: &str) -> bool {
        self.deploying.contains(project)
    }

    /// True while the catalogue may lag behind the image.
    pub fn refresh_pending(&self) -> bool {
        self.refresh_pending.load(Ordering::SeqCst)
    }

    /// True while an image pull is in flight.
    pub fn is_pulling(&self) -> bool {
        self.pulling.is_on()
    }
}
