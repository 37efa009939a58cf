//! Test doubles for the container runtime and the chat platform.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use docker_driver::{ContainerRuntime, DockerError, ExecOutput, ImageRef, RegistryAuth};
use lurch_core::config::Config;

use crate::chat::Conversation;
use crate::orchestrator::Orchestrator;

// ─── MockRuntime ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Output { exit_code: i32, stdout: String },
    Fail(String),
}

impl Scripted {
    pub(crate) fn ok(stdout: &str) -> Self {
        Scripted::Output {
            exit_code: 0,
            stdout: stdout.to_string(),
        }
    }

    pub(crate) fn exit(exit_code: i32, stdout: &str) -> Self {
        Scripted::Output {
            exit_code,
            stdout: stdout.to_string(),
        }
    }

    fn run(&self, command: &str) -> docker_driver::Result<ExecOutput> {
        match self {
            Scripted::Output { exit_code, stdout } => Ok(ExecOutput {
                exit_code: *exit_code,
                stdout: stdout.clone().into_bytes(),
                stderr: Vec::new(),
            }),
            Scripted::Fail(msg) => Err(DockerError::Failed {
                command: command.to_string(),
                code: 125,
                stderr: msg.clone(),
            }),
        }
    }
}

/// A container runtime whose pull and exec results are scripted.
///
/// `cat …` commands answer with the catalogue script, anything else with the
/// tool script.
pub(crate) struct MockRuntime {
    pull_delay: Duration,
    pull: Mutex<Scripted>,
    catalogue: Mutex<Scripted>,
    tool: Mutex<Scripted>,
    pub(crate) pulls: AtomicUsize,
    pub(crate) execs: Mutex<Vec<(Vec<String>, Vec<(String, String)>)>>,
}

impl MockRuntime {
    pub(crate) fn new(catalogue_yaml: &str) -> Self {
        Self {
            pull_delay: Duration::from_millis(10),
            pull: Mutex::new(Scripted::ok("Status: Image is up to date for org/devops:latest")),
            catalogue: Mutex::new(Scripted::ok(catalogue_yaml)),
            tool: Mutex::new(Scripted::ok(r#"{"plays": [], "stats": {}}"#)),
            pulls: AtomicUsize::new(0),
            execs: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_pull_delay(mut self, delay: Duration) -> Self {
        self.pull_delay = delay;
        self
    }

    pub(crate) fn set_pull(&self, script: Scripted) {
        *self.pull.lock().unwrap() = script;
    }

    pub(crate) fn set_catalogue(&self, script: Scripted) {
        *self.catalogue.lock().unwrap() = script;
    }

    pub(crate) fn set_tool(&self, script: Scripted) {
        *self.tool.lock().unwrap() = script;
    }

    /// Argv of every exec that was not a catalogue read.
    pub(crate) fn tool_runs(&self) -> Vec<Vec<String>> {
        self.execs
            .lock()
            .unwrap()
            .iter()
            .filter(|(argv, _)| argv.first().map(String::as_str) != Some("cat"))
            .map(|(argv, _)| argv.clone())
            .collect()
    }

    pub(crate) fn catalogue_reads(&self) -> usize {
        self.execs
            .lock()
            .unwrap()
            .iter()
            .filter(|(argv, _)| argv.first().map(String::as_str) == Some("cat"))
            .count()
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn pull(
        &self,
        _image: &ImageRef,
        _auth: Option<&RegistryAuth>,
    ) -> docker_driver::Result<String> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.pull_delay).await;
        let script = self.pull.lock().unwrap().clone();
        match script {
            Scripted::Output { stdout, .. } => Ok(stdout),
            Scripted::Fail(msg) => Err(DockerError::Failed {
                command: "pull".into(),
                code: 1,
                stderr: msg,
            }),
        }
    }

    async fn exec(
        &self,
        _image: &ImageRef,
        argv: &[String],
        env: &[(String, String)],
    ) -> docker_driver::Result<ExecOutput> {
        self.execs
            .lock()
            .unwrap()
            .push((argv.to_vec(), env.to_vec()));
        let script = if argv.first().map(String::as_str) == Some("cat") {
            self.catalogue.lock().unwrap().clone()
        } else {
            self.tool.lock().unwrap().clone()
        };
        script.run("run")
    }
}

// ─── RecordingConversation ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Said {
    Reply(String),
    Send(String),
}

impl Said {
    pub(crate) fn text(&self) -> &str {
        match self {
            Said::Reply(t) | Said::Send(t) => t,
        }
    }
}

pub(crate) struct RecordingConversation {
    said: Mutex<Vec<Said>>,
    max: usize,
}

impl RecordingConversation {
    pub(crate) fn new() -> Self {
        Self::with_max(4000)
    }

    pub(crate) fn with_max(max: usize) -> Self {
        Self {
            said: Mutex::new(Vec::new()),
            max,
        }
    }

    pub(crate) fn said(&self) -> Vec<Said> {
        self.said.lock().unwrap().clone()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.said().iter().map(|s| s.text().to_string()).collect()
    }

    /// True if any message contains `needle`.
    pub(crate) fn mentions(&self, needle: &str) -> bool {
        self.said().iter().any(|s| s.text().contains(needle))
    }
}

#[async_trait]
impl Conversation for RecordingConversation {
    async fn reply(&self, text: &str) {
        self.said.lock().unwrap().push(Said::Reply(text.to_string()));
    }

    async fn send(&self, text: &str) {
        self.said.lock().unwrap().push(Said::Send(text.to_string()));
    }

    fn max_message_len(&self) -> usize {
        self.max
    }
}

// ─── Fixtures ─────────────────────────────────────────────────────────────

pub(crate) const CATALOGUE: &str = r#"
shop:
  playbooks:
    web:
      about: Deploys the storefront.
      location: playbooks/shop/web.yml
      actions:
        restart:
          about: Restart the web workers.
          vars:
            state: restarted
            workers: 4
        rollback:
          vars:
            version: previous
    db:
      location: playbooks/shop/db.yml
blog:
  playbooks:
    site:
      about: Publishes the blog.
      location: playbooks/blog.yml
      actions:
        purge:
          about: Purge the CDN cache.
empty:
  playbooks: {}
"#;

pub(crate) const DEPLOY_CHANNEL: &str = "CDEPLOY";

pub(crate) fn config(update_image: bool) -> Config {
    let mut config = Config::new("org/devops", DEPLOY_CHANNEL);
    config.deploy_channel.name = "deployments".into();
    config.docker.update_image = update_image;
    config
}

/// An orchestrator over `runtime` with auto-update switched off.
pub(crate) fn orchestrator(runtime: Arc<MockRuntime>) -> Orchestrator {
    Orchestrator::new(&config(false), runtime)
}

/// An orchestrator whose catalogue is already loaded from [`CATALOGUE`].
pub(crate) async fn loaded() -> (Orchestrator, Arc<MockRuntime>) {
    let runtime = Arc::new(MockRuntime::new(CATALOGUE));
    let orch = orchestrator(Arc::clone(&runtime));
    let conv = RecordingConversation::new();
    orch.refresh_catalogue(&conv)
        .await
        .expect("fixture catalogue loads");
    (orch, runtime)
}
