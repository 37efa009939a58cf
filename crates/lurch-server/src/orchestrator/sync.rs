//! Keeping the devops image, and the catalogue bundled in it, current.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use docker_driver::{DockerError, PullStatus};
use lurch_core::catalogue::{Catalogue, CATALOGUE_FILE};
use lurch_core::error::{LurchError, Result};
use lurch_core::text::truncate;
use tracing::{info, warn};

use crate::chat::Conversation;
use crate::orchestrator::Orchestrator;

/// How long a pull may run before the requester is told to hold on.
pub const PROGRESS_AFTER: Duration = Duration::from_secs(3);

impl Orchestrator {
    /// Make sure the image is current and the catalogue reflects it.
    ///
    /// A catalogue read that fails after a download is retried on the next
    /// call, even if that call's pull finds nothing new.
    ///
    /// Returns `true` if a newer image was downloaded. With auto-update off no
    /// pull happens, but the catalogue is still loaded once if it never was.
    pub async fn ensure_fresh(&self, conv: &dyn Conversation) -> Result<bool> {
        if !self.update_image {
            if !self.catalogue.is_loaded() {
                self.refresh_catalogue(conv).await?;
            }
            return Ok(false);
        }

        let updated = self.pull_image(conv).await?;
        if updated {
            self.refresh_pending.store(true, Ordering::SeqCst);
        }
        if self.refresh_pending() || !self.catalogue.is_loaded() {
            self.refresh_catalogue(conv).await?;
        }
        Ok(updated)
    }

    /// Startup: bring the image and catalogue up to date, then say hello.
    ///
    /// Nothing is loaded yet at startup, so `ensure_fresh` always reads the
    /// catalogue here.
    pub async fn initialise(&self, conv: &dyn Conversation) -> Result<()> {
        self.ensure_fresh(conv).await?;
        conv.send("You rang...?").await;
        Ok(())
    }

    /// Pull the devops image, racing the pull against the progress notice.
    async fn pull_image(&self, conv: &dyn Conversation) -> Result<bool> {
        let Some(_pulling) = self.pulling.try_on() else {
            conv.send("Try again in a sec: I'm busy pulling the latest devops Docker image.")
                .await;
            return Err(LurchError::Busy("an image pull is already in progress".into()));
        };

        let runtime = Arc::clone(&self.runtime);
        let image = self.image.clone();
        let auth = self.auth.clone();
        let mut pull = tokio::spawn(async move { runtime.pull(&image, auth.as_ref()).await });

        let timer = tokio::time::sleep(PROGRESS_AFTER);
        tokio::pin!(timer);
        let mut held = false;

        let outcome = loop {
            tokio::select! {
                joined = &mut pull => {
                    break joined
                        .map_err(|e| DockerError::Task(e.to_string()))
                        .and_then(|r| r);
                }
                () = &mut timer, if !held => {
                    conv.send("Just a sec: I'm checking to see if there's an updated devops Docker image...")
                        .await;
                    held = true;
                }
            }
        };

        let max = conv.max_message_len();
        let status = match outcome {
            Ok(status) => status,
            Err(e) => {
                warn!(image = %self.image, error = %e, "image pull failed");
                let text = if held {
                    format!("Oops! I've just received this error whilst checking for the image:\n```{e}```\nYou'll need to dig into it I'm afraid :disappointed:.")
                } else {
                    format!("I tried and failed to check for an updated devops Docker image. This is the message I received:\n```{e}```\nYou'll need to dig into it I'm afraid :disappointed:.")
                };
                conv.send(&truncate(&text, max)).await;
                return Err(LurchError::RuntimeFailure(e.to_string()));
            }
        };

        let updated = match PullStatus::classify(&status) {
            PullStatus::Downloaded => {
                if held {
                    conv.send("Great - I've just received a newer image that I'm now using.")
                        .await;
                } else {
                    conv.send("Ah! I've just retrieved the latest devops Docker image. :triumph:")
                        .await;
                }
                true
            }
            PullStatus::UpToDate => {
                if held {
                    conv.send("I've just heard back: no new image is available, so I'll continue using the existing one.")
                        .await;
                }
                false
            }
            PullStatus::Unrecognised(text) => {
                let reply = if held {
                    format!("I've just received this message whilst checking for the image. Not sure what it means...\n```{text}```")
                } else {
                    format!("I'm passing on this message I received when checking for an updated devops Docker image. Not sure what it means...\n```{text}```")
                };
                conv.send(&truncate(&reply, max)).await;
                false
            }
        };

        info!(image = %self.image, updated, "image pull finished");
        Ok(updated)
    }

    /// Re-read the catalogue from the image and publish it.
    ///
    /// On any failure the current catalogue stays in place.
    pub async fn refresh_catalogue(&self, conv: &dyn Conversation) -> Result<()> {
        let max = conv.max_message_len();
        let argv = vec!["cat".to_string(), CATALOGUE_FILE.to_string()];

        let out = match self.runtime.exec(&self.image, &argv, &[]).await {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, "catalogue read failed");
                conv.send(&truncate(
                    &format!("I'm sorry, I couldn't update my configuration from the image. The message I got is:\n```{e}```"),
                    max,
                ))
                .await;
                return Err(LurchError::RuntimeFailure(e.to_string()));
            }
        };

        if !out.success() {
            let output = format!("{}{}", out.stdout_text(), out.stderr_text());
            warn!(exit_code = out.exit_code, "catalogue read exited non-zero");
            conv.send(&truncate(
                &format!("I'm sorry, I couldn't update my configuration from the image. This is the output I got:\n```{}```", output.trim()),
                max,
            ))
            .await;
            return Err(LurchError::ConfigFailure(format!(
                "reading {CATALOGUE_FILE} exited with code {}",
                out.exit_code
            )));
        }

        let catalogue = match Catalogue::parse(&out.stdout_text()) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "catalogue parse failed");
                conv.send(&truncate(
                    &format!("Oh dear! I couldn't read the {CATALOGUE_FILE} file from the docker image:\n```{e}```"),
                    max,
                ))
                .await;
                return Err(LurchError::ConfigFailure(e.to_string()));
            }
        };

        info!(projects = catalogue.len(), "catalogue refreshed");
        self.catalogue.replace(catalogue);
        self.refresh_pending.store(false, Ordering::SeqCst);
        Ok(())
    }
}
