//! First-word dispatch of chat commands.

use lurch_core::error::{LurchError, Result};
use tracing::{debug, warn};

use crate::chat::{command_words, Conversation, Inbound};
use crate::orchestrator::listing::{help_list, NO_PROJECTS};
use crate::orchestrator::Orchestrator;

const REPO_URL: &str = "https://github.com/geo-data/lurch";

impl Orchestrator {
    /// Answer one inbound message. Every outcome is reported to `conv`; the
    /// error is only logged.
    pub async fn handle(&self, msg: &Inbound, conv: &dyn Conversation) {
        let words = command_words(&msg.text);
        let Some(first) = words.first() else {
            conv.reply("You rang?").await;
            return;
        };
        debug!(channel = %msg.channel, user = %msg.user, command = %first, "command received");

        match first.as_str() {
            "help" => {
                let topic = words.get(1).map(|t| t.to_lowercase());
                conv.reply(&help_text(topic.as_deref())).await
            }
            "list" => self.list(&words[1..], conv).await,
            "version" => {
                conv.reply(&version_text(option_env!("LURCH_VERSION"), option_env!("LURCH_COMMIT")))
                    .await
            }
            _ => {
                if msg.channel != self.deploy_channel.id {
                    conv.reply(&format!(
                        "I'm sorry, you can only run playbook commands on the *{}* channel. This way everyone is notified.",
                        self.deploy_channel.display_name()
                    ))
                    .await;
                    return;
                }
                if let Err(e) = self.process_deploy(&words, conv).await {
                    warn!(channel = %msg.channel, user = %msg.user, error = %e, "command failed");
                }
            }
        }
    }

    /// `<action> [project [service]]` from the deployment channel.
    async fn process_deploy(&self, words: &[String], conv: &dyn Conversation) -> Result<()> {
        self.ensure_fresh(conv).await?;

        if self.catalogue.snapshot().is_empty() {
            conv.reply(NO_PROJECTS).await;
            return Err(LurchError::ConfigFailure("no projects listed".into()));
        }

        match words {
            [action, project] => {
                debug!(action = %action, project = %project, "service prompt");
                self.prompt_service(project, conv).await
            }
            [action, project, service] => self.deploy(action, project, service, conv).await,
            [] | [_] => {
                conv.reply("I'm not sure what you mean. Try *`help`* instead.")
                    .await;
                Ok(())
            }
            _ => {
                conv.reply("That sounds way too complicated for a simpleton like me to understand! Try *`help`* instead.")
                    .await;
                Ok(())
            }
        }
    }
}

/// `help` and `help <topic>`.
pub fn help_text(topic: Option<&str>) -> String {
    match topic {
        None => "Sure. I can help with the following commands:\n• *`deploy`* - deploy an application.\n• *`list`* - list applications I can deploy.\n• *`version`* - give an idea of how advanced I am.\nUse *`help <command>`* for further details.".to_string(),
        Some("deploy") => "Use *`deploy <project> <service>`* to deploy a service related to a project. If a project has custom actions associated with it then just replace `deploy` with the name of the action.".to_string(),
        Some("list") => help_list(None),
        Some("version") => "This provides the version number I'm tagged with and the commit ID I was built from.".to_string(),
        Some(_) => "How about giving me a chance and using a command I understand?!".to_string(),
    }
}

/// The build's version and commit, linked to the repository.
pub fn version_text(version: Option<&str>, commit: Option<&str>) -> String {
    match (version, commit) {
        (Some(v), Some(c)) if !v.is_empty() && !c.is_empty() => format!(
            "I'm tagged as version <{REPO_URL}/releases/tag/{v}|{v}> built from commit <{REPO_URL}/commit/{c}|{c}>."
        ),
        _ => "It looks like I'm running as a development version.".to_string(),
    }
}
