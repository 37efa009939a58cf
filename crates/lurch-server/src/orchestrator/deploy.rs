//! Running a playbook and reporting what happened.

use docker_driver::ExecOutput;
use lurch_core::catalogue::{ActionRef, Playbook};
use lurch_core::error::{LurchError, Result};
use lurch_core::report;
use lurch_core::results::DeploymentResult;
use lurch_core::text::truncate;
use tracing::{debug, info, warn};

use crate::chat::Conversation;
use crate::orchestrator::listing::{service_prompt, unknown_project, unknown_service};
use crate::orchestrator::Orchestrator;

/// Environment for every configuration-tool run: JSON results on stdout and
/// no `.retry` files left behind.
pub const TOOL_ENV: [(&str, &str); 2] = [
    ("ANSIBLE_STDOUT_CALLBACK", "json"),
    ("ANSIBLE_RETRY_FILES_ENABLED", "0"),
];

fn tool_env() -> Vec<(String, String)> {
    TOOL_ENV
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Orchestrator {
    /// `<action> <project>`: the service is missing, so say which exist.
    ///
    /// No lock is taken because nothing runs.
    pub async fn prompt_service(&self, project: &str, conv: &dyn Conversation) -> Result<()> {
        let catalogue = self.catalogue.snapshot();
        let Some(stack) = catalogue.stack(project) else {
            conv.reply(&unknown_project(project)).await;
            return Err(LurchError::ProjectNotFound(project.to_string()));
        };
        conv.reply(&service_prompt(project, stack)).await;
        Ok(())
    }

    /// `<action> <project> <service>`: run the service's playbook.
    ///
    /// Holds the project's deployment lock from just after the project is
    /// resolved until the report has been sent.
    pub async fn deploy(
        &self,
        action: &str,
        project: &str,
        service: &str,
        conv: &dyn Conversation,
    ) -> Result<()> {
        let catalogue = self.catalogue.snapshot();
        let Some(stack) = catalogue.stack(project) else {
            conv.reply(&unknown_project(project)).await;
            return Err(LurchError::ProjectNotFound(project.to_string()));
        };

        let Some(_lock) = self.deploying.try_acquire(project) else {
            info!(project = %project, "deployment rejected, project busy");
            conv.reply(&format!(
                "Patience! I'm already busy deploying services from *{project}* - please wait until I'm done."
            ))
            .await;
            return Err(LurchError::Busy(format!("already deploying {project}")));
        };

        let Some(playbook) = stack.playbook(service) else {
            conv.reply(&unknown_service(project, service, stack)).await;
            return Err(LurchError::ServiceNotFound {
                project: project.to_string(),
                service: service.to_string(),
            });
        };

        let Some(action_ref) = playbook.resolve_action(action) else {
            conv.reply(&unknown_action(project, service, playbook)).await;
            return Err(LurchError::ActionNotFound {
                action: action.to_string(),
                service: service.to_string(),
            });
        };

        let announce = match action_ref {
            ActionRef::Deploy => format!("OK, I'm running the *{project} {service}* service..."),
            ActionRef::Named(name, _) => {
                format!("OK, I'm running the {name} action on the *{project} {service}* service...")
            }
        };
        conv.reply(&announce).await;

        let argv = playbook.command(&self.command, action_ref);
        info!(project = %project, service = %service, action = %action, "running playbook");
        debug!(argv = ?argv, "tool invocation");

        let max = conv.max_message_len();
        let (out, runtime_err) = match self.runtime.exec(&self.image, &argv, &tool_env()).await {
            Ok(out) => (out, None),
            Err(e) => {
                warn!(project = %project, service = %service, error = %e, "playbook run could not complete");
                conv.reply(&truncate(
                    &format!("I'm sorry, *{action}* failed on *{project} {service}*: {e}"),
                    max,
                ))
                .await;
                let out = ExecOutput {
                    exit_code: -1,
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                };
                (out, Some(e))
            }
        };

        let reported = self
            .report(action, project, service, &argv, &out, conv)
            .await;
        match runtime_err {
            Some(e) => Err(LurchError::RuntimeFailure(e.to_string())),
            None => reported,
        }
    }

    /// Turn a finished run into chat messages.
    async fn report(
        &self,
        action: &str,
        project: &str,
        service: &str,
        argv: &[String],
        out: &ExecOutput,
        conv: &dyn Conversation,
    ) -> Result<()> {
        let max = conv.max_message_len();
        let image = self.image.to_string();

        let result = match DeploymentResult::parse(&out.stdout) {
            Ok(result) => result,
            Err(e) if out.success() => {
                warn!(project = %project, service = %service, error = %e, "unreadable tool output");
                let detail = match &e {
                    LurchError::MalformedOutput(detail) => detail.clone(),
                    other => other.to_string(),
                };
                conv.send(&report::parse_error(&detail, max)).await;
                return Err(e);
            }
            Err(_) => {
                info!(project = %project, service = %service, exit_code = out.exit_code, "playbook failed without readable output");
                let raw = if out.stdout.is_empty() {
                    out.stderr_text()
                } else {
                    out.stdout_text()
                };
                conv.send(&report::raw_failure(action, project, service, &raw, max))
                    .await;
                conv.send(&report::repro_command(&image, argv, max)).await;
                return Err(LurchError::ToolFailure {
                    exit_code: out.exit_code,
                });
            }
        };

        if out.success() {
            info!(project = %project, service = %service, hosts = result.stats.len(), "playbook succeeded");
            let text = report::success_report(project, service, &result);
            conv.reply(&truncate(&text, max)).await;
            return Ok(());
        }

        info!(project = %project, service = %service, exit_code = out.exit_code, "playbook failed");
        for message in report::failure_report(action, project, service, &result, max) {
            conv.reply(&message).await;
        }
        // Sent on its own: the code block does not render when appended to
        // the failure text.
        conv.reply(&report::repro_command(&image, argv, max)).await;
        Err(LurchError::ToolFailure {
            exit_code: out.exit_code,
        })
    }
}

/// Reply for an action the service does not declare.
fn unknown_action(project: &str, service: &str, playbook: &Playbook) -> String {
    let actions = playbook.action_names();
    match actions.as_slice() {
        [] => format!("I'm afraid the *{project} {service}* service doesn't have any custom actions."),
        [only] => format!(
            "Hmmm. I don't know that action: the only custom action associated with *{project} {service}* is *{only}*."
        ),
        _ => format!(
            "Hmmm. I don't know that action: these are the custom actions for *{project} {service}* that I'm aware of:\n  • {}",
            actions.join("\n  • ")
        ),
    }
}
