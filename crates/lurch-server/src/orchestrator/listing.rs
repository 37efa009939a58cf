//! `help`, `list` and the service prompt for two-word deploys.
//!
//! The text builders are plain functions over catalogue values so the
//! zero / one / many phrasing can be tested without a runtime.

use lurch_core::catalogue::{Catalogue, Playbook, Stack};
use lurch_core::text::desentence;

use crate::chat::Conversation;
use crate::orchestrator::Orchestrator;

const BULLET: &str = "\n  • ";

impl Orchestrator {
    /// Handle `list [project [service]]`; `words` excludes `list` itself.
    pub async fn list(&self, words: &[String], conv: &dyn Conversation) {
        if self.ensure_fresh(conv).await.is_err() {
            // The synchronizer has already told the user what went wrong.
            return;
        }

        let catalogue = self.catalogue.snapshot();
        if catalogue.is_empty() {
            conv.reply(NO_PROJECTS).await;
            return;
        }

        let reply = match words {
            [] => projects_text(&catalogue),
            [project] => match catalogue.stack(project) {
                Some(stack) => project_text(project, stack),
                None => unknown_project(project),
            },
            [project, service] => match catalogue.stack(project) {
                Some(stack) => match stack.playbook(service) {
                    Some(playbook) => playbook_text(service, playbook),
                    None => unknown_service(project, service, stack),
                },
                None => unknown_project(project),
            },
            _ => help_list(Some("I'm sorry, I have no idea what you're asking")),
        };
        conv.reply(&reply).await;
    }
}

pub(crate) const NO_PROJECTS: &str = "I'm sorry; there aren't any projects listed.";

/// `list` with no arguments.
pub fn projects_text(catalogue: &Catalogue) -> String {
    let projects = catalogue.project_names();
    match projects.as_slice() {
        [] => "Sorry, there don't seem to be any projects at the moment.".to_string(),
        [only] => format!("I only know about the *{only}* project."),
        _ => format!(
            "I know about the following {} projects:{BULLET}{}",
            projects.len(),
            projects.join(BULLET)
        ),
    }
}

/// `list <project>`: the services of a project.
pub fn project_text(project: &str, stack: &Stack) -> String {
    let services = stack.service_names();
    match services.as_slice() {
        [] => format!("It doesn't look like there are any services associated with *{project}*."),
        [only] => {
            let playbook = &stack.playbooks[*only];
            let mut reply = format!("The *{project}* project only has the *{only}* service");
            if playbook.about.trim().is_empty() {
                reply.push_str(" associated with it.");
            } else {
                reply.push_str(&format!(" designed to {}.", desentence(&playbook.about)));
            }
            match playbook.actions.len() {
                0 => {}
                1 => reply.push_str("  This has 1 additional action you can invoke."),
                n => reply.push_str(&format!("  This has {n} additional actions you can invoke.")),
            }
            reply
        }
        _ => {
            let mut reply = format!(
                "The *{project}* project has {} services associated with it:",
                services.len()
            );
            for name in services {
                let playbook = &stack.playbooks[name];
                reply.push_str(&format!("{BULLET}*{name}*"));
                match playbook.actions.len() {
                    0 => {}
                    1 => reply.push_str(" (with 1 action)"),
                    n => reply.push_str(&format!(" (with {n} actions)")),
                }
                if !playbook.about.trim().is_empty() {
                    reply.push_str(&format!(": {}", desentence(&playbook.about)));
                }
            }
            reply
        }
    }
}

/// `list <project> <service>`: the named actions of a service.
pub fn playbook_text(service: &str, playbook: &Playbook) -> String {
    let actions = playbook.action_names();
    match actions.as_slice() {
        [] => format!("There aren't any additional actions associated with *{service}*."),
        [only] => {
            let action = &playbook.actions[*only];
            let mut reply =
                format!("In addition to `deploy`, the *{service}* service has the *{only}* action");
            if action.about.trim().is_empty() {
                reply.push_str(" associated with it.");
            } else {
                reply.push_str(&format!(" designed to {}.", desentence(&action.about)));
            }
            reply
        }
        _ => {
            let mut reply = format!(
                "The *{service}* service has {} actions associated with it:",
                actions.len()
            );
            for name in actions {
                reply.push_str(&format!("{BULLET}*{name}*"));
                let about = &playbook.actions[name].about;
                if !about.trim().is_empty() {
                    reply.push_str(&format!(": {}", desentence(about)));
                }
            }
            reply
        }
    }
}

/// Reply to `<action> <project>`: the service still has to be named.
pub fn service_prompt(project: &str, stack: &Stack) -> String {
    let services = stack.service_names();
    match services.as_slice() {
        [] => format!("It doesn't look like there are any services associated with *{project}*."),
        [only] => format!(
            "The *{project}* project only has the *{only}* service associated with it but you need to explicitly type it."
        ),
        _ => format!(
            "Please specify a service from the *{project}* project:{BULLET}{}",
            services.join(BULLET)
        ),
    }
}

pub fn unknown_project(project: &str) -> String {
    format!(
        "Oh dear. I'm afraid I don't know anything about the *{project}* project. Perhaps it's a typo or perhaps you need to configure it?"
    )
}

/// Unknown service, listing the alternatives when there is a choice.
pub fn unknown_service(project: &str, service: &str, stack: &Stack) -> String {
    let mut reply =
        format!("Hmmm. I'm not aware of the *{service}* service being part of the *{project}* project.");
    let services = stack.service_names();
    if services.len() > 1 {
        reply.push_str(&format!(" Try one of these:{BULLET}{}", services.join(BULLET)));
    }
    reply
}

/// How to use `list`, optionally behind an opening remark.
pub fn help_list(intro: Option<&str>) -> String {
    let mut reply = intro.map(|i| format!("{i}. ")).unwrap_or_default();
    reply.push_str(
        "Use *`list`* as follows:\n  • Simply *`list`* to find the projects I can deal with;\n  • *`list <project>`* to find services associated with a project;\n  • and *`list <project> <service>`* to describe any custom actions available for a service.",
    );
    reply
}
