//! Rendering of deployment outcomes into chat messages.
//!
//! Every function here returns text no longer than the `max` it is given so
//! callers can hand the result straight to a chat client with a hard message
//! size limit.

use crate::results::{DeploymentResult, Failures, HostStats};
use crate::text::{plural, sentence, truncate};

/// Report for a run that exited 0 and produced a summary.
pub fn success_report(project: &str, service: &str, result: &DeploymentResult) -> String {
    let mut reply = format!("All *{project} {service}* tasks ran ok");
    let hosts = result.host_names();
    match hosts.as_slice() {
        [] => reply.push_str(", although no hosts were reported."),
        [name] => {
            let stats = &result.stats[*name];
            reply.push_str(&format!(" on the *{name}* host with {}.", host_summary(stats)));
        }
        _ => {
            reply.push_str(&format!(" on the following {} hosts:", hosts.len()));
            for name in hosts {
                let stats = &result.stats[name];
                reply.push_str(&format!("\n  • *{name}*: {}.", host_summary(stats)));
            }
        }
    }
    reply
}

fn host_summary(stats: &HostStats) -> String {
    if stats.changed == 0 {
        "no changes reported".to_string()
    } else {
        format!(
            "{} changed, {} unchanged and {} skipped",
            stats.changed, stats.ok, stats.skipped
        )
    }
}

/// Opening line of every failure report.
pub fn failure_header(action: &str, project: &str, service: &str) -> String {
    format!("I'm sorry, *{action}* failed on *{project} {service}*:")
}

/// Break failures into the units a report may be split between: one header
/// line per host followed by one numbered entry per failed task.
pub fn failure_units(failures: &Failures) -> Vec<String> {
    let mut units = Vec::new();
    for hosts in failures.values() {
        for (host, tasks) in hosts {
            units.push(format!(
                "The *{host}* host has {} {} failing:",
                tasks.len(),
                plural(tasks.len(), "task", "tasks")
            ));
            for (i, task) in tasks.iter().enumerate() {
                units.push(format!(
                    "*{}. {}* returned this error:\n>{}",
                    i + 1,
                    sentence(&task.name, ""),
                    task.msg.replace('\n', "\n>")
                ));
            }
        }
    }
    units
}

/// Join `units` with newlines into messages of at most `max` bytes.
///
/// A message is flushed before appending a unit that would overflow it, so a
/// unit is never split across messages. A unit that is larger than `max` on
/// its own is truncated.
pub fn chunk<I>(units: I, max: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut messages = Vec::new();
    let mut buf = String::new();
    for unit in units {
        let unit = truncate(&unit, max);
        if buf.is_empty() {
            buf = unit;
        } else if buf.len() + 1 + unit.len() > max {
            messages.push(std::mem::replace(&mut buf, unit));
        } else {
            buf.push('\n');
            buf.push_str(&unit);
        }
    }
    if !buf.is_empty() {
        messages.push(buf);
    }
    messages
}

/// Failure report for a run that exited non-zero with readable output.
pub fn failure_report(
    action: &str,
    project: &str,
    service: &str,
    result: &DeploymentResult,
    max: usize,
) -> Vec<String> {
    let header = failure_header(action, project, service);
    let units = std::iter::once(header).chain(failure_units(&result.failures()));
    chunk(units, max)
}

/// Failure report when the tool exited non-zero and its output could not be
/// parsed: the raw output is quoted as-is.
pub fn raw_failure(action: &str, project: &str, service: &str, output: &str, max: usize) -> String {
    let output = output.trim();
    let reply = if output.is_empty() {
        format!("I'm sorry, *{action}* failed on *{project} {service}* without producing any output.")
    } else {
        format!("{}\n>>>{output}", failure_header(action, project, service))
    };
    truncate(&reply, max)
}

/// Message for output that could not be parsed even though the tool reported
/// success.
pub fn parse_error(err: &str, max: usize) -> String {
    truncate(
        &format!("Oh dear! I couldn't read the JSON returned by the playbook run:```{err}```"),
        max,
    )
}

const REPRO_INTRO: &str = "You can replicate this problem from a terminal with:\n```";
const FENCE: &str = "```";

/// The terminal commands that reproduce a run outside of chat.
///
/// A command too long for `max` is cut inside the code block so the closing
/// fence survives.
pub fn repro_command(image: &str, argv: &[String], max: usize) -> String {
    let cmd = format!(
        "docker pull {image} && \\\ndocker run -t --rm {image} {}",
        argv.join(" ")
    );
    let room = max.saturating_sub(REPRO_INTRO.len() + FENCE.len());
    format!("{REPRO_INTRO}{}{FENCE}", truncate(&cmd, room))
}
