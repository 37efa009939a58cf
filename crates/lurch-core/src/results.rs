//! Model of the configuration tool's JSON output (`ANSIBLE_STDOUT_CALLBACK=json`).

use crate::error::{LurchError, Result};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentResult {
    #[serde(default)]
    pub plays: Vec<Play>,
    #[serde(default)]
    pub stats: BTreeMap<String, HostStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Play {
    pub play: Named,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    pub task: Named,
    #[serde(default)]
    pub hosts: BTreeMap<String, HostOutcome>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostOutcome {
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub unreachable: bool,
    #[serde(default, deserialize_with = "message_text")]
    pub msg: String,
}

impl HostOutcome {
    pub fn is_failure(&self) -> bool {
        self.failed || self.unreachable
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct HostStats {
    #[serde(default)]
    pub ok: u64,
    #[serde(default)]
    pub changed: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default, alias = "failures")]
    pub failed: u64,
    #[serde(default)]
    pub unreachable: u64,
}

impl std::ops::Add for HostStats {
    type Output = HostStats;

    fn add(self, rhs: HostStats) -> HostStats {
        HostStats {
            ok: self.ok + rhs.ok,
            changed: self.changed + rhs.changed,
            skipped: self.skipped + rhs.skipped,
            failed: self.failed + rhs.failed,
            unreachable: self.unreachable + rhs.unreachable,
        }
    }
}

/// `msg` is usually a string but modules sometimes emit a list or object.
fn message_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    })
}

/// A task that failed on one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTask {
    pub name: String,
    pub msg: String,
}

/// Failures grouped by play name, then host name, both sorted. Task order
/// within a host follows the tool output.
pub type Failures = BTreeMap<String, BTreeMap<String, Vec<FailedTask>>>;

impl DeploymentResult {
    /// Parse raw tool output.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw).map_err(|e| LurchError::MalformedOutput(e.to_string()))
    }

    /// Collect the failed task records. Plays without failures are omitted.
    pub fn failures(&self) -> Failures {
        let mut plays: Failures = BTreeMap::new();
        for play in &self.plays {
            for task in &play.tasks {
                for (host, outcome) in &task.hosts {
                    if !outcome.is_failure() {
                        continue;
                    }
                    plays
                        .entry(play.play.name.clone())
                        .or_default()
                        .entry(host.clone())
                        .or_default()
                        .push(FailedTask {
                            name: task.task.name.clone(),
                            msg: outcome.msg.clone(),
                        });
                }
            }
        }
        plays
    }

    /// Host names from the run summary, sorted.
    pub fn host_names(&self) -> Vec<&str> {
        self.stats.keys().map(String::as_str).collect()
    }

    /// Sum of every host's summary counts.
    pub fn totals(&self) -> HostStats {
        self.stats
            .values()
            .copied()
            .fold(HostStats::default(), |acc, s| acc + s)
    }
}
