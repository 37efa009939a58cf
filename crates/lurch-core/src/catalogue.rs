//! The catalogue of deployable stacks: project → service → named action.
//!
//! A catalogue is read from `lurch.yml` inside the devops image. It is never
//! edited in place: [`CatalogueStore::replace`] publishes a whole new value and
//! readers keep whichever [`Arc`] snapshot they already took.

use crate::error::Result;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// File read out of the devops image to build the catalogue.
pub const CATALOGUE_FILE: &str = "lurch.yml";

/// The action every playbook supports without declaring it.
pub const DEFAULT_ACTION: &str = "deploy";

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Catalogue {
    stacks: BTreeMap<String, Stack>,
}

impl Catalogue {
    /// Parse the YAML document produced by `cat lurch.yml`.
    ///
    /// An empty document is an empty catalogue.
    pub fn parse(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn stack(&self, project: &str) -> Option<&Stack> {
        self.stacks.get(project)
    }

    /// Project names in sorted order.
    pub fn project_names(&self) -> Vec<&str> {
        self.stacks.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Stack {
    #[serde(default)]
    pub playbooks: BTreeMap<String, Playbook>,
}

impl Stack {
    /// Service names sorted by name.
    pub fn service_names(&self) -> Vec<&str> {
        self.playbooks.keys().map(String::as_str).collect()
    }

    pub fn playbook(&self, service: &str) -> Option<&Playbook> {
        self.playbooks.get(service)
    }
}

// ---------------------------------------------------------------------------
// Playbook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Playbook {
    #[serde(default)]
    pub about: String,
    pub location: String,
    #[serde(default)]
    pub actions: BTreeMap<String, Action>,
}

/// An action resolved against a playbook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionRef<'a> {
    /// The implicit `deploy` action: no extra variables.
    Deploy,
    Named(&'a str, &'a Action),
}

impl ActionRef<'_> {
    pub fn name(&self) -> &str {
        match self {
            ActionRef::Deploy => DEFAULT_ACTION,
            ActionRef::Named(name, _) => name,
        }
    }
}

impl Playbook {
    /// Named action names in sorted order (never includes `deploy`).
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    /// Resolve `name` to an action. `deploy` always resolves; every other name
    /// must be declared under `actions`.
    pub fn resolve_action<'a>(&'a self, name: &'a str) -> Option<ActionRef<'a>> {
        if name == DEFAULT_ACTION {
            return Some(ActionRef::Deploy);
        }
        self.actions
            .get_key_value(name)
            .map(|(k, a)| ActionRef::Named(k.as_str(), a))
    }

    /// Build the configuration-tool argv: the base command, one
    /// `--extra-vars key=value` pair per action variable in definition order,
    /// then the playbook location.
    pub fn command(&self, base: &str, action: ActionRef<'_>) -> Vec<String> {
        let mut argv: Vec<String> = base.split_whitespace().map(str::to_string).collect();
        if let ActionRef::Named(_, act) = action {
            for (k, v) in &act.vars {
                argv.push("--extra-vars".to_string());
                argv.push(format!("{k}={v}"));
            }
        }
        argv.push(self.location.clone());
        argv
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub about: String,
    /// Extra variables, kept in the order they were written.
    #[serde(default, deserialize_with = "ordered_vars")]
    pub vars: Vec<(String, String)>,
}

fn ordered_vars<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let mapping = Option::<serde_yaml::Mapping>::deserialize(deserializer)?.unwrap_or_default();
    let mut vars = Vec::with_capacity(mapping.len());
    for (k, v) in mapping {
        let key = scalar(k).map_err(D::Error::custom)?;
        let value = scalar(v).map_err(D::Error::custom)?;
        vars.push((key, value));
    }
    Ok(vars)
}

fn scalar(value: serde_yaml::Value) -> std::result::Result<String, String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        other => Err(format!("action variables must be scalars, got {other:?}")),
    }
}

// ---------------------------------------------------------------------------
// CatalogueStore
// ---------------------------------------------------------------------------

/// Shared holder for the current catalogue.
///
/// `None` until the first successful load.
#[derive(Debug, Default)]
pub struct CatalogueStore {
    current: RwLock<Option<Arc<Catalogue>>>,
}

impl CatalogueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current catalogue, or an empty one if none has been loaded yet.
    pub fn snapshot(&self) -> Arc<Catalogue> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.clone().unwrap_or_default()
    }

    pub fn is_loaded(&self) -> bool {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.is_some()
    }

    /// Publish `catalogue` as the new current value.
    pub fn replace(&self, catalogue: Catalogue) {
        let next = Arc::new(catalogue);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(next);
    }
}
