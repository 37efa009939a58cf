//! `lurch-core`: the deployment domain behind the `lurch` chat bot.
//!
//! Nothing in this crate talks to Docker or Slack. It holds the catalogue of
//! deployable stacks, the exclusion primitives that keep deployments and image
//! pulls from overlapping, and the model and rendering of playbook results.

pub mod catalogue;
pub mod config;
pub mod error;
pub mod lock;
pub mod report;
pub mod results;
pub mod text;

pub use error::{LurchError, Result};
