use std::sync::Arc;

use crate::orchestrator::Orchestrator;
use crate::slack::SlackClient;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub slack: SlackClient,
    /// Slack signing secret; `None` disables request verification.
    pub signing_secret: Option<String>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        slack: SlackClient,
        signing_secret: Option<String>,
    ) -> Self {
        Self {
            orchestrator,
            slack,
            signing_secret: signing_secret.filter(|s| !s.is_empty()),
        }
    }
}
