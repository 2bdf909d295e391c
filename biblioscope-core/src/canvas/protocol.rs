//! Render-target state types and the serializable page snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::components::ChartSpec;

/// What a render target currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "lowercase")]
pub enum TargetContent {
    #[default]
    Empty,
    /// Escaped HTML fragment.
    Markup(String),
    /// Plain text content.
    Text(String),
}

impl TargetContent {
    pub fn as_str(&self) -> &str {
        match self {
            TargetContent::Empty => "",
            TargetContent::Markup(s) | TargetContent::Text(s) => s,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

/// State of one named render target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetState {
    pub content: TargetContent,
    /// Current value, for input targets.
    pub value: String,
    pub visible: bool,
    pub enabled: bool,
}

impl Default for TargetState {
    fn default() -> Self {
        Self {
            content: TargetContent::Empty,
            value: String::new(),
            visible: true,
            enabled: true,
        }
    }
}

/// A live chart widget bound to a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartWidget {
    pub id: Uuid,
    pub target: String,
    pub spec: ChartSpec,
    pub created_at: DateTime<Utc>,
}

/// A blocking user notification (the page's alert).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}

/// Full snapshot of the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasSnapshot {
    pub targets: BTreeMap<String, TargetState>,
    pub charts: Vec<ChartWidget>,
    pub notifications: Vec<Notification>,
}
