//! # Canvas
//!
//! The page seen as a set of named render targets plus an opaque chart
//! widget library. Views write through the [`RenderSink`] trait; [`Canvas`]
//! is the in-memory implementation used by tests and the terminal driver.

pub mod components;
pub mod protocol;
pub mod renderer;
pub mod slot;

pub use components::{ChartDataset, ChartSpec};
pub use protocol::{CanvasSnapshot, ChartWidget, Notification, TargetContent, TargetState};
pub use renderer::{RankedColumn, escape_html};
pub use slot::{ChartHandle, VisualizationSlot};

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Write access to the page's render targets and chart widgets.
///
/// Every call is synchronous; callers hold their own view lock across a
/// sequence of writes so no other task interleaves.
pub trait RenderSink: Send + Sync {
    /// Replace a target's content with an HTML fragment.
    fn set_html(&self, target: &str, html: String);

    /// Replace a target's content with plain text.
    fn set_text(&self, target: &str, text: String);

    /// Set the value of an input target.
    fn set_value(&self, target: &str, value: &str);

    fn set_visible(&self, target: &str, visible: bool);

    fn set_enabled(&self, target: &str, enabled: bool);

    /// Empty a target's content.
    fn clear(&self, target: &str);

    /// Raise a blocking notification.
    fn notify(&self, message: &str);

    /// Construct a chart widget bound to `target`.
    fn create_chart(&self, target: &str, spec: &ChartSpec) -> Uuid;

    /// Destroy a chart widget. Unknown ids are ignored.
    fn destroy_chart(&self, id: Uuid);
}

#[derive(Debug, Default)]
struct CanvasState {
    targets: BTreeMap<String, TargetState>,
    charts: HashMap<Uuid, ChartWidget>,
    notifications: Vec<Notification>,
}

/// In-memory page. Absent targets read as empty, visible and enabled.
#[derive(Debug, Default)]
pub struct Canvas {
    state: Mutex<CanvasState>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CanvasState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_target(&self, target: &str, f: impl FnOnce(&mut TargetState)) {
        let mut state = self.lock();
        f(state.targets.entry(target.to_string()).or_default());
    }

    /// Current state of a target.
    pub fn target(&self, target: &str) -> TargetState {
        self.lock().targets.get(target).cloned().unwrap_or_default()
    }

    /// Content of a target as a string (markup or text).
    pub fn content(&self, target: &str) -> String {
        self.target(target).content.as_str().to_string()
    }

    pub fn value(&self, target: &str) -> String {
        self.target(target).value
    }

    pub fn is_visible(&self, target: &str) -> bool {
        self.target(target).visible
    }

    pub fn is_enabled(&self, target: &str) -> bool {
        self.target(target).enabled
    }

    /// Number of live chart widgets bound to `target`.
    pub fn live_charts(&self, target: &str) -> usize {
        self.lock()
            .charts
            .values()
            .filter(|c| c.target == target)
            .count()
    }

    pub fn total_live_charts(&self) -> usize {
        self.lock().charts.len()
    }

    pub fn is_chart_live(&self, id: Uuid) -> bool {
        self.lock().charts.contains_key(&id)
    }

    /// Spec of the live chart bound to `target`, if any.
    pub fn chart(&self, target: &str) -> Option<ChartSpec> {
        self.lock()
            .charts
            .values()
            .find(|c| c.target == target)
            .map(|c| c.spec.clone())
    }

    pub fn notifications(&self) -> Vec<String> {
        self.lock()
            .notifications
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        let state = self.lock();
        let mut charts: Vec<ChartWidget> = state.charts.values().cloned().collect();
        charts.sort_by(|a, b| a.target.cmp(&b.target));
        CanvasSnapshot {
            targets: state.targets.clone(),
            charts,
            notifications: state.notifications.clone(),
        }
    }
}

impl RenderSink for Canvas {
    fn set_html(&self, target: &str, html: String) {
        self.with_target(target, |t| t.content = TargetContent::Markup(html));
    }

    fn set_text(&self, target: &str, text: String) {
        self.with_target(target, |t| t.content = TargetContent::Text(text));
    }

    fn set_value(&self, target: &str, value: &str) {
        self.with_target(target, |t| t.value = value.to_string());
    }

    fn set_visible(&self, target: &str, visible: bool) {
        self.with_target(target, |t| t.visible = visible);
    }

    fn set_enabled(&self, target: &str, enabled: bool) {
        self.with_target(target, |t| t.enabled = enabled);
    }

    fn clear(&self, target: &str) {
        self.with_target(target, |t| t.content = TargetContent::Empty);
    }

    fn notify(&self, message: &str) {
        self.lock().notifications.push(Notification::new(message));
    }

    fn create_chart(&self, target: &str, spec: &ChartSpec) -> Uuid {
        let widget = ChartWidget {
            id: Uuid::new_v4(),
            target: target.to_string(),
            spec: spec.clone(),
            created_at: chrono::Utc::now(),
        };
        let id = widget.id;
        self.lock().charts.insert(id, widget);
        id
    }

    fn destroy_chart(&self, id: Uuid) {
        self.lock().charts.remove(&id);
    }
}
