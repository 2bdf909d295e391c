//! Single-chart ownership per render target.

use uuid::Uuid;

use super::RenderSink;
use super::components::ChartSpec;
use crate::error::{ExplorerError, Result};

/// Ownership wrapper around one live chart widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartHandle {
    pub id: Uuid,
    pub target: String,
}

/// Owns the chart drawn into one render target.
///
/// At most one handle is live at a time; a new render destroys the previous
/// widget before creating its replacement, with no suspension point between.
#[derive(Debug)]
pub struct VisualizationSlot {
    target: String,
    handle: Option<ChartHandle>,
}

impl VisualizationSlot {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            handle: None,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn handle(&self) -> Option<&ChartHandle> {
        self.handle.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    /// Draw a doughnut breakdown of `labels` / `values`.
    ///
    /// Mismatched lengths are rejected and leave the current chart in place.
    /// Empty input draws a chart with zero segments.
    pub fn render(
        &mut self,
        sink: &dyn RenderSink,
        labels: Vec<String>,
        values: Vec<f64>,
    ) -> Result<&ChartHandle> {
        if labels.len() != values.len() {
            return Err(ExplorerError::InvalidChartData {
                labels: labels.len(),
                values: values.len(),
            });
        }
        let spec = ChartSpec::doughnut(labels, values);
        self.clear(sink);
        let id = sink.create_chart(&self.target, &spec);
        let target = self.target.clone();
        Ok(&*self.handle.insert(ChartHandle { id, target }))
    }

    /// Destroy the live widget, if any.
    pub fn clear(&mut self, sink: &dyn RenderSink) {
        if let Some(old) = self.handle.take() {
            sink.destroy_chart(old.id);
        }
    }
}
