//! Chart widget specifications.
//!
//! The explorer draws one kind of chart: a proportional doughnut of field
//! percentages, described in the shape of the Chart.js config the page
//! hands to its widget library.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Chart specification (rendered via Chart.js).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Chart.js chart type; always "doughnut" today.
    pub chart_type: String,
    /// Segment labels.
    pub labels: Vec<String>,
    /// Dataset(s). Proportional charts use a single dataset.
    pub datasets: Vec<ChartDataset>,
}

/// A single dataset in a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(default)]
    pub colors: Vec<String>,
}

/// Segment colours, cycled when there are more segments than entries.
const PALETTE: [&str; 10] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

impl ChartSpec {
    /// Build a doughnut breakdown. Callers guarantee equal lengths.
    pub fn doughnut(labels: Vec<String>, values: Vec<f64>) -> Self {
        let colors = (0..values.len())
            .map(|i| PALETTE[i % PALETTE.len()].to_string())
            .collect();
        Self {
            chart_type: "doughnut".into(),
            labels,
            datasets: vec![ChartDataset {
                label: "Share (%)".into(),
                data: values,
                colors,
            }],
        }
    }

    pub fn segment_count(&self) -> usize {
        self.labels.len()
    }

    /// The config object handed to `new Chart(ctx, config)`. Segments carry
    /// their palette colour and the legend sits beside the ring.
    pub fn chartjs_config(&self) -> serde_json::Value {
        let datasets: Vec<serde_json::Value> = self
            .datasets
            .iter()
            .map(|ds| {
                json!({
                    "label": ds.label,
                    "data": ds.data,
                    "backgroundColor": ds.colors,
                    "hoverOffset": 4,
                })
            })
            .collect();
        json!({
            "type": self.chart_type,
            "data": {"labels": self.labels, "datasets": datasets},
            "options": {
                "responsive": true,
                "plugins": {"legend": {"position": "right"}},
            },
        })
    }
}
