//! Aggregate analytics over any combination of country, institution and field.

use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::{Generation, lock, targets};
use crate::api::AnalyticsClient;
use crate::canvas::RenderSink;
use crate::canvas::renderer::{RankedColumn, render_ranked_list_html};
use crate::config::UiConfig;
use crate::error::ExplorerError;
use crate::types::{AnalyticsFilter, AnalyticsReport, RankedLists, display_number};

const RESEARCHER_COLUMNS: &[RankedColumn] = &[
    RankedColumn::PrimaryScore,
    RankedColumn::SecondaryScore,
    RankedColumn::Publications,
    RankedColumn::Citations,
];
const INSTITUTION_COLUMNS: &[RankedColumn] =
    &[RankedColumn::PrimaryScore, RankedColumn::SecondaryScore];

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Rendered { institutions_visible: bool },
    /// The server refused the filter; its message was shown verbatim.
    Rejected(String),
    Failed(ExplorerError),
    Stale,
}

/// Combines up to three selections into one analytics query.
pub struct FilterComposer {
    client: AnalyticsClient,
    sink: Arc<dyn RenderSink>,
    ui: UiConfig,
    generation: Mutex<Generation>,
}

impl FilterComposer {
    /// Create the composer with the institution panel hidden.
    pub fn new(client: AnalyticsClient, sink: Arc<dyn RenderSink>, ui: UiConfig) -> Self {
        sink.set_visible(targets::INSTITUTIONS_BLOCK, false);
        Self {
            client,
            sink,
            ui,
            generation: Mutex::new(Generation::default()),
        }
    }

    /// Query and render the analytics for `filter`.
    ///
    /// Errors leave every target untouched. On success the institution panel
    /// is shown exactly when the filter carries a country.
    pub async fn apply(&self, filter: &AnalyticsFilter) -> ApplyOutcome {
        let filter = filter.normalized();
        let ticket = lock(&self.generation).advance();
        debug!(filter = ?filter, generation = %ticket, "Applying analytics filter");

        let result = self.client.analytics(&filter).await;

        let generation = lock(&self.generation);
        if !generation.is_current(ticket) {
            debug!(stale = %ticket, current = generation.value(), "Discarding superseded analytics");
            return ApplyOutcome::Stale;
        }
        match result {
            Ok(report) => {
                let institutions_visible = self.render(&filter, report);
                info!(institutions_visible, "Analytics rendered");
                ApplyOutcome::Rendered {
                    institutions_visible,
                }
            }
            Err(ExplorerError::Domain { message }) => {
                warn!(message = %message, "Analytics filter rejected");
                self.sink.notify(&message);
                ApplyOutcome::Rejected(message)
            }
            Err(e) => {
                warn!(error = %e, "Analytics query failed");
                self.sink.notify(&e.user_message("analytics"));
                ApplyOutcome::Failed(e)
            }
        }
    }

    fn render(&self, filter: &AnalyticsFilter, report: AnalyticsReport) -> bool {
        let ph = self.ui.placeholder.as_str();
        self.sink
            .set_text(targets::AVG_H, display_number(&report.metrics.average_h_index, ph));
        self.sink
            .set_text(targets::AVG_RII, display_number(&report.metrics.average_rii, ph));
        self.render_pair(
            &report.top_researchers,
            targets::TOP_H,
            targets::TOP_RII,
            RESEARCHER_COLUMNS,
        );

        let visible = filter.has_country();
        self.sink.set_visible(targets::INSTITUTIONS_BLOCK, visible);
        if visible {
            let institutions = report.top_institutions.unwrap_or_default();
            self.render_pair(
                &institutions,
                targets::INST_H,
                targets::INST_RII,
                INSTITUTION_COLUMNS,
            );
        }
        visible
    }

    fn render_pair(&self, lists: &RankedLists, by_h: &str, by_rii: &str, columns: &[RankedColumn]) {
        let ph = self.ui.placeholder.as_str();
        let no_data = self.ui.no_data_label.as_str();
        self.sink
            .set_html(by_h, render_ranked_list_html(&lists.by_h_index, columns, no_data, ph));
        self.sink
            .set_html(by_rii, render_ranked_list_html(&lists.by_rii, columns, no_data, ph));
    }
}
