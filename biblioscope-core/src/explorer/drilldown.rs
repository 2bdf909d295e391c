//! Field x country researcher modal.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::{Generation, lock, targets};
use crate::api::AnalyticsClient;
use crate::canvas::RenderSink;
use crate::canvas::renderer::{RankedColumn, render_ranked_list_html};
use crate::config::UiConfig;
use crate::error::ExplorerError;
use crate::types::RankedEntry;

const PRIMARY_COLUMNS: &[RankedColumn] = &[RankedColumn::PrimaryScore, RankedColumn::Publications];
const SECONDARY_COLUMNS: &[RankedColumn] = &[RankedColumn::SecondaryScore, RankedColumn::Citations];

/// Typed payload of a clickable country row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrilldownContext {
    pub field: String,
    pub country: String,
    pub country_id: String,
}

impl DrilldownContext {
    pub fn title(&self) -> String {
        format!("{} - Top Researchers in {}", self.country, self.field)
    }
}

/// The page's single modal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalState {
    pub is_open: bool,
    pub title: String,
    pub context: Option<DrilldownContext>,
    pub by_primary: Vec<RankedEntry>,
    pub by_secondary: Vec<RankedEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalOutcome {
    Rendered,
    /// Notified; the lists stay empty.
    Failed(ExplorerError),
    /// Re-opened for another context before this query resolved.
    Stale,
}

struct ModalInner {
    generation: Generation,
    state: ModalState,
}

pub struct DrilldownModal {
    client: AnalyticsClient,
    sink: Arc<dyn RenderSink>,
    ui: UiConfig,
    inner: Mutex<ModalInner>,
}

impl DrilldownModal {
    /// Create the modal in its hidden state.
    pub fn new(client: AnalyticsClient, sink: Arc<dyn RenderSink>, ui: UiConfig) -> Self {
        sink.set_visible(targets::MODAL, false);
        Self {
            client,
            sink,
            ui,
            inner: Mutex::new(ModalInner {
                generation: Generation::default(),
                state: ModalState::default(),
            }),
        }
    }

    /// Show the modal for `context` and load its two rankings. Opening while
    /// already open replaces title and content.
    pub async fn open(&self, context: DrilldownContext) -> ModalOutcome {
        let ticket = {
            let mut inner = lock(&self.inner);
            let ticket = inner.generation.advance();
            let title = context.title();
            self.sink.set_visible(targets::MODAL, true);
            self.sink.set_text(targets::MODAL_TITLE, title.clone());
            self.sink.clear(targets::MODAL_BY_H);
            self.sink.clear(targets::MODAL_BY_RII);
            inner.state = ModalState {
                is_open: true,
                title,
                context: Some(context.clone()),
                by_primary: Vec::new(),
                by_secondary: Vec::new(),
            };
            ticket
        };
        info!(field = %context.field, country_id = %context.country_id, generation = %ticket, "Opening drilldown");

        let result = self
            .client
            .field_country_researchers(&context.field, &context.country_id)
            .await;

        let mut inner = lock(&self.inner);
        if !inner.generation.is_current(ticket) {
            debug!(stale = %ticket, current = %inner.generation, "Discarding superseded drilldown");
            return ModalOutcome::Stale;
        }
        match result {
            Ok(lists) => {
                let ph = self.ui.placeholder.as_str();
                let no_data = self.ui.no_data_label.as_str();
                self.sink.set_html(
                    targets::MODAL_BY_H,
                    render_ranked_list_html(&lists.by_h_index, PRIMARY_COLUMNS, no_data, ph),
                );
                self.sink.set_html(
                    targets::MODAL_BY_RII,
                    render_ranked_list_html(&lists.by_rii, SECONDARY_COLUMNS, no_data, ph),
                );
                inner.state.by_primary = lists.by_h_index;
                inner.state.by_secondary = lists.by_rii;
                ModalOutcome::Rendered
            }
            Err(e) => {
                warn!(error = %e, "Drilldown query failed");
                self.sink.notify(&e.user_message("researchers"));
                ModalOutcome::Failed(e)
            }
        }
    }

    /// Hide the modal. Content stays until the next open.
    pub fn close(&self) {
        let mut inner = lock(&self.inner);
        inner.state.is_open = false;
        self.sink.set_visible(targets::MODAL, false);
    }

    pub fn state(&self) -> ModalState {
        lock(&self.inner).state.clone()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.inner).state.is_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiRequest, MockBackend};
    use crate::canvas::Canvas;
    use serde_json::json;

    fn context(country: &str, id: &str) -> DrilldownContext {
        DrilldownContext {
            field: "AI".into(),
            country: country.into(),
            country_id: id.into(),
        }
    }

    fn setup() -> (Arc<MockBackend>, Arc<Canvas>, DrilldownModal) {
        let mock = Arc::new(MockBackend::new());
        let canvas = Arc::new(Canvas::new());
        let modal = DrilldownModal::new(
            AnalyticsClient::new(mock.clone()),
            canvas.clone(),
            UiConfig::default(),
        );
        (mock, canvas, modal)
    }

    #[tokio::test]
    async fn test_open_renders_both_lists() {
        let (mock, canvas, modal) = setup();
        assert!(!canvas.is_visible(targets::MODAL));
        mock.respond(
            ApiRequest::FieldCountryResearchers {
                field: "AI".into(),
                country_id: "c9".into(),
            },
            json!({
                "by_h_index": [{"full_name": "Ana", "h_index": 22, "total_publications": 80}],
                "by_rii": [{"full_name": "Bo", "rii": 2.5, "total_citations": 900}]
            }),
        );

        let outcome = modal.open(context("France", "c9")).await;

        assert_eq!(outcome, ModalOutcome::Rendered);
        assert!(canvas.is_visible(targets::MODAL));
        assert_eq!(canvas.content(targets::MODAL_TITLE), "France - Top Researchers in AI");
        let by_h = canvas.content(targets::MODAL_BY_H);
        assert!(by_h.contains("H-index: 22"));
        assert!(by_h.contains("Publications: 80"));
        let by_rii = canvas.content(targets::MODAL_BY_RII);
        assert!(by_rii.contains("RII: 2.5"));
        assert!(by_rii.contains("Citations: 900"));
        assert_eq!(modal.state().by_primary.len(), 1);
    }

    #[tokio::test]
    async fn test_close_keeps_content() {
        let (mock, canvas, modal) = setup();
        mock.respond(
            ApiRequest::FieldCountryResearchers {
                field: "AI".into(),
                country_id: "c4".into(),
            },
            json!([]),
        );
        modal.open(context("Germany", "c4")).await;

        modal.close();

        assert!(!modal.is_open());
        assert!(!canvas.is_visible(targets::MODAL));
        assert!(canvas.content(targets::MODAL_BY_H).contains("No data"));
        assert_eq!(modal.state().title, "Germany - Top Researchers in AI");
    }

    #[tokio::test]
    async fn test_failed_open_notifies() {
        let (_mock, canvas, modal) = setup();

        let outcome = modal.open(context("Spain", "c2")).await;

        assert!(matches!(outcome, ModalOutcome::Failed(_)));
        assert!(modal.is_open());
        assert_eq!(canvas.notifications(), vec!["Failed to fetch researchers"]);
        assert_eq!(canvas.content(targets::MODAL_BY_H), "");
    }
}
