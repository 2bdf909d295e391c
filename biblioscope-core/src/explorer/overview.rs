//! Landing page: rankings per entity type plus dataset-wide counts.

use futures::future::join_all;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::{Generation, lock, targets};
use crate::api::AnalyticsClient;
use crate::canvas::RenderSink;
use crate::canvas::renderer::{
    RankedColumn, escape_html, render_ranked_list_html, render_stat_cards_html,
};
use crate::config::UiConfig;
use crate::error::Result;
use crate::types::{EntityType, GlobalStats, Rankings, display_number};

/// A landing-page section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverviewSection {
    Rankings(EntityType),
    Stats,
}

impl OverviewSection {
    /// Every section of the landing page, in display order.
    pub fn all() -> Vec<OverviewSection> {
        let mut sections = vec![OverviewSection::Stats];
        sections.extend(
            [EntityType::Country, EntityType::Institution, EntityType::Researcher]
                .into_iter()
                .map(OverviewSection::Rankings),
        );
        sections
    }

    pub fn target(self) -> String {
        match self {
            OverviewSection::Rankings(entity) => targets::overview_section(entity),
            OverviewSection::Stats => targets::OVERVIEW_STATS.to_string(),
        }
    }
}

enum SectionData {
    Rankings(Rankings),
    Stats(GlobalStats),
}

pub struct OverviewBoard {
    client: AnalyticsClient,
    sink: Arc<dyn RenderSink>,
    ui: UiConfig,
    generation: Mutex<Generation>,
}

impl OverviewBoard {
    pub fn new(client: AnalyticsClient, sink: Arc<dyn RenderSink>, ui: UiConfig) -> Self {
        Self {
            client,
            sink,
            ui,
            generation: Mutex::new(Generation::default()),
        }
    }

    /// Load every section concurrently. A failed section is notified and
    /// keeps whatever it showed before.
    pub async fn load(&self) -> Vec<(OverviewSection, Result<()>)> {
        let ticket = lock(&self.generation).advance();
        info!(generation = %ticket, "Loading overview");

        let loads = OverviewSection::all().into_iter().map(|section| async move {
            let data = match section {
                OverviewSection::Rankings(entity) => {
                    self.client.rankings(entity).await.map(SectionData::Rankings)
                }
                OverviewSection::Stats => self.client.global_stats().await.map(SectionData::Stats),
            };
            (section, self.apply(ticket, section, data))
        });
        join_all(loads).await
    }

    fn apply(&self, ticket: Generation, section: OverviewSection, data: Result<SectionData>) -> Result<()> {
        let generation = lock(&self.generation);
        if !generation.is_current(ticket) {
            debug!(section = ?section, stale = %ticket, "Discarding superseded overview section");
            return Ok(());
        }
        let target = section.target();
        match data {
            Ok(SectionData::Rankings(rankings)) => {
                self.sink.set_html(&target, self.rankings_html(&rankings));
                Ok(())
            }
            Ok(SectionData::Stats(stats)) => {
                let ph = self.ui.placeholder.as_str();
                let cards = [
                    ("Researchers", display_number(&stats.researchers, ph)),
                    ("Countries", display_number(&stats.countries, ph)),
                    ("Institutions", display_number(&stats.institutions, ph)),
                    ("Fields", display_number(&stats.fields, ph)),
                ];
                self.sink.set_html(&target, render_stat_cards_html(&cards));
                Ok(())
            }
            Err(e) => {
                warn!(section = ?section, error = %e, "Overview section failed");
                let what = match section {
                    OverviewSection::Rankings(_) => "rankings",
                    OverviewSection::Stats => "statistics",
                };
                self.sink.notify(&e.user_message(what));
                Err(e)
            }
        }
    }

    fn rankings_html(&self, rankings: &Rankings) -> String {
        let ph = self.ui.placeholder.as_str();
        let no_data = self.ui.no_data_label.as_str();
        let total = rankings
            .total
            .as_ref()
            .map(|t| format!("<div class=\"total\">Total: {}</div>", escape_html(&t.to_string())))
            .unwrap_or_default();
        format!(
            "{}<div class=\"ranking\"><h3>By H-index</h3>{}</div><div class=\"ranking\"><h3>By RII</h3>{}</div>",
            total,
            render_ranked_list_html(&rankings.by_h_index, &[RankedColumn::PrimaryScore], no_data, ph),
            render_ranked_list_html(&rankings.by_rii, &[RankedColumn::SecondaryScore], no_data, ph),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiRequest, MockBackend};
    use crate::canvas::Canvas;
    use serde_json::json;

    #[tokio::test]
    async fn test_sections_render_independently() {
        let mock = Arc::new(MockBackend::new());
        let canvas = Arc::new(Canvas::new());
        let board = OverviewBoard::new(
            AnalyticsClient::new(mock.clone()),
            canvas.clone(),
            UiConfig::default(),
        );
        mock.respond(
            ApiRequest::Rankings {
                entity: EntityType::Country,
            },
            json!({"total": 190, "by_h_index": [{"name": "Japan", "average_h_index": 41}], "by_rii": []}),
        );
        mock.respond(
            ApiRequest::Rankings {
                entity: EntityType::Researcher,
            },
            json!({"by_h_index": [], "by_rii": [{"full_name": "Kenji Ito", "rii": 3.1}]}),
        );
        mock.respond(
            ApiRequest::GlobalStats,
            json!({"researchers": 1200, "countries": 190, "institutions": 800}),
        );
        canvas.set_html("overview-institutions", "<p>cached</p>".into());

        let results = board.load().await;

        assert_eq!(results.len(), 4);
        let countries = canvas.content("overview-countries");
        assert!(countries.contains("Total: 190"));
        assert!(countries.contains("Japan"));
        assert!(canvas.content("overview-researchers").contains("RII: 3.1"));
        let stats = canvas.content(targets::OVERVIEW_STATS);
        assert!(stats.contains("Researchers<br><span>1200</span>"));
        assert!(stats.contains("Fields<br><span>-</span>"));
        // Institutions had no scripted response.
        assert_eq!(canvas.content("overview-institutions"), "<p>cached</p>");
        assert_eq!(canvas.notifications(), vec!["Failed to fetch rankings"]);
        let failed: Vec<_> = results.iter().filter(|(_, r)| r.is_err()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, OverviewSection::Rankings(EntityType::Institution));
    }
}
