//! Detail fan-out for one selected entity.
//!
//! A load clears every target of the view, then issues all of the entity's
//! queries at once. Each result is written to its own targets as soon as it
//! resolves, provided the load that issued it is still the latest one.

use futures::future::join_all;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::drilldown::DrilldownContext;
use super::{Generation, lock, targets};
use crate::api::AnalyticsClient;
use crate::canvas::renderer::{
    RankedColumn, render_articles_html, render_coauthors_html, render_country_shares_html,
    render_ranked_list_html, render_stat_cards_html,
};
use crate::canvas::{ChartHandle, RenderSink, VisualizationSlot};
use crate::config::UiConfig;
use crate::error::{ExplorerError, Result};
use crate::types::{
    Article, Coauthor, EntityOverview, EntityType, FieldCountryShare, FieldShare, RankedLists,
    display_number, display_str,
};

/// One independently rendered piece of a detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailPart {
    /// Summary metric cards.
    Overview,
    /// A country's two institution rankings.
    Institutions,
    /// Field-distribution doughnut.
    Fields,
    Articles,
    Coauthors,
    /// A field's two researcher rankings.
    FieldLists,
    /// A field's country contribution bars.
    FieldCountries,
}

impl DetailPart {
    /// Parts making up the detail view of `entity`.
    pub fn for_entity(entity: EntityType) -> &'static [DetailPart] {
        match entity {
            EntityType::Country => &[
                DetailPart::Overview,
                DetailPart::Institutions,
                DetailPart::Fields,
            ],
            EntityType::Institution => &[DetailPart::Overview, DetailPart::Fields],
            EntityType::Researcher => &[
                DetailPart::Overview,
                DetailPart::Articles,
                DetailPart::Coauthors,
                DetailPart::Fields,
            ],
            EntityType::Field => &[DetailPart::FieldLists, DetailPart::FieldCountries],
        }
    }

    /// Render targets this part writes on the page of `entity`.
    pub fn targets(self, entity: EntityType) -> &'static [&'static str] {
        match self {
            DetailPart::Overview if entity == EntityType::Researcher => &[targets::PROFILE],
            DetailPart::Overview => &[targets::STATS],
            DetailPart::Institutions => &[targets::INSTITUTIONS_BY_H, targets::INSTITUTIONS_BY_RII],
            DetailPart::Fields => &[targets::FIELDS_CHART],
            DetailPart::Articles => &[targets::ARTICLES],
            DetailPart::Coauthors => &[targets::COAUTHORS],
            DetailPart::FieldLists => &[targets::BY_H, targets::BY_RII],
            DetailPart::FieldCountries => &[targets::COUNTRIES],
        }
    }

    fn describe(self) -> &'static str {
        match self {
            DetailPart::Overview => "overview",
            DetailPart::Institutions => "institutions",
            DetailPart::Fields => "field statistics",
            DetailPart::Articles => "articles",
            DetailPart::Coauthors => "co-authors",
            DetailPart::FieldLists => "field overview",
            DetailPart::FieldCountries => "country contribution",
        }
    }
}

/// Lifecycle of the current load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    PartiallyPopulated,
    Settled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartOutcome {
    Applied,
    /// Notified; the part's targets stay cleared.
    Failed(ExplorerError),
    /// A newer load was issued before this part resolved.
    Stale,
}

/// Per-part result of one [`EntityDetailLoader::load_detail`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub generation: Generation,
    pub outcomes: Vec<(DetailPart, PartOutcome)>,
}

impl LoadReport {
    /// Whether any part was discarded as superseded.
    pub fn is_stale(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, o)| matches!(o, PartOutcome::Stale))
    }

    pub fn all_applied(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, o)| matches!(o, PartOutcome::Applied))
    }

    pub fn failures(&self) -> Vec<(DetailPart, &ExplorerError)> {
        self.outcomes
            .iter()
            .filter_map(|(part, o)| match o {
                PartOutcome::Failed(e) => Some((*part, e)),
                _ => None,
            })
            .collect()
    }
}

enum PartData {
    Overview(EntityOverview),
    Institutions(RankedLists),
    Fields(Vec<FieldShare>),
    Articles(Vec<Article>),
    Coauthors(Vec<Coauthor>),
    FieldLists(RankedLists),
    FieldCountries(Vec<FieldCountryShare>),
}

struct DetailState {
    generation: Generation,
    phase: LoadPhase,
    pending: usize,
    current_id: Option<String>,
    chart: VisualizationSlot,
    country_rows: Vec<DrilldownContext>,
}

/// Detail view of one entity type.
pub struct EntityDetailLoader {
    entity: EntityType,
    client: AnalyticsClient,
    sink: Arc<dyn RenderSink>,
    ui: UiConfig,
    state: Mutex<DetailState>,
}

impl EntityDetailLoader {
    pub fn new(
        entity: EntityType,
        client: AnalyticsClient,
        sink: Arc<dyn RenderSink>,
        ui: UiConfig,
    ) -> Self {
        Self {
            entity,
            client,
            sink,
            ui,
            state: Mutex::new(DetailState {
                generation: Generation::default(),
                phase: LoadPhase::Idle,
                pending: 0,
                current_id: None,
                chart: VisualizationSlot::new(targets::FIELDS_CHART),
                country_rows: Vec::new(),
            }),
        }
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    /// Load the detail view of entity `id`, superseding any load in flight.
    pub async fn load_detail(&self, id: &str) -> LoadReport {
        let parts = DetailPart::for_entity(self.entity);
        let ticket = {
            let mut state = lock(&self.state);
            let ticket = state.generation.advance();
            self.reset_locked(&mut state);
            state.phase = LoadPhase::Loading;
            state.pending = parts.len();
            state.current_id = Some(id.to_string());
            ticket
        };
        info!(entity = %self.entity, id, generation = %ticket, parts = parts.len(), "Loading detail");

        let loads = parts.iter().map(|&part| async move {
            let result = self.fetch_part(part, id).await;
            (part, self.apply_part(ticket, part, id, result))
        });
        let outcomes = join_all(loads).await;

        if outcomes.iter().all(|(_, o)| !matches!(o, PartOutcome::Stale)) {
            info!(entity = %self.entity, id, generation = %ticket, "Detail settled");
        }
        LoadReport {
            generation: ticket,
            outcomes,
        }
    }

    /// Return the view to idle, discarding any load in flight.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.generation.advance();
        self.reset_locked(&mut state);
        state.current_id = None;
    }

    fn reset_locked(&self, state: &mut DetailState) {
        for part in DetailPart::for_entity(self.entity) {
            for target in part.targets(self.entity) {
                self.sink.clear(target);
            }
        }
        state.chart.clear(self.sink.as_ref());
        state.country_rows.clear();
        state.pending = 0;
        state.phase = LoadPhase::Idle;
    }

    async fn fetch_part(&self, part: DetailPart, id: &str) -> Result<PartData> {
        let entity = self.entity;
        match part {
            DetailPart::Overview => self.client.overview(entity, id).await.map(PartData::Overview),
            DetailPart::Institutions => self
                .client
                .country_institutions(id)
                .await
                .map(PartData::Institutions),
            DetailPart::Fields => self
                .client
                .field_distribution(entity, id)
                .await
                .map(PartData::Fields),
            DetailPart::Articles => self
                .client
                .researcher_articles(id)
                .await
                .map(PartData::Articles),
            DetailPart::Coauthors => self
                .client
                .researcher_coauthors(id)
                .await
                .map(PartData::Coauthors),
            DetailPart::FieldLists => self.client.field_overview(id).await.map(PartData::FieldLists),
            DetailPart::FieldCountries => self
                .client
                .field_countries(id)
                .await
                .map(PartData::FieldCountries),
        }
    }

    fn apply_part(
        &self,
        ticket: Generation,
        part: DetailPart,
        id: &str,
        result: Result<PartData>,
    ) -> PartOutcome {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        if !state.generation.is_current(ticket) {
            debug!(
                entity = %self.entity,
                part = ?part,
                stale = %ticket,
                current = %state.generation,
                "Discarding superseded detail response"
            );
            return PartOutcome::Stale;
        }
        state.pending = state.pending.saturating_sub(1);
        state.phase = if state.pending == 0 {
            LoadPhase::Settled
        } else {
            LoadPhase::PartiallyPopulated
        };

        match result.and_then(|data| self.render_locked(state, id, data)) {
            Ok(()) => PartOutcome::Applied,
            Err(e) => {
                warn!(entity = %self.entity, part = ?part, error = %e, "Detail part failed");
                self.sink.notify(&e.user_message(part.describe()));
                PartOutcome::Failed(e)
            }
        }
    }

    fn render_locked(&self, state: &mut DetailState, id: &str, data: PartData) -> Result<()> {
        let ph = self.ui.placeholder.as_str();
        let no_data = self.ui.no_data_label.as_str();
        let sink = self.sink.as_ref();
        match data {
            PartData::Overview(overview) => {
                let h = display_number(&overview.primary_score, ph);
                let rii = display_number(&overview.secondary_score, ph);
                let (target, cards) = match self.entity {
                    EntityType::Researcher => (
                        targets::PROFILE,
                        vec![
                            ("H-index", h),
                            ("RII", rii),
                            ("Publications", display_number(&overview.total_publications, ph)),
                            ("Citations", display_number(&overview.total_citations, ph)),
                        ],
                    ),
                    EntityType::Country => {
                        let rank = overview
                            .rank
                            .as_ref()
                            .map(|r| format!("#{r}"))
                            .unwrap_or_else(|| ph.to_string());
                        (targets::STATS, vec![("H-index", h), ("RII", rii), ("Rank", rank)])
                    }
                    _ => (targets::STATS, vec![("H-index", h), ("RII", rii)]),
                };
                sink.set_html(target, render_stat_cards_html(&cards));
            }
            PartData::Institutions(lists) => {
                sink.set_html(
                    targets::INSTITUTIONS_BY_H,
                    render_ranked_list_html(&lists.by_h_index, &[RankedColumn::PrimaryScore], no_data, ph),
                );
                sink.set_html(
                    targets::INSTITUTIONS_BY_RII,
                    render_ranked_list_html(&lists.by_rii, &[RankedColumn::SecondaryScore], no_data, ph),
                );
            }
            PartData::Fields(shares) => {
                let (labels, values): (Vec<String>, Vec<f64>) = shares
                    .into_iter()
                    .map(|s| {
                        let value = s.percentage.as_ref().and_then(|n| n.as_f64()).unwrap_or(0.0);
                        (display_str(&s.field, ph).to_string(), value)
                    })
                    .unzip();
                state.chart.render(sink, labels, values)?;
            }
            PartData::Articles(articles) => {
                sink.set_html(targets::ARTICLES, render_articles_html(&articles, ph));
            }
            PartData::Coauthors(coauthors) => {
                sink.set_html(targets::COAUTHORS, render_coauthors_html(&coauthors, ph));
            }
            PartData::FieldLists(lists) => {
                sink.set_html(
                    targets::BY_H,
                    render_ranked_list_html(&lists.by_h_index, &[RankedColumn::PrimaryScore], no_data, ph),
                );
                sink.set_html(
                    targets::BY_RII,
                    render_ranked_list_html(&lists.by_rii, &[RankedColumn::SecondaryScore], no_data, ph),
                );
            }
            PartData::FieldCountries(shares) => {
                sink.set_html(targets::COUNTRIES, render_country_shares_html(&shares, ph));
                state.country_rows = shares
                    .into_iter()
                    .map(|s| DrilldownContext {
                        field: id.to_string(),
                        country: display_str(&s.country, ph).to_string(),
                        country_id: s.country_id,
                    })
                    .collect();
            }
        }
        Ok(())
    }

    pub fn phase(&self) -> LoadPhase {
        lock(&self.state).phase
    }

    pub fn generation(&self) -> Generation {
        lock(&self.state).generation
    }

    /// Id of the entity the view currently shows or is loading.
    pub fn current_id(&self) -> Option<String> {
        lock(&self.state).current_id.clone()
    }

    pub fn chart_handle(&self) -> Option<ChartHandle> {
        lock(&self.state).chart.handle().cloned()
    }

    /// Typed context of each rendered country row, in display order.
    pub fn country_rows(&self) -> Vec<DrilldownContext> {
        lock(&self.state).country_rows.clone()
    }

    /// `None` for a missing row or one the server sent without a country id.
    pub fn drilldown_context(&self, row: usize) -> Option<DrilldownContext> {
        lock(&self.state)
            .country_rows
            .get(row)
            .filter(|ctx| !ctx.country_id.is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiRequest, MockBackend};
    use crate::canvas::Canvas;
    use serde_json::json;

    fn setup(entity: EntityType) -> (Arc<MockBackend>, Arc<Canvas>, EntityDetailLoader) {
        let mock = Arc::new(MockBackend::new());
        let canvas = Arc::new(Canvas::new());
        let loader = EntityDetailLoader::new(
            entity,
            AnalyticsClient::new(mock.clone()),
            canvas.clone(),
            UiConfig::default(),
        );
        (mock, canvas, loader)
    }

    fn script_country(mock: &MockBackend, id: &str, h: f64, field: &str) {
        mock.respond(
            ApiRequest::Overview {
                entity: EntityType::Country,
                id: id.into(),
            },
            json!({"average_h_index": h, "average_rii": 1.1, "ranking": 4}),
        );
        mock.respond(
            ApiRequest::CountryInstitutions {
                country_id: id.into(),
            },
            json!({"by_h_index": [{"name": "Sorbonne", "average_h_index": 50}], "by_rii": []}),
        );
        mock.respond(
            ApiRequest::FieldDistribution {
                entity: EntityType::Country,
                id: id.into(),
            },
            json!([{"field": field, "percentage": 60}, {"field": "Other", "percentage": 40}]),
        );
    }

    #[tokio::test]
    async fn test_country_detail_renders_every_part() {
        let (mock, canvas, loader) = setup(EntityType::Country);
        script_country(&mock, "c1", 31.5, "Physics");

        let report = loader.load_detail("c1").await;

        assert!(report.all_applied());
        assert_eq!(loader.phase(), LoadPhase::Settled);
        let stats = canvas.content(targets::STATS);
        assert!(stats.contains("31.5"));
        assert!(stats.contains("#4"));
        assert!(canvas.content(targets::INSTITUTIONS_BY_H).contains("Sorbonne"));
        assert!(canvas.content(targets::INSTITUTIONS_BY_RII).contains("No data"));
        assert_eq!(canvas.live_charts(targets::FIELDS_CHART), 1);
        assert_eq!(
            canvas.chart(targets::FIELDS_CHART).unwrap().labels,
            vec!["Physics", "Other"]
        );
    }

    #[tokio::test]
    async fn test_researcher_detail_placeholders() {
        let (mock, canvas, loader) = setup(EntityType::Researcher);
        mock.respond(
            ApiRequest::Overview {
                entity: EntityType::Researcher,
                id: "r1".into(),
            },
            json!({"h_index": 12, "rii": 0.8}),
        );
        mock.respond(
            ApiRequest::ResearcherArticles { id: "r1".into() },
            json!([{"title": "On Graphs", "journal_name": null, "publication_date": null, "cited_by_count": 3}]),
        );
        mock.respond(ApiRequest::ResearcherCoauthors { id: "r1".into() }, json!([]));
        mock.respond(
            ApiRequest::FieldDistribution {
                entity: EntityType::Researcher,
                id: "r1".into(),
            },
            json!([]),
        );

        let report = loader.load_detail("r1").await;

        assert!(report.all_applied());
        let profile = canvas.content(targets::PROFILE);
        assert!(profile.contains("<span>12</span>"));
        assert!(profile.contains("Publications<br><span>-</span>"));
        assert_eq!(
            canvas.content(targets::ARTICLES),
            "<tr><td>On Graphs</td><td>-</td><td>-</td><td>3</td></tr>"
        );
        // Empty distribution still draws a chart with zero segments.
        assert_eq!(canvas.chart(targets::FIELDS_CHART).unwrap().segment_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_part_notifies_and_stays_cleared() {
        let (mock, canvas, loader) = setup(EntityType::Institution);
        canvas.set_html(targets::STATS, "<div>previous</div>".into());
        mock.fail(
            ApiRequest::Overview {
                entity: EntityType::Institution,
                id: "i1".into(),
            },
            ExplorerError::Timeout { timeout_secs: 15 },
        );
        mock.respond(
            ApiRequest::FieldDistribution {
                entity: EntityType::Institution,
                id: "i1".into(),
            },
            json!([{"field": "AI", "percentage": 100}]),
        );

        let report = loader.load_detail("i1").await;

        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].0, DetailPart::Overview);
        assert_eq!(canvas.content(targets::STATS), "");
        assert_eq!(canvas.notifications(), vec!["Failed to fetch overview"]);
        assert_eq!(canvas.live_charts(targets::FIELDS_CHART), 1);
        assert_eq!(loader.phase(), LoadPhase::Settled);
    }

    #[tokio::test]
    async fn test_reload_replaces_chart() {
        let (mock, canvas, loader) = setup(EntityType::Country);
        script_country(&mock, "c1", 10.0, "Physics");
        script_country(&mock, "c2", 20.0, "Biology");

        loader.load_detail("c1").await;
        let first = loader.chart_handle().unwrap();
        loader.load_detail("c2").await;

        assert!(!canvas.is_chart_live(first.id));
        assert_eq!(canvas.live_charts(targets::FIELDS_CHART), 1);
        assert_eq!(canvas.chart(targets::FIELDS_CHART).unwrap().labels[0], "Biology");
    }

    #[tokio::test]
    async fn test_field_detail_records_country_rows() {
        let (mock, canvas, loader) = setup(EntityType::Field);
        mock.respond(
            ApiRequest::FieldOverview {
                field: "AI".into(),
            },
            json!([]),
        );
        mock.respond(
            ApiRequest::FieldCountries {
                field: "AI".into(),
            },
            json!([{"country": "France", "country_id": 9, "percentage": 12.5}]),
        );

        loader.load_detail("AI").await;

        assert!(canvas.content(targets::BY_H).contains("No data"));
        assert!(canvas.content(targets::COUNTRIES).contains("width:12.5%"));
        assert_eq!(
            loader.drilldown_context(0),
            Some(DrilldownContext {
                field: "AI".into(),
                country: "France".into(),
                country_id: "9".into(),
            })
        );
        assert_eq!(loader.drilldown_context(1), None);
    }

    #[tokio::test]
    async fn test_null_names_render_placeholder_without_failing_part() {
        let (mock, canvas, loader) = setup(EntityType::Field);
        mock.respond(
            ApiRequest::FieldOverview {
                field: "AI".into(),
            },
            json!({
                "by_h_index": [{"full_name": null, "h_index": 40}, {"full_name": "B", "h_index": 30}],
                "by_rii": []
            }),
        );
        mock.respond(
            ApiRequest::FieldCountries {
                field: "AI".into(),
            },
            json!([
                {"country": null, "country_id": 3, "percentage": 10},
                {"country": "Chile", "country_id": null, "percentage": 5}
            ]),
        );

        let report = loader.load_detail("AI").await;

        assert!(report.all_applied());
        assert!(canvas.notifications().is_empty());
        let by_h = canvas.content(targets::BY_H);
        assert!(by_h.contains("<strong>-</strong>"));
        assert!(by_h.contains("<strong>B</strong>"));
        let countries = canvas.content(targets::COUNTRIES);
        assert!(countries.contains("<span>-</span>"));
        assert!(countries.contains("Chile"));
        assert_eq!(loader.drilldown_context(0).map(|c| c.country), Some("-".to_string()));
        assert_eq!(loader.drilldown_context(1), None);
    }

    #[tokio::test]
    async fn test_null_field_label_charts_as_placeholder() {
        let (mock, canvas, loader) = setup(EntityType::Institution);
        mock.respond(
            ApiRequest::Overview {
                entity: EntityType::Institution,
                id: "i2".into(),
            },
            json!({"average_h_index": 5}),
        );
        mock.respond(
            ApiRequest::FieldDistribution {
                entity: EntityType::Institution,
                id: "i2".into(),
            },
            json!([{"field": null, "percentage": 70}, {"field": "AI", "percentage": 30}]),
        );

        let report = loader.load_detail("i2").await;

        assert!(report.all_applied());
        let chart = canvas.chart(targets::FIELDS_CHART).unwrap();
        assert_eq!(chart.labels, vec!["-".to_string(), "AI".to_string()]);
    }

    #[tokio::test]
    async fn test_clear_returns_to_idle() {
        let (mock, canvas, loader) = setup(EntityType::Institution);
        mock.respond(
            ApiRequest::Overview {
                entity: EntityType::Institution,
                id: "i1".into(),
            },
            json!({"average_h_index": 5}),
        );
        mock.respond(
            ApiRequest::FieldDistribution {
                entity: EntityType::Institution,
                id: "i1".into(),
            },
            json!([{"field": "AI", "percentage": 100}]),
        );
        loader.load_detail("i1").await;

        loader.clear();

        assert_eq!(loader.phase(), LoadPhase::Idle);
        assert_eq!(loader.current_id(), None);
        assert_eq!(canvas.content(targets::STATS), "");
        assert_eq!(canvas.total_live_charts(), 0);
    }
}
