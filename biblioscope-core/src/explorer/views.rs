//! Pages: search boxes wired to the components that consume their selections.

use std::sync::Arc;
use tracing::debug;

use super::detail::{EntityDetailLoader, LoadReport};
use super::drilldown::{DrilldownModal, ModalOutcome};
use super::filters::{ApplyOutcome, FilterComposer};
use super::suggest::{InputOutcome, SuggestionController};
use crate::api::AnalyticsClient;
use crate::canvas::RenderSink;
use crate::config::UiConfig;
use crate::error::Result;
use crate::types::{AnalyticsFilter, EntityType, SearchCandidate, Selection};

/// Search box plus detail view for one entity type. The field page also owns
/// the drilldown modal reached from its country rows.
pub struct EntityExplorer {
    search: SuggestionController,
    detail: EntityDetailLoader,
    modal: Option<DrilldownModal>,
}

impl EntityExplorer {
    pub fn new(
        entity: EntityType,
        client: AnalyticsClient,
        sink: Arc<dyn RenderSink>,
        ui: UiConfig,
    ) -> Self {
        let modal = (entity == EntityType::Field)
            .then(|| DrilldownModal::new(client.clone(), sink.clone(), ui.clone()));
        Self {
            search: SuggestionController::new(entity, client.clone(), sink.clone()),
            detail: EntityDetailLoader::new(entity, client, sink, ui),
            modal,
        }
    }

    pub async fn type_query(&self, text: &str) -> InputOutcome {
        self.search.on_input(text).await
    }

    /// Commit the suggestion at `index` and load its detail view.
    pub async fn select(&self, index: usize) -> Result<LoadReport> {
        let selection = self.search.commit(index)?;
        Ok(self.load(selection).await)
    }

    pub async fn select_candidate(&self, candidate: &SearchCandidate) -> LoadReport {
        let selection = self.search.commit_candidate(candidate);
        self.load(selection).await
    }

    async fn load(&self, selection: Selection) -> LoadReport {
        match selection.id.as_deref() {
            Some(id) => self.detail.load_detail(id).await,
            None => {
                self.detail.clear();
                LoadReport {
                    generation: self.detail.generation(),
                    outcomes: Vec::new(),
                }
            }
        }
    }

    /// Open the drilldown for the country row at `row`. `None` when the page
    /// has no modal or no such row.
    pub async fn open_drilldown(&self, row: usize) -> Option<ModalOutcome> {
        let modal = self.modal.as_ref()?;
        let Some(context) = self.detail.drilldown_context(row) else {
            debug!(row, "No country row to drill into");
            return None;
        };
        Some(modal.open(context).await)
    }

    pub fn close_drilldown(&self) {
        if let Some(modal) = &self.modal {
            modal.close();
        }
    }

    pub fn search(&self) -> &SuggestionController {
        &self.search
    }

    pub fn detail(&self) -> &EntityDetailLoader {
        &self.detail
    }

    pub fn modal(&self) -> Option<&DrilldownModal> {
        self.modal.as_ref()
    }
}

/// Country box gating a dependent institution box, plus institution detail.
pub struct InstitutionExplorer {
    country: SuggestionController,
    institution: SuggestionController,
    detail: EntityDetailLoader,
}

impl InstitutionExplorer {
    pub fn new(client: AnalyticsClient, sink: Arc<dyn RenderSink>, ui: UiConfig) -> Self {
        Self {
            country: SuggestionController::new(EntityType::Country, client.clone(), sink.clone()),
            institution: SuggestionController::dependent(
                EntityType::Institution,
                client.clone(),
                sink.clone(),
            ),
            detail: EntityDetailLoader::new(EntityType::Institution, client, sink, ui),
        }
    }

    pub async fn type_country(&self, text: &str) -> InputOutcome {
        self.country.on_input(text).await
    }

    /// Commit a country. The institution box is reset and enabled for it,
    /// and the institution detail is cleared.
    pub fn select_country(&self, index: usize) -> Result<Selection> {
        let selection = self.country.commit(index)?;
        self.institution.set_prerequisite(selection.id.as_deref());
        self.detail.clear();
        Ok(selection)
    }

    pub async fn type_institution(&self, text: &str) -> InputOutcome {
        self.institution.on_input(text).await
    }

    pub async fn select_institution(&self, index: usize) -> Result<LoadReport> {
        let selection = self.institution.commit(index)?;
        let id = selection.id.unwrap_or_default();
        Ok(self.detail.load_detail(&id).await)
    }

    pub fn country(&self) -> &SuggestionController {
        &self.country
    }

    pub fn institution(&self) -> &SuggestionController {
        &self.institution
    }

    pub fn detail(&self) -> &EntityDetailLoader {
        &self.detail
    }
}

/// Aggregate page: three search boxes feeding one [`FilterComposer`].
pub struct AnalyticsExplorer {
    country: SuggestionController,
    institution: SuggestionController,
    field: SuggestionController,
    composer: FilterComposer,
}

impl AnalyticsExplorer {
    pub fn new(client: AnalyticsClient, sink: Arc<dyn RenderSink>, ui: UiConfig) -> Self {
        Self {
            country: SuggestionController::new(EntityType::Country, client.clone(), sink.clone()),
            institution: SuggestionController::dependent(
                EntityType::Institution,
                client.clone(),
                sink.clone(),
            ),
            field: SuggestionController::new(EntityType::Field, client.clone(), sink.clone()),
            composer: FilterComposer::new(client, sink, ui),
        }
    }

    /// The search box for `entity`, if this page has one.
    pub fn search_box(&self, entity: EntityType) -> Option<&SuggestionController> {
        match entity {
            EntityType::Country => Some(&self.country),
            EntityType::Institution => Some(&self.institution),
            EntityType::Field => Some(&self.field),
            EntityType::Researcher => None,
        }
    }

    pub async fn type_query(&self, entity: EntityType, text: &str) -> Option<InputOutcome> {
        Some(self.search_box(entity)?.on_input(text).await)
    }

    /// Commit a suggestion. A country commit resets the institution box.
    pub fn select(&self, entity: EntityType, index: usize) -> Option<Result<Selection>> {
        let search = self.search_box(entity)?;
        let result = search.commit(index);
        if let (EntityType::Country, Ok(selection)) = (entity, &result) {
            self.institution.set_prerequisite(selection.id.as_deref());
        }
        Some(result)
    }

    /// Clear the country selection, disabling the institution box again.
    pub fn clear_country(&self) {
        self.country.reset();
        self.institution.set_prerequisite(None);
    }

    /// Current filter. A field typed but never committed still applies, since
    /// a field's name is its identifier.
    pub fn filter(&self) -> AnalyticsFilter {
        let field = self.field.selection().id.or_else(|| {
            let text = self.field.text();
            (!text.trim().is_empty()).then_some(text)
        });
        AnalyticsFilter {
            country_id: self.country.selection().id,
            institution_id: self.institution.selection().id,
            field,
        }
        .normalized()
    }

    pub async fn apply(&self) -> ApplyOutcome {
        self.composer.apply(&self.filter()).await
    }
}
