//! Search-as-you-type suggestion lists bound to one [`Selection`].

use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::{Generation, lock, targets};
use crate::api::AnalyticsClient;
use crate::canvas::RenderSink;
use crate::canvas::renderer::render_suggestions_html;
use crate::error::{ExplorerError, Result};
use crate::types::{EntityType, SearchCandidate, Selection};

/// What happened to one keystroke.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Blank input; the list was cleared without a query.
    Cleared,
    /// The box is waiting on its prerequisite and ignored the input.
    Disabled,
    /// The list now shows this many candidates.
    Rendered(usize),
    /// A newer keystroke or commit superseded this query.
    Stale,
    /// The query failed; the list keeps its previous content.
    Failed(ExplorerError),
}

/// Gate of a dependent search box.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Prerequisite {
    Independent,
    Missing,
    Met(String),
}

#[derive(Debug)]
struct SuggestState {
    generation: Generation,
    text: String,
    candidates: Vec<SearchCandidate>,
    selection: Selection,
    prerequisite: Prerequisite,
}

/// Binds a search box to asynchronous suggestion results and owns the
/// box's committed [`Selection`].
///
/// Every keystroke and every commit advances the generation, so only the
/// latest query can ever write the suggestion list.
pub struct SuggestionController {
    entity: EntityType,
    input_target: String,
    suggestions_target: String,
    client: AnalyticsClient,
    sink: Arc<dyn RenderSink>,
    state: Mutex<SuggestState>,
}

impl SuggestionController {
    pub fn new(entity: EntityType, client: AnalyticsClient, sink: Arc<dyn RenderSink>) -> Self {
        Self::with_prerequisite(entity, client, sink, Prerequisite::Independent)
    }

    /// A box that stays disabled until [`SuggestionController::set_prerequisite`]
    /// supplies the id it depends on. Institution boxes search within that
    /// country.
    pub fn dependent(entity: EntityType, client: AnalyticsClient, sink: Arc<dyn RenderSink>) -> Self {
        let controller = Self::with_prerequisite(entity, client, sink, Prerequisite::Missing);
        controller.sink.set_enabled(&controller.input_target, false);
        controller
    }

    fn with_prerequisite(
        entity: EntityType,
        client: AnalyticsClient,
        sink: Arc<dyn RenderSink>,
        prerequisite: Prerequisite,
    ) -> Self {
        Self {
            entity,
            input_target: targets::search_input(entity),
            suggestions_target: targets::suggestions(entity),
            client,
            sink,
            state: Mutex::new(SuggestState {
                generation: Generation::default(),
                text: String::new(),
                candidates: Vec::new(),
                selection: Selection::empty(entity),
                prerequisite,
            }),
        }
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    /// Handle a change of the box's text.
    pub async fn on_input(&self, text: &str) -> InputOutcome {
        let (ticket, prerequisite) = {
            let mut state = lock(&self.state);
            if state.prerequisite == Prerequisite::Missing {
                return InputOutcome::Disabled;
            }
            state.text = text.to_string();
            self.sink.set_value(&self.input_target, text);
            let ticket = state.generation.advance();
            if text.trim().is_empty() {
                state.candidates.clear();
                self.sink.clear(&self.suggestions_target);
                return InputOutcome::Cleared;
            }
            (ticket, state.prerequisite.clone())
        };

        debug!(entity = %self.entity, query = text, generation = %ticket, "Querying suggestions");
        let result = match &prerequisite {
            Prerequisite::Met(country_id) if self.entity == EntityType::Institution => {
                self.client.search_institutions(country_id, text).await
            }
            _ => self.client.search(self.entity, text).await,
        };

        let mut state = lock(&self.state);
        if !state.generation.is_current(ticket) {
            debug!(
                entity = %self.entity,
                stale = %ticket,
                current = %state.generation,
                "Discarding superseded suggestions"
            );
            return InputOutcome::Stale;
        }
        match result {
            Ok(candidates) => {
                self.sink
                    .set_html(&self.suggestions_target, render_suggestions_html(&candidates));
                let count = candidates.len();
                state.candidates = candidates;
                InputOutcome::Rendered(count)
            }
            Err(e) => {
                warn!(entity = %self.entity, error = %e, "Suggestion query failed");
                self.sink.notify(&e.user_message("suggestions"));
                InputOutcome::Failed(e)
            }
        }
    }

    /// Commit the candidate at `index` of the rendered list.
    pub fn commit(&self, index: usize) -> Result<Selection> {
        let mut state = lock(&self.state);
        let candidate = state
            .candidates
            .get(index)
            .cloned()
            .ok_or(ExplorerError::NoSuchCandidate { index })?;
        Ok(self.commit_locked(&mut state, &candidate))
    }

    /// Commit a candidate directly, e.g. one resolved outside the list.
    pub fn commit_candidate(&self, candidate: &SearchCandidate) -> Selection {
        let mut state = lock(&self.state);
        self.commit_locked(&mut state, candidate)
    }

    fn commit_locked(&self, state: &mut SuggestState, candidate: &SearchCandidate) -> Selection {
        // An in-flight query must not repopulate the list after the commit.
        state.generation.advance();
        state.text = candidate.display_name.clone();
        state.candidates.clear();
        state.selection = Selection::from_candidate(self.entity, candidate);
        self.sink.set_value(&self.input_target, &candidate.display_name);
        self.sink.clear(&self.suggestions_target);
        info!(entity = %self.entity, id = %candidate.id, name = %candidate.display_name, "Selection committed");
        state.selection.clone()
    }

    /// Replace the prerequisite of a dependent box. The box is always reset;
    /// it is enabled only when `id` is present.
    pub fn set_prerequisite(&self, id: Option<&str>) {
        let mut state = lock(&self.state);
        self.reset_locked(&mut state);
        state.prerequisite = match id {
            Some(id) => Prerequisite::Met(id.to_string()),
            None => Prerequisite::Missing,
        };
        self.sink.set_enabled(&self.input_target, id.is_some());
        debug!(entity = %self.entity, prerequisite = ?id, "Dependent search box reset");
    }

    /// Empty the box and its selection, discarding any query in flight.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        self.reset_locked(&mut state);
    }

    fn reset_locked(&self, state: &mut SuggestState) {
        state.generation.advance();
        state.text.clear();
        state.candidates.clear();
        state.selection = Selection::empty(self.entity);
        self.sink.set_value(&self.input_target, "");
        self.sink.clear(&self.suggestions_target);
    }

    pub fn selection(&self) -> Selection {
        lock(&self.state).selection.clone()
    }

    pub fn candidates(&self) -> Vec<SearchCandidate> {
        lock(&self.state).candidates.clone()
    }

    pub fn text(&self) -> String {
        lock(&self.state).text.clone()
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.state).prerequisite != Prerequisite::Missing
    }
}
