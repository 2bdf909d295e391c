//! # Biblioscope Core
//!
//! Core library for the Biblioscope bibliometric explorer.
//! Provides the search-box suggestion controllers, entity detail fan-out,
//! drilldown modal, aggregate filter view, the analytics API client and the
//! render surface they draw on.

pub mod api;
pub mod canvas;
pub mod config;
pub mod error;
pub mod explorer;
pub mod types;

// Re-export commonly used types at the crate root.
pub use api::{AnalyticsBackend, AnalyticsClient, ApiRequest, HttpBackend, MockBackend};
pub use canvas::{Canvas, CanvasSnapshot, ChartHandle, ChartSpec, RenderSink, VisualizationSlot};
pub use config::{ApiConfig, ExplorerConfig, UiConfig, load_config, load_config_with_file};
pub use error::{ConfigError, ExplorerError, Result};
pub use explorer::{
    AnalyticsExplorer, ApplyOutcome, DetailPart, DrilldownContext, DrilldownModal,
    EntityDetailLoader, EntityExplorer, FilterComposer, Generation, InputOutcome,
    InstitutionExplorer, LoadPhase, LoadReport, ModalOutcome, ModalState, OverviewBoard,
    PartOutcome, SuggestionController,
};
pub use types::{
    AnalyticsFilter, AnalyticsReport, EntityOverview, EntityType, RankedEntry, RankedLists,
    SearchCandidate, Selection,
};
