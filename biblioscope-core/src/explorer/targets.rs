//! Render-target names of the explorer pages.

use crate::types::EntityType;

/// Text input of an entity's search box.
pub fn search_input(entity: EntityType) -> String {
    format!("{}-input", entity.singular())
}

/// Suggestion list under an entity's search box.
pub fn suggestions(entity: EntityType) -> String {
    format!("{}-suggestions", entity.singular())
}

// Detail pages
pub const STATS: &str = "stats";
pub const PROFILE: &str = "profile";
pub const INSTITUTIONS_BY_H: &str = "institutions-by-h";
pub const INSTITUTIONS_BY_RII: &str = "institutions-by-rii";
pub const FIELDS_CHART: &str = "fields-chart";
pub const ARTICLES: &str = "articles";
pub const COAUTHORS: &str = "coauthors";
pub const BY_H: &str = "by-h";
pub const BY_RII: &str = "by-rii";
pub const COUNTRIES: &str = "countries";

// Drilldown modal
pub const MODAL: &str = "modal";
pub const MODAL_TITLE: &str = "modal-title";
pub const MODAL_BY_H: &str = "modal-by-h";
pub const MODAL_BY_RII: &str = "modal-by-rii";

// Analytics page
pub const AVG_H: &str = "avg-h";
pub const AVG_RII: &str = "avg-rii";
pub const TOP_H: &str = "top-h";
pub const TOP_RII: &str = "top-rii";
pub const INSTITUTIONS_BLOCK: &str = "institutions-block";
pub const INST_H: &str = "inst-h";
pub const INST_RII: &str = "inst-rii";

// Landing page
pub const OVERVIEW_STATS: &str = "overview-stats";

/// Landing-page section holding one entity type's two rankings.
pub fn overview_section(entity: EntityType) -> String {
    format!("overview-{}", entity.plural())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_targets_are_per_entity() {
        assert_eq!(search_input(EntityType::Researcher), "researcher-input");
        assert_eq!(suggestions(EntityType::Field), "field-suggestions");
        assert_ne!(
            search_input(EntityType::Country),
            search_input(EntityType::Institution)
        );
    }

    #[test]
    fn test_overview_section_names() {
        assert_eq!(overview_section(EntityType::Country), "overview-countries");
    }
}
