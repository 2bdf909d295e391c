//! View models shared by the API client and the explorer views.
//!
//! Nothing here is owned or persisted: every value is rebuilt from a
//! response and dropped when the next selection replaces it. Numeric fields
//! stay `serde_json::Number` so they render exactly as the server sent them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// The four drill-down axes of the explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Country,
    Institution,
    Field,
    Researcher,
}

impl EntityType {
    /// Path segment for single-entity endpoints (`/country/{id}/...`).
    pub fn singular(&self) -> &'static str {
        match self {
            EntityType::Country => "country",
            EntityType::Institution => "institution",
            EntityType::Field => "field",
            EntityType::Researcher => "researcher",
        }
    }

    /// Path segment for collection endpoints (`/countries/search`).
    pub fn plural(&self) -> &'static str {
        match self {
            EntityType::Country => "countries",
            EntityType::Institution => "institutions",
            EntityType::Field => "fields",
            EntityType::Researcher => "researchers",
        }
    }

    /// Parse an entity type from user input.
    pub fn from_str_loose(s: &str) -> Option<EntityType> {
        match s.trim().to_lowercase().as_str() {
            "country" | "countries" => Some(EntityType::Country),
            "institution" | "institutions" | "inst" => Some(EntityType::Institution),
            "field" | "fields" => Some(EntityType::Field),
            "researcher" | "researchers" | "author" => Some(EntityType::Researcher),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

/// One row of a suggestion list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub id: String,
    pub display_name: String,
}

impl SearchCandidate {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// Fields have no surrogate id; the name doubles as the identifier.
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            display_name: name,
        }
    }
}

/// The committed choice of one search box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub entity_type: EntityType,
    pub id: Option<String>,
    pub display_name: String,
}

impl Selection {
    pub fn empty(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            id: None,
            display_name: String::new(),
        }
    }

    pub fn from_candidate(entity_type: EntityType, candidate: &SearchCandidate) -> Self {
        Self {
            entity_type,
            id: Some(candidate.id.clone()),
            display_name: candidate.display_name.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }
}

/// Summary metrics of a country, institution or researcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityOverview {
    #[serde(default, alias = "full_name")]
    pub name: Option<String>,
    #[serde(default, alias = "h_index", alias = "average_h_index")]
    pub primary_score: Option<Number>,
    #[serde(default, alias = "rii", alias = "average_rii")]
    pub secondary_score: Option<Number>,
    #[serde(default, alias = "ranking")]
    pub rank: Option<Number>,
    #[serde(default)]
    pub total_publications: Option<Number>,
    #[serde(default)]
    pub total_citations: Option<Number>,
}

/// One row of a ranked list (researcher, institution or country).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    #[serde(default, deserialize_with = "opaque_id_opt")]
    pub id: Option<String>,
    #[serde(default, alias = "full_name", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, alias = "h_index", alias = "average_h_index")]
    pub primary_score: Option<Number>,
    #[serde(default, alias = "rii", alias = "average_rii")]
    pub secondary_score: Option<Number>,
    #[serde(default)]
    pub total_publications: Option<Number>,
    #[serde(default)]
    pub total_citations: Option<Number>,
}

/// The pair of lists every ranking endpoint returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedLists {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub by_h_index: Vec<RankedEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub by_rii: Vec<RankedEntry>,
}

/// One slice of a field-distribution doughnut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldShare {
    #[serde(default, alias = "label", alias = "field_label", deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(default)]
    pub percentage: Option<Number>,
}

/// A researcher's publication row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub journal_name: Option<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub cited_by_count: Option<Number>,
}

impl Article {
    /// Publication year, taken from the leading digits of the date.
    pub fn year(&self) -> Option<&str> {
        self.publication_date
            .as_deref()
            .filter(|d| d.len() >= 4 && d.is_char_boundary(4))
            .map(|d| &d[..4])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coauthor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub shared_articles: Option<Number>,
}

/// A country's share of a field's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCountryShare {
    #[serde(default, alias = "country_name", deserialize_with = "null_as_default")]
    pub country: String,
    /// Empty when the server sent no usable id; such a row cannot drill down.
    #[serde(default, deserialize_with = "opaque_id_or_empty")]
    pub country_id: String,
    #[serde(default)]
    pub percentage: Option<Number>,
}

/// Any combination of the three aggregate filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalyticsFilter {
    pub country_id: Option<String>,
    pub institution_id: Option<String>,
    pub field: Option<String>,
}

impl AnalyticsFilter {
    /// Trim every value and drop the empty ones.
    pub fn normalized(&self) -> Self {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        Self {
            country_id: clean(&self.country_id),
            institution_id: clean(&self.institution_id),
            field: clean(&self.field),
        }
    }

    pub fn has_country(&self) -> bool {
        self.normalized().country_id.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsMetrics {
    #[serde(default)]
    pub average_h_index: Option<Number>,
    #[serde(default)]
    pub average_rii: Option<Number>,
}

/// Successful body of the combined analytics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: AnalyticsMetrics,
    #[serde(default, deserialize_with = "null_as_default")]
    pub top_researchers: RankedLists,
    #[serde(default)]
    pub top_institutions: Option<RankedLists>,
}

/// Landing-page ranking section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rankings {
    #[serde(default)]
    pub total: Option<Number>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub by_h_index: Vec<RankedEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub by_rii: Vec<RankedEntry>,
}

/// Dataset-wide counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    #[serde(default)]
    pub researchers: Option<Number>,
    #[serde(default)]
    pub countries: Option<Number>,
    #[serde(default)]
    pub institutions: Option<Number>,
    #[serde(default)]
    pub fields: Option<Number>,
}

/// Render a possibly-missing number exactly as received.
pub fn display_number(value: &Option<Number>, placeholder: &str) -> String {
    value
        .as_ref()
        .map(Number::to_string)
        .unwrap_or_else(|| placeholder.to_string())
}

/// Render possibly-missing text, treating blank strings as missing.
pub fn display_text<'a>(value: &'a Option<String>, placeholder: &'a str) -> &'a str {
    value
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(placeholder)
}

/// Render text that may have arrived blank or null.
pub fn display_str<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

/// Convert a JSON id (string or number) to its opaque string form.
pub(crate) fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn opaque_id_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(id_from_value(&value).unwrap_or_default())
}

fn opaque_id_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(id_from_value(&value))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_type_segments() {
        assert_eq!(EntityType::Country.singular(), "country");
        assert_eq!(EntityType::Country.plural(), "countries");
        assert_eq!(EntityType::Researcher.plural(), "researchers");
        assert_eq!(EntityType::Field.to_string(), "field");
    }

    #[test]
    fn test_entity_type_parsing() {
        assert_eq!(
            EntityType::from_str_loose("Countries"),
            Some(EntityType::Country)
        );
        assert_eq!(
            EntityType::from_str_loose("inst"),
            Some(EntityType::Institution)
        );
        assert_eq!(EntityType::from_str_loose("journal"), None);
    }

    #[test]
    fn test_selection_from_field_candidate_uses_name_as_id() {
        let sel = Selection::from_candidate(EntityType::Field, &SearchCandidate::field("Physics"));
        assert_eq!(sel.id.as_deref(), Some("Physics"));
        assert_eq!(sel.display_name, "Physics");
        assert!(!sel.is_empty());
        assert!(Selection::empty(EntityType::Field).is_empty());
    }

    #[test]
    fn test_overview_aliases() {
        let country: EntityOverview = serde_json::from_value(json!({
            "id": "c1", "name": "France", "average_h_index": 31, "average_rii": 1.07, "ranking": 4
        }))
        .unwrap();
        assert_eq!(display_number(&country.primary_score, "-"), "31");
        assert_eq!(display_number(&country.secondary_score, "-"), "1.07");
        assert_eq!(display_number(&country.rank, "-"), "4");
        assert_eq!(display_number(&country.total_citations, "-"), "-");

        let researcher: EntityOverview = serde_json::from_value(json!({
            "full_name": "Kenji Ito", "h_index": 40, "rii": null, "total_publications": 120
        }))
        .unwrap();
        assert_eq!(researcher.name.as_deref(), Some("Kenji Ito"));
        assert_eq!(researcher.secondary_score, None);
        assert_eq!(display_number(&researcher.total_publications, "-"), "120");
    }

    #[test]
    fn test_ranked_entry_accepts_numeric_id_and_full_name() {
        let entry: RankedEntry =
            serde_json::from_value(json!({"id": 17, "full_name": "A", "h_index": 40})).unwrap();
        assert_eq!(entry.id.as_deref(), Some("17"));
        assert_eq!(entry.name, "A");
        assert_eq!(display_number(&entry.primary_score, "-"), "40");
    }

    #[test]
    fn test_null_text_fields_decode_as_blank() {
        let entry: RankedEntry =
            serde_json::from_value(json!({"full_name": null, "h_index": 40})).unwrap();
        assert_eq!(display_str(&entry.name, "-"), "-");

        let share: FieldCountryShare =
            serde_json::from_value(json!({"country": null, "country_id": null, "percentage": 10}))
                .unwrap();
        assert_eq!(share.country, "");
        assert_eq!(share.country_id, "");

        let coauthor: Coauthor = serde_json::from_value(json!({"name": null})).unwrap();
        assert_eq!(display_str(&coauthor.name, "n/a"), "n/a");

        let slice: FieldShare = serde_json::from_value(json!({"field": null, "percentage": 5})).unwrap();
        assert_eq!(slice.field, "");
    }

    #[test]
    fn test_analytics_report_without_institutions() {
        let report: AnalyticsReport = serde_json::from_value(json!({
            "metrics": {"average_h_index": 12},
            "top_researchers": {"by_h_index": [], "by_rii": null},
            "top_institutions": null
        }))
        .unwrap();
        assert_eq!(display_number(&report.metrics.average_h_index, "-"), "12");
        assert_eq!(display_number(&report.metrics.average_rii, "-"), "-");
        assert!(report.top_researchers.by_rii.is_empty());
        assert!(report.top_institutions.is_none());
    }

    #[test]
    fn test_article_year() {
        let article = Article {
            publication_date: Some("2019-04-02".into()),
            ..Default::default()
        };
        assert_eq!(article.year(), Some("2019"));
        assert_eq!(Article::default().year(), None);
    }

    #[test]
    fn test_filter_normalized_drops_blanks() {
        let filter = AnalyticsFilter {
            country_id: Some("  ".into()),
            institution_id: None,
            field: Some(" Biology ".into()),
        };
        let normalized = filter.normalized();
        assert_eq!(normalized.country_id, None);
        assert_eq!(normalized.field.as_deref(), Some("Biology"));
        assert!(!filter.has_country());
    }

    #[test]
    fn test_display_text_placeholder() {
        assert_eq!(display_text(&None, "-"), "-");
        assert_eq!(display_text(&Some("  ".into()), "-"), "-");
        assert_eq!(display_text(&Some("Nature".into()), "-"), "Nature");
    }
}
