//! # Analytics API
//!
//! The explorer consumes a remote JSON/HTTP analytics service. This module
//! names every logical operation as an [`ApiRequest`], hides the transport
//! behind the [`AnalyticsBackend`] trait, and decodes responses into the
//! view models of [`crate::types`] through [`AnalyticsClient`].

pub mod http;
pub mod mock;

pub use http::HttpBackend;
pub use mock::MockBackend;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{ExplorerError, Result};
use crate::types::{
    AnalyticsFilter, AnalyticsReport, Article, Coauthor, EntityOverview, EntityType, FieldCountryShare,
    FieldShare, GlobalStats, RankedLists, Rankings, SearchCandidate, id_from_value,
};

/// One logical query against the analytics service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ApiRequest {
    Search { entity: EntityType, query: String },
    SearchInstitutions { country_id: String, query: String },
    Overview { entity: EntityType, id: String },
    CountryInstitutions { country_id: String },
    FieldDistribution { entity: EntityType, id: String },
    ResearcherArticles { id: String },
    ResearcherCoauthors { id: String },
    FieldOverview { field: String },
    FieldCountries { field: String },
    FieldCountryResearchers { field: String, country_id: String },
    Analytics(AnalyticsFilter),
    Rankings { entity: EntityType },
    GlobalStats,
}

impl ApiRequest {
    /// Relative URL of this request, with every free-text value and path id
    /// percent-encoded.
    pub fn path_and_query(&self, api: &ApiConfig) -> String {
        let prefix = api.api_prefix.trim_end_matches('/');
        let enc = |s: &str| urlencoding::encode(s).into_owned();
        match self {
            ApiRequest::Search { entity, query } => {
                format!("{}/{}/search?q={}", prefix, entity.plural(), enc(query))
            }
            ApiRequest::SearchInstitutions { country_id, query } => format!(
                "{}/institutions/search?country_id={}&q={}",
                prefix,
                enc(country_id),
                enc(query)
            ),
            ApiRequest::Overview { entity, id } => {
                format!("{}/{}/{}/overview", prefix, entity.singular(), enc(id))
            }
            ApiRequest::CountryInstitutions { country_id } => {
                format!("{}/country/{}/institutions", prefix, enc(country_id))
            }
            ApiRequest::FieldDistribution { entity, id } => {
                format!("{}/{}/{}/fields", prefix, entity.singular(), enc(id))
            }
            ApiRequest::ResearcherArticles { id } => {
                format!("{}/researcher/{}/articles", prefix, enc(id))
            }
            ApiRequest::ResearcherCoauthors { id } => {
                format!("{}/researcher/{}/coauthors", prefix, enc(id))
            }
            ApiRequest::FieldOverview { field } => {
                format!("{}/field/overview?field={}", prefix, enc(field))
            }
            ApiRequest::FieldCountries { field } => {
                format!("{}/field/countries?field={}", prefix, enc(field))
            }
            ApiRequest::FieldCountryResearchers { field, country_id } => format!(
                "{}/field/country/researchers?field={}&country_id={}",
                prefix,
                enc(field),
                enc(country_id)
            ),
            ApiRequest::Analytics(filter) => {
                let filter = filter.normalized();
                let params: Vec<String> = [
                    ("country_id", &filter.country_id),
                    ("institution_id", &filter.institution_id),
                    ("field", &filter.field),
                ]
                .into_iter()
                .filter_map(|(key, value)| value.as_deref().map(|v| format!("{}={}", key, enc(v))))
                .collect();
                if params.is_empty() {
                    api.analytics_path.clone()
                } else {
                    format!("{}?{}", api.analytics_path, params.join("&"))
                }
            }
            ApiRequest::Rankings { entity } => format!("{}/overview/{}", prefix, entity.plural()),
            ApiRequest::GlobalStats => format!("{}/overview/stats", prefix),
        }
    }

    /// Short noun for notifications ("Failed to fetch ...").
    pub fn describe(&self) -> &'static str {
        match self {
            ApiRequest::Search { .. } | ApiRequest::SearchInstitutions { .. } => "suggestions",
            ApiRequest::Overview { .. } => "overview",
            ApiRequest::CountryInstitutions { .. } => "institutions",
            ApiRequest::FieldDistribution { .. } => "field statistics",
            ApiRequest::ResearcherArticles { .. } => "articles",
            ApiRequest::ResearcherCoauthors { .. } => "co-authors",
            ApiRequest::FieldOverview { .. } => "field overview",
            ApiRequest::FieldCountries { .. } => "country contribution",
            ApiRequest::FieldCountryResearchers { .. } => "researchers",
            ApiRequest::Analytics(_) => "analytics",
            ApiRequest::Rankings { .. } => "rankings",
            ApiRequest::GlobalStats => "statistics",
        }
    }
}

/// Transport seam to the analytics service.
///
/// Implementors include `HttpBackend` (reqwest) for production and
/// `MockBackend` for tests.
#[async_trait]
pub trait AnalyticsBackend: Send + Sync {
    /// Perform the request and return the raw JSON body.
    async fn get(&self, request: &ApiRequest) -> Result<Value>;
}

/// Extract the server's `{"error": "..."}` message, if present.
pub fn domain_error_message(body: &Value) -> Option<String> {
    body.as_object()?
        .get("error")?
        .as_str()
        .map(str::to_string)
}

/// Typed facade over an [`AnalyticsBackend`].
#[derive(Clone)]
pub struct AnalyticsClient {
    backend: Arc<dyn AnalyticsBackend>,
}

impl AnalyticsClient {
    pub fn new(backend: Arc<dyn AnalyticsBackend>) -> Self {
        Self { backend }
    }

    /// Fetch the raw body, turning an embedded `error` key into a domain error.
    pub async fn fetch_value(&self, request: &ApiRequest) -> Result<Value> {
        debug!(request = ?request, "Issuing analytics request");
        let body = self.backend.get(request).await?;
        if let Some(message) = domain_error_message(&body) {
            return Err(ExplorerError::Domain { message });
        }
        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let body = self.fetch_value(&request).await?;
        serde_json::from_value(body).map_err(|e| ExplorerError::Decode {
            message: format!("{}: {}", request.describe(), e),
        })
    }

    /// Entity-scoped text search. Institutions should go through
    /// [`AnalyticsClient::search_institutions`] once a country is known.
    pub async fn search(&self, entity: EntityType, query: &str) -> Result<Vec<SearchCandidate>> {
        let body = self
            .fetch_value(&ApiRequest::Search {
                entity,
                query: query.to_string(),
            })
            .await?;
        candidates_from_value(body)
    }

    pub async fn search_institutions(
        &self,
        country_id: &str,
        query: &str,
    ) -> Result<Vec<SearchCandidate>> {
        let body = self
            .fetch_value(&ApiRequest::SearchInstitutions {
                country_id: country_id.to_string(),
                query: query.to_string(),
            })
            .await?;
        candidates_from_value(body)
    }

    pub async fn overview(&self, entity: EntityType, id: &str) -> Result<EntityOverview> {
        self.fetch(ApiRequest::Overview {
            entity,
            id: id.to_string(),
        })
        .await
    }

    pub async fn country_institutions(&self, country_id: &str) -> Result<RankedLists> {
        self.fetch(ApiRequest::CountryInstitutions {
            country_id: country_id.to_string(),
        })
        .await
    }

    pub async fn field_distribution(&self, entity: EntityType, id: &str) -> Result<Vec<FieldShare>> {
        self.fetch(ApiRequest::FieldDistribution {
            entity,
            id: id.to_string(),
        })
        .await
    }

    pub async fn researcher_articles(&self, id: &str) -> Result<Vec<Article>> {
        self.fetch(ApiRequest::ResearcherArticles { id: id.to_string() })
            .await
    }

    pub async fn researcher_coauthors(&self, id: &str) -> Result<Vec<Coauthor>> {
        self.fetch(ApiRequest::ResearcherCoauthors { id: id.to_string() })
            .await
    }

    pub async fn field_overview(&self, field: &str) -> Result<RankedLists> {
        let body = self
            .fetch_value(&ApiRequest::FieldOverview {
                field: field.to_string(),
            })
            .await?;
        ranked_lists_from_value(body)
    }

    pub async fn field_countries(&self, field: &str) -> Result<Vec<FieldCountryShare>> {
        self.fetch(ApiRequest::FieldCountries {
            field: field.to_string(),
        })
        .await
    }

    /// Researchers of one field within one country.
    pub async fn field_country_researchers(
        &self,
        field: &str,
        country_id: &str,
    ) -> Result<RankedLists> {
        let body = self
            .fetch_value(&ApiRequest::FieldCountryResearchers {
                field: field.to_string(),
                country_id: country_id.to_string(),
            })
            .await?;
        ranked_lists_from_value(body)
    }

    pub async fn analytics(&self, filter: &AnalyticsFilter) -> Result<AnalyticsReport> {
        self.fetch(ApiRequest::Analytics(filter.normalized())).await
    }

    pub async fn rankings(&self, entity: EntityType) -> Result<Rankings> {
        self.fetch(ApiRequest::Rankings { entity }).await
    }

    pub async fn global_stats(&self) -> Result<GlobalStats> {
        self.fetch(ApiRequest::GlobalStats).await
    }
}

/// Decode a search response. Fields come back as bare strings; every other
/// entity as `{id, name}` or `{id, full_name}`.
fn candidates_from_value(body: Value) -> Result<Vec<SearchCandidate>> {
    let Value::Array(items) = body else {
        return Err(ExplorerError::Decode {
            message: "suggestions: expected a JSON array".into(),
        });
    };
    let candidates = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(SearchCandidate::field(name)),
            Value::Object(map) => {
                let name = ["name", "full_name", "display_name"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))?
                    .to_string();
                let id = map
                    .get("id")
                    .and_then(id_from_value)
                    .unwrap_or_else(|| name.clone());
                Some(SearchCandidate::new(id, name))
            }
            _ => None,
        })
        .collect();
    Ok(candidates)
}

/// The field endpoints answer `[]` instead of an object when nothing matches.
fn ranked_lists_from_value(body: Value) -> Result<RankedLists> {
    match body {
        Value::Array(items) if items.is_empty() => Ok(RankedLists::default()),
        other => Ok(serde_json::from_value(other)?),
    }
}
