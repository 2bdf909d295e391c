//! Markup renderers.
//!
//! Converts view models into HTML fragments for named render targets. Every
//! piece of server-provided text passes through [`escape_html`].

use crate::types::{
    Article, Coauthor, FieldCountryShare, RankedEntry, SearchCandidate, display_number, display_str,
    display_text,
};

/// Suggestion list items. Click binding is done on the typed candidate
/// vector by position, never by parsing this markup.
pub fn render_suggestions_html(candidates: &[SearchCandidate]) -> String {
    candidates
        .iter()
        .map(|c| format!("<div class=\"suggestion\">{}</div>", escape_html(&c.display_name)))
        .collect()
}

/// Summary metric cards: `(label, value)` pairs.
pub fn render_stat_cards_html(cards: &[(&str, String)]) -> String {
    cards
        .iter()
        .map(|(label, value)| {
            format!(
                "<div class=\"stat\">{}<br><span>{}</span></div>",
                escape_html(label),
                escape_html(value)
            )
        })
        .collect()
}

/// A metric shown on a ranked-list row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankedColumn {
    PrimaryScore,
    SecondaryScore,
    Publications,
    Citations,
}

impl RankedColumn {
    pub fn label(&self) -> &'static str {
        match self {
            RankedColumn::PrimaryScore => "H-index",
            RankedColumn::SecondaryScore => "RII",
            RankedColumn::Publications => "Publications",
            RankedColumn::Citations => "Citations",
        }
    }

    fn value(&self, entry: &RankedEntry, placeholder: &str) -> String {
        let raw = match self {
            RankedColumn::PrimaryScore => &entry.primary_score,
            RankedColumn::SecondaryScore => &entry.secondary_score,
            RankedColumn::Publications => &entry.total_publications,
            RankedColumn::Citations => &entry.total_citations,
        };
        display_number(raw, placeholder)
    }
}

/// Ranked list rows. An empty list becomes a single placeholder row.
pub fn render_ranked_list_html(
    entries: &[RankedEntry],
    columns: &[RankedColumn],
    no_data: &str,
    placeholder: &str,
) -> String {
    if entries.is_empty() {
        return render_no_data_html(no_data);
    }
    entries
        .iter()
        .map(|entry| {
            let metrics: String = columns
                .iter()
                .map(|col| {
                    format!(
                        "<div class=\"metric\">{}: {}</div>",
                        col.label(),
                        escape_html(&col.value(entry, placeholder))
                    )
                })
                .collect();
            format!(
                "<div class=\"ranked-row\"><strong>{}</strong>{}</div>",
                escape_html(display_str(&entry.name, placeholder)),
                metrics
            )
        })
        .collect()
}

/// The single row shown in place of an empty list.
pub fn render_no_data_html(no_data: &str) -> String {
    format!("<div class=\"ranked-row empty\">{}</div>", escape_html(no_data))
}

/// Article table body rows. Missing journal or date render as the placeholder.
pub fn render_articles_html(articles: &[Article], placeholder: &str) -> String {
    articles
        .iter()
        .map(|a| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(display_text(&a.title, placeholder)),
                escape_html(display_text(&a.journal_name, placeholder)),
                escape_html(a.year().unwrap_or(placeholder)),
                escape_html(&display_number(&a.cited_by_count, placeholder)),
            )
        })
        .collect()
}

pub fn render_coauthors_html(coauthors: &[Coauthor], placeholder: &str) -> String {
    coauthors
        .iter()
        .map(|c| {
            format!(
                "<div class=\"coauthor\"><b>{}</b><br>Shared papers: {}</div>",
                escape_html(display_str(&c.name, placeholder)),
                escape_html(&display_number(&c.shared_articles, placeholder))
            )
        })
        .collect()
}

/// Country contribution rows with a proportional bar.
pub fn render_country_shares_html(shares: &[FieldCountryShare], placeholder: &str) -> String {
    shares
        .iter()
        .map(|s| {
            let pct = escape_html(&display_number(&s.percentage, placeholder));
            let width = s.percentage.as_ref().and_then(|n| n.as_f64()).unwrap_or(0.0);
            format!(
                "<div class=\"country clickable\"><div class=\"country-header\"><span>{}</span><span>{}%</span></div>\
                 <div class=\"bar\"><div class=\"fill\" style=\"width:{}%\"></div></div></div>",
                escape_html(display_str(&s.country, placeholder)),
                pct,
                width.clamp(0.0, 100.0)
            )
        })
        .collect()
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
