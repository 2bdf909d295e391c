//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use biblioscope_core::canvas::{Canvas, CanvasSnapshot, TargetContent};
use biblioscope_core::explorer::{
    AnalyticsExplorer, EntityExplorer, InputOutcome, InstitutionExplorer, LoadReport,
    OverviewBoard,
};
use biblioscope_core::{
    AnalyticsClient, ApplyOutcome, EntityType, ExplorerConfig, HttpBackend, SearchCandidate,
};
use std::path::Path;
use std::sync::Arc;

/// How the final page state is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Output {
    Text,
    Json,
}

/// Handle a CLI subcommand.
pub(crate) async fn handle_command(
    command: Commands,
    config: ExplorerConfig,
    workspace: &Path,
    output: Output,
) -> anyhow::Result<()> {
    let command = match command {
        Commands::Config { action } => return handle_config(action, &config, workspace),
        other => other,
    };

    let backend = HttpBackend::new(config.api.clone())?;
    let client = AnalyticsClient::new(Arc::new(backend));
    let canvas = Arc::new(Canvas::new());
    let ui = config.ui.clone();

    match command {
        Commands::Search {
            entity,
            query,
            country,
        } => {
            let outcome = if entity == EntityType::Institution {
                let page = InstitutionExplorer::new(client, canvas.clone(), ui);
                select_country(&page, country.as_deref()).await?;
                page.type_institution(&query).await
            } else {
                let page = EntityExplorer::new(entity, client, canvas.clone(), ui);
                page.type_query(&query).await
            };
            if let InputOutcome::Rendered(n) = outcome {
                println!("{} suggestion(s) for '{}'", n, query);
            }
        }
        Commands::Show {
            entity,
            query,
            pick,
            country,
        } => {
            let report = if entity == EntityType::Institution {
                let page = InstitutionExplorer::new(client, canvas.clone(), ui);
                select_country(&page, country.as_deref()).await?;
                expect_matches(page.type_institution(&query).await, &query)?;
                page.select_institution(pick).await?
            } else {
                let page = EntityExplorer::new(entity, client, canvas.clone(), ui);
                expect_matches(page.type_query(&query).await, &query)?;
                page.select(pick).await?
            };
            print_report(&report);
        }
        Commands::Drilldown { field, row } => {
            let page = EntityExplorer::new(EntityType::Field, client, canvas.clone(), ui);
            page.select_candidate(&SearchCandidate::field(field.as_str()))
                .await;
            if page.open_drilldown(row).await.is_none() {
                anyhow::bail!("Field '{}' has no country row {}", field, row);
            }
        }
        Commands::Analytics {
            country,
            institution,
            field,
        } => {
            let page = AnalyticsExplorer::new(client, canvas.clone(), ui);
            if let Some(country) = &country {
                pick_first(&page, EntityType::Country, country).await?;
            }
            if let Some(institution) = &institution {
                if country.is_none() {
                    anyhow::bail!("--institution requires --country");
                }
                pick_first(&page, EntityType::Institution, institution).await?;
            }
            if let Some(field) = &field {
                page.type_query(EntityType::Field, field).await;
            }
            match page.apply().await {
                ApplyOutcome::Rendered {
                    institutions_visible,
                } => {
                    if !institutions_visible {
                        println!("(institution panel hidden: no country filter)");
                    }
                }
                ApplyOutcome::Rejected(message) => println!("Rejected: {}", message),
                ApplyOutcome::Failed(_) | ApplyOutcome::Stale => {}
            }
        }
        Commands::Overview => {
            let board = OverviewBoard::new(client, canvas.clone(), ui);
            board.load().await;
        }
        // Handled before the backend is built.
        Commands::Config { .. } => return Ok(()),
    }

    print_canvas(&canvas, output)
}

fn handle_config(action: ConfigAction, config: &ExplorerConfig, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".biblioscope");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&ExplorerConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            println!("{}", toml::to_string_pretty(config)?);
            Ok(())
        }
    }
}

/// Commit the first country matching `query` on the institution page.
async fn select_country(page: &InstitutionExplorer, query: Option<&str>) -> anyhow::Result<()> {
    let Some(query) = query else {
        anyhow::bail!("Institution search needs --country");
    };
    expect_matches(page.type_country(query).await, query)?;
    page.select_country(0)?;
    Ok(())
}

async fn pick_first(page: &AnalyticsExplorer, entity: EntityType, query: &str) -> anyhow::Result<()> {
    if let Some(outcome) = page.type_query(entity, query).await {
        expect_matches(outcome, query)?;
    }
    if let Some(result) = page.select(entity, 0) {
        result?;
    }
    Ok(())
}

fn expect_matches(outcome: InputOutcome, query: &str) -> anyhow::Result<()> {
    match outcome {
        InputOutcome::Rendered(0) => anyhow::bail!("No match for '{}'", query),
        InputOutcome::Rendered(_) => Ok(()),
        InputOutcome::Failed(e) => Err(e.into()),
        other => anyhow::bail!("Search for '{}' did not complete: {:?}", query, other),
    }
}

fn print_report(report: &LoadReport) {
    for (part, error) in report.failures() {
        eprintln!("  {:?} failed: {}", part, error);
    }
}

fn print_canvas(canvas: &Canvas, output: Output) -> anyhow::Result<()> {
    let snapshot = canvas.snapshot();
    if output == Output::Json {
        println!("{}", serde_json::to_string_pretty(&snapshot_json(&snapshot)?)?);
        return Ok(());
    }

    for (name, target) in &snapshot.targets {
        if target.content.is_empty() {
            continue;
        }
        let mut flags = Vec::new();
        if !target.visible {
            flags.push("hidden");
        }
        if !target.enabled {
            flags.push("disabled");
        }
        if flags.is_empty() {
            println!("[{}]", name);
        } else {
            println!("[{}] ({})", name, flags.join(", "));
        }
        let text = match &target.content {
            TargetContent::Markup(html) => markup_to_text(html),
            other => other.as_str().to_string(),
        };
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            println!("  {}", line.trim());
        }
    }
    for chart in &snapshot.charts {
        println!("[{}] chart", chart.target);
        let values = chart.spec.datasets.first().map(|d| d.data.as_slice()).unwrap_or(&[]);
        for (label, value) in chart.spec.labels.iter().zip(values) {
            println!("  {}: {}", label, value);
        }
    }
    for notification in &snapshot.notifications {
        eprintln!("! {}", notification.message);
    }
    Ok(())
}

/// The snapshot plus, per chart target, the Chart.js config a page would
/// hand to its widget library.
fn snapshot_json(snapshot: &CanvasSnapshot) -> serde_json::Result<serde_json::Value> {
    let mut value = serde_json::to_value(snapshot)?;
    let configs: serde_json::Map<String, serde_json::Value> = snapshot
        .charts
        .iter()
        .map(|chart| (chart.target.clone(), chart.spec.chartjs_config()))
        .collect();
    value["chart_configs"] = serde_json::Value::Object(configs);
    Ok(value)
}

/// Flatten rendered markup for the terminal: block ends become line breaks,
/// inline cells get a gap, other tags are dropped and entities decoded.
fn markup_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('>') else {
            rest = &rest[start..];
            break;
        };
        let tag = &rest[start + 1..start + len];
        match tag {
            "br" | "/div" | "/tr" | "/h3" => out.push('\n'),
            "/td" => out.push_str("  "),
            "/strong" | "/b" | "/span" => out.push_str("  "),
            _ => {}
        }
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
