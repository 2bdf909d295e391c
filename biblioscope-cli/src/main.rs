//! Biblioscope CLI - Terminal driver for the Biblioscope explorer.
//!
//! Runs one explorer interaction against a live analytics API and prints
//! the resulting page state.

mod commands;

use biblioscope_core::{EntityType, ExplorerConfig};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Biblioscope: explore countries, institutions, fields and researchers
#[derive(Parser, Debug)]
#[command(name = "biblioscope", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (for `.biblioscope/config.toml`)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Analytics API base URL, overriding configuration
    #[arg(long)]
    base_url: Option<String>,

    /// Print the full page snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Show suggestions for a query
    Search {
        /// Entity type: country, institution, field, researcher
        #[arg(value_parser = parse_entity)]
        entity: EntityType,
        query: String,
        /// Country to search institutions within (first match is used)
        #[arg(long)]
        country: Option<String>,
    },
    /// Select a suggestion and render its detail view
    Show {
        #[arg(value_parser = parse_entity)]
        entity: EntityType,
        query: String,
        /// Suggestion to commit (0-based)
        #[arg(long, default_value_t = 0)]
        pick: usize,
        /// Country to search institutions within (first match is used)
        #[arg(long)]
        country: Option<String>,
    },
    /// Open the field x country researcher drilldown
    Drilldown {
        /// Field name
        field: String,
        /// Country row of the field's contribution list (0-based)
        #[arg(long, default_value_t = 0)]
        row: usize,
    },
    /// Aggregate metrics for any combination of filters
    Analytics {
        /// Country name (first match is used)
        #[arg(long)]
        country: Option<String>,
        /// Institution name within the country (first match is used)
        #[arg(long)]
        institution: Option<String>,
        /// Field name
        #[arg(long)]
        field: Option<String>,
    },
    /// Landing-page rankings and dataset counts
    Overview,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Write a default `.biblioscope/config.toml` into the workspace
    Init,
    /// Print the effective configuration
    Show,
}

fn parse_entity(s: &str) -> Result<EntityType, String> {
    EntityType::from_str_loose(s).ok_or_else(|| {
        format!(
            "unknown entity type '{}' (expected country, institution, field or researcher)",
            s
        )
    })
}

/// Layered config with `--config` above the workspace file and below the
/// environment; `--base-url` wins over everything.
fn resolve_config(cli: &Cli, workspace: &Path) -> anyhow::Result<ExplorerConfig> {
    let mut config = biblioscope_core::config::load_config_with_file(
        Some(workspace),
        cli.config.as_deref(),
        None,
    )
    .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter);
    tracing_subscriber::registry().with(stderr_layer).init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = resolve_config(&cli, &workspace)?;

    let output = if cli.json {
        commands::Output::Json
    } else {
        commands::Output::Text
    };
    commands::handle_command(cli.command, config, &workspace, output).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_flag_keeps_env_layer() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[api]\nbase_url = \"http://custom:9\"\ntimeout_secs = 4\n")?;
            jail.set_env("BIBLIOSCOPE_API__TIMEOUT_SECS", "30");
            let cli = Cli::try_parse_from(["biblioscope", "--config", "custom.toml", "overview"])
                .map_err(|e| e.to_string())?;

            let config = resolve_config(&cli, jail.directory()).map_err(|e| e.to_string())?;

            assert_eq!(config.api.base_url, "http://custom:9");
            assert_eq!(config.api.timeout_secs, 30);
            Ok(())
        });
    }

    #[test]
    fn test_base_url_flag_wins() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("BIBLIOSCOPE_API__BASE_URL", "http://from-env:1");
            let cli = Cli::try_parse_from(["biblioscope", "--base-url", "http://flag:2", "overview"])
                .map_err(|e| e.to_string())?;

            let config = resolve_config(&cli, jail.directory()).map_err(|e| e.to_string())?;

            assert_eq!(config.api.base_url, "http://flag:2");
            Ok(())
        });
    }

    #[test]
    fn test_parse_entity() {
        assert_eq!(parse_entity("Researchers"), Ok(EntityType::Researcher));
        assert!(parse_entity("planet").is_err());
    }

    #[test]
    fn test_cli_parses_show() {
        let cli = Cli::try_parse_from([
            "biblioscope",
            "-v",
            "show",
            "institution",
            "Sorb",
            "--country",
            "France",
            "--pick",
            "1",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Show {
                entity,
                pick,
                country,
                ..
            } => {
                assert_eq!(entity, EntityType::Institution);
                assert_eq!(pick, 1);
                assert_eq!(country.as_deref(), Some("France"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_analytics() {
        let cli = Cli::try_parse_from(["biblioscope", "--json", "analytics", "--field", "Biology"])
            .unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Analytics {
                field: Some(_),
                country: None,
                institution: None
            }
        ));
    }
}
