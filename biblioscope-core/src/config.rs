//! Configuration system for Biblioscope.
//!
//! Uses `figment` for layered configuration: defaults -> config files -> environment -> overrides.
//! Configuration is loaded from `~/.config/biblioscope/config.toml` and/or
//! `.biblioscope/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Top-level configuration for the explorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    pub api: ApiConfig,
    pub ui: UiConfig,
}

/// Where the analytics API lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Scheme, host and port of the analytics service.
    pub base_url: String,
    /// Prefix for the entity endpoints (`/api/country/...`).
    pub api_prefix: String,
    /// Path of the combined analytics endpoint, served outside `api_prefix`.
    pub analytics_path: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            api_prefix: "/api".to_string(),
            analytics_path: "/analytics".to_string(),
            timeout_secs: 15,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "api.base_url must not be empty".into(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "api.timeout_secs must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Join the base URL with a relative request path.
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path_and_query)
    }
}

/// Presentation settings shared by every view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Text shown for a missing optional value.
    pub placeholder: String,
    /// Single row rendered in place of an empty list.
    pub no_data_label: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            placeholder: "-".to_string(),
            no_data_label: "No data".to_string(),
        }
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `BIBLIOSCOPE_`)
/// 3. Workspace-local config (`.biblioscope/config.toml`)
/// 4. User config (`~/.config/biblioscope/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&ExplorerConfig>,
) -> Result<ExplorerConfig, ConfigError> {
    load_config_with_file(workspace, None, overrides)
}

/// Like [`load_config`], with an explicit config file layered above the
/// workspace config and below the environment. A missing explicit file is an
/// error rather than a silently skipped layer.
pub fn load_config_with_file(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
    overrides: Option<&ExplorerConfig>,
) -> Result<ExplorerConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(ExplorerConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "biblioscope", "biblioscope") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".biblioscope").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    // BIBLIOSCOPE_API__BASE_URL, BIBLIOSCOPE_API__TIMEOUT_SECS, ...
    figment = figment.merge(Env::prefixed("BIBLIOSCOPE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: ExplorerConfig = figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;
    config.api.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExplorerConfig::default();
        assert_eq!(config.api.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.api.api_prefix, "/api");
        assert_eq!(config.api.analytics_path, "/analytics");
        assert_eq!(config.api.timeout(), Duration::from_secs(15));
        assert_eq!(config.ui.placeholder, "-");
        assert_eq!(config.ui.no_data_label, "No data");
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = ExplorerConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: ExplorerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_load_config_with_overrides() {
        let mut overrides = ExplorerConfig::default();
        overrides.api.base_url = "https://metrics.example.org".into();
        overrides.api.timeout_secs = 3;
        let config = load_config(None, Some(&overrides)).unwrap();
        assert_eq!(config.api.base_url, "https://metrics.example.org");
        assert_eq!(config.api.timeout_secs, 3);
    }

    #[test]
    fn test_load_config_from_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".biblioscope");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            "[api]\nbase_url = \"http://10.0.0.7:8080\"\n\n[ui]\nno_data_label = \"Nothing here\"\n",
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.7:8080");
        assert_eq!(config.api.api_prefix, "/api");
        assert_eq!(config.ui.no_data_label, "Nothing here");
    }

    #[test]
    fn test_explicit_config_file_missing() {
        let err = load_config_with_file(None, Some(Path::new("/definitely/not/here.toml")), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_explicit_file_sits_between_workspace_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_dir(".biblioscope")?;
            jail.create_file(
                ".biblioscope/config.toml",
                "[api]\nbase_url = \"http://workspace:1\"\n\n[ui]\nplaceholder = \"n/a\"\n",
            )?;
            jail.create_file(
                "explicit.toml",
                "[api]\nbase_url = \"http://explicit:2\"\ntimeout_secs = 7\n",
            )?;
            jail.set_env("BIBLIOSCOPE_API__TIMEOUT_SECS", "42");

            let config = load_config_with_file(
                Some(jail.directory()),
                Some(Path::new("explicit.toml")),
                None,
            )
            .map_err(|e| e.to_string())?;

            assert_eq!(config.api.base_url, "http://explicit:2");
            assert_eq!(config.api.timeout_secs, 42);
            assert_eq!(config.ui.placeholder, "n/a");
            Ok(())
        });
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let api = ApiConfig {
            timeout_secs: 0,
            ..ApiConfig::default()
        };
        assert!(api.validate().is_err());
        let api = ApiConfig {
            base_url: "  ".into(),
            ..ApiConfig::default()
        };
        assert!(api.validate().is_err());
    }

    #[test]
    fn test_url_for_trims_trailing_slash() {
        let api = ApiConfig {
            base_url: "http://localhost:5000/".into(),
            ..ApiConfig::default()
        };
        assert_eq!(
            api.url_for("/api/countries/search?q=fr"),
            "http://localhost:5000/api/countries/search?q=fr"
        );
    }
}
