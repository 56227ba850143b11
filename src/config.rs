//! Configuration management for Thriftroute
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Provider availability is derived here: a provider is configured when its
//! section carries an `api_key` (hosted APIs) or a `base_url` (local and
//! self-hosted runtimes). Every section is optional, so an empty file is a
//! valid local-only configuration.

use crate::classifier::ClassifierSettings;
use crate::error::{AppError, AppResult};
use crate::registry::catalog::ProviderAvailability;
use crate::registry::{Mode, Provider};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    providers: BTreeMap<Provider, ProviderSettings>,
    #[serde(default)]
    routing: RoutingConfig,
    #[serde(default)]
    classifier: ClassifierSettings,
    #[serde(default)]
    ledger: LedgerConfig,
    #[serde(default)]
    observability: ObservabilityConfig,
}

/// Credentials and endpoint for one provider
///
/// Fields are private so a configured flag can only be derived from
/// validated data.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
}

impl ProviderSettings {
    /// Get the API key, if set
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Get the base URL, if set
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Check whether this section makes the provider routable
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() || self.base_url.is_some()
    }
}

/// Routing defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RoutingConfig {
    #[serde(default)]
    default_mode: Mode,
}

/// Decision ledger settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_path")]
    path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("thriftroute-decisions.jsonl")
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const KNOWN_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns a distinct error for each phase: file read, TOML parse, and
    /// semantic validation, each carrying the file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        // Phase 3: Validate parsed config (provides contextual reason)
        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called automatically by [`Config::from_file`], but can also be called
    /// explicitly when constructing a config by other means (e.g. in tests).
    ///
    /// # Errors
    /// Returns an error naming the offending field and value.
    pub fn validate(&self) -> AppResult<()> {
        for (provider, settings) in &self.providers {
            if let Some(key) = &settings.api_key {
                if key.trim().is_empty() {
                    return Err(AppError::Config(format!(
                        "providers.{}.api_key is empty. Omit the key to leave the provider \
                        unconfigured, or supply a credential.",
                        provider.as_str()
                    )));
                }
            }
            if let Some(url) = &settings.base_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(AppError::Config(format!(
                        "providers.{}.base_url must start with http:// or https://, got '{}'",
                        provider.as_str(),
                        url
                    )));
                }
            }
        }

        self.classifier.validate()?;

        if !KNOWN_LOG_LEVELS.contains(&self.observability.log_level.as_str()) {
            return Err(AppError::Config(format!(
                "observability.log_level '{}' is not recognized. Expected one of: {}",
                self.observability.log_level,
                KNOWN_LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Derive the provider availability set
    ///
    /// The local provider is always available whether or not it has a
    /// section; a `base_url` on its section selects the runtime endpoint
    /// without changing availability.
    pub fn provider_availability(&self) -> ProviderAvailability {
        ProviderAvailability::from_configured(
            self.providers
                .iter()
                .filter(|(_, settings)| settings.is_configured())
                .map(|(provider, _)| *provider),
        )
    }

    /// Get the settings section for a provider, if present
    pub fn provider(&self, provider: Provider) -> Option<&ProviderSettings> {
        self.providers.get(&provider)
    }

    /// Get the mode used when a request does not specify one
    pub fn default_mode(&self) -> Mode {
        self.routing.default_mode
    }

    /// Get the classifier settings
    pub fn classifier(&self) -> &ClassifierSettings {
        &self.classifier
    }

    /// Get the decision ledger path
    pub fn ledger_path(&self) -> &Path {
        &self.ledger.path
    }

    /// Get the configured log level
    pub fn log_level(&self) -> &str {
        &self.observability.log_level
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
