//! Model registry for Thriftroute
//!
//! Static catalog of models and providers plus the (mode, tier) routing
//! table. Both are immutable once built and injected explicitly wherever
//! they are consumed, so tests can swap fixtures deterministically.

pub mod catalog;
pub mod table;

pub use catalog::ModelCatalog;
pub use table::RoutingTable;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Model provider identity
///
/// `Local` designates the always-available offline runtime: it never needs
/// credentials, which is what makes fallback resolution total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAi,
    Google,
    DeepSeek,
    XAi,
    Moonshot,
    Mistral,
    Local,
}

impl Provider {
    /// Convert to string representation for logging and serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::DeepSeek => "deepseek",
            Self::XAi => "xai",
            Self::Moonshot => "moonshot",
            Self::Mistral => "mistral",
            Self::Local => "local",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-selected cost/quality posture
///
/// Selects which preference list applies for a classified tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Eco,
    #[default]
    Standard,
    Performance,
}

impl Mode {
    /// Convert to string representation for logging and serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eco => "eco",
            Self::Standard => "standard",
            Self::Performance => "performance",
        }
    }
}

impl FromStr for Mode {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eco" => Ok(Self::Eco),
            "standard" => Ok(Self::Standard),
            "performance" => Ok(Self::Performance),
            other => Err(crate::error::AppError::Validation(format!(
                "Unknown mode '{}'. Expected one of: eco, standard, performance",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model capability flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Chat,
    Code,
    Analysis,
    Vision,
    Reasoning,
}

impl FromStr for Capability {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Self::Chat),
            "code" => Ok(Self::Code),
            "analysis" => Ok(Self::Analysis),
            "vision" => Ok(Self::Vision),
            "reasoning" => Ok(Self::Reasoning),
            other => Err(crate::error::AppError::Validation(format!(
                "Unknown capability '{}'. Expected one of: chat, code, analysis, vision, reasoning",
                other
            ))),
        }
    }
}

/// Immutable catalog entry for one model
///
/// Fields are private to keep validated catalog data immutable after
/// construction. Unit costs are USD per million tokens.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelDescriptor {
    id: String,
    provider: Provider,
    input_cost_per_mtok: f64,
    output_cost_per_mtok: f64,
    context_window: u32,
    capabilities: Vec<Capability>,
}

impl ModelDescriptor {
    /// Create a new catalog entry
    pub fn new(
        id: impl Into<String>,
        provider: Provider,
        input_cost_per_mtok: f64,
        output_cost_per_mtok: f64,
        context_window: u32,
        capabilities: Vec<Capability>,
    ) -> Self {
        Self {
            id: id.into(),
            provider,
            input_cost_per_mtok,
            output_cost_per_mtok,
            context_window,
            capabilities,
        }
    }

    /// Get the model id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the provider serving this model
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Get the input unit cost (USD per million tokens)
    pub fn input_cost_per_mtok(&self) -> f64 {
        self.input_cost_per_mtok
    }

    /// Get the output unit cost (USD per million tokens)
    pub fn output_cost_per_mtok(&self) -> f64 {
        self.output_cost_per_mtok
    }

    /// Get the context window size in tokens
    pub fn context_window(&self) -> u32 {
        self.context_window
    }

    /// Get the capability flags
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Check whether this model carries a capability flag
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Estimate the cost in USD of a request with the given token counts
    pub fn estimate_cost_usd(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (f64::from(input_tokens) / 1_000_000.0) * self.input_cost_per_mtok
            + (f64::from(output_tokens) / 1_000_000.0) * self.output_cost_per_mtok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_as_str() {
        assert_eq!(Provider::Anthropic.as_str(), "anthropic");
        assert_eq!(Provider::OpenAi.as_str(), "openai");
        assert_eq!(Provider::XAi.as_str(), "xai");
        assert_eq!(Provider::Local.as_str(), "local");
    }

    #[test]
    fn test_provider_serde_round_trip() {
        assert_eq!(
            serde_json::from_str::<Provider>(r#""deepseek""#).unwrap(),
            Provider::DeepSeek
        );
        assert_eq!(
            serde_json::to_string(&Provider::Moonshot).unwrap(),
            r#""moonshot""#
        );
    }

    #[test]
    fn test_mode_default_is_standard() {
        assert_eq!(Mode::default(), Mode::Standard);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("eco".parse::<Mode>().unwrap(), Mode::Eco);
        assert_eq!("performance".parse::<Mode>().unwrap(), Mode::Performance);
        assert!("turbo".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_from_str_error_lists_valid_modes() {
        let err = "ECO".parse::<Mode>().unwrap_err().to_string();
        assert!(err.contains("eco, standard, performance"), "got: {}", err);
    }

    #[test]
    fn test_capability_from_str() {
        assert_eq!("code".parse::<Capability>().unwrap(), Capability::Code);
        assert_eq!(
            "reasoning".parse::<Capability>().unwrap(),
            Capability::Reasoning
        );
        assert!("juggling".parse::<Capability>().is_err());
    }

    #[test]
    fn test_capability_from_str_error_lists_valid_capabilities() {
        let err = "Code".parse::<Capability>().unwrap_err().to_string();
        assert!(
            err.contains("chat, code, analysis, vision, reasoning"),
            "got: {}",
            err
        );
    }

    #[test]
    fn test_descriptor_accessors() {
        let desc = ModelDescriptor::new(
            "test-model",
            Provider::Google,
            0.10,
            0.40,
            1_000_000,
            vec![Capability::Chat, Capability::Vision],
        );
        assert_eq!(desc.id(), "test-model");
        assert_eq!(desc.provider(), Provider::Google);
        assert!(desc.has_capability(Capability::Vision));
        assert!(!desc.has_capability(Capability::Reasoning));
    }

    #[test]
    fn test_estimate_cost_usd() {
        let desc = ModelDescriptor::new(
            "test-model",
            Provider::Anthropic,
            3.0,
            15.0,
            200_000,
            vec![Capability::Chat],
        );
        // 1M input tokens at $3/M plus 100k output tokens at $15/M
        let cost = desc.estimate_cost_usd(1_000_000, 100_000);
        assert!((cost - 4.5).abs() < 1e-9, "got: {}", cost);
    }

    #[test]
    fn test_estimate_cost_usd_zero_cost_model() {
        let desc = ModelDescriptor::new(
            "offline",
            Provider::Local,
            0.0,
            0.0,
            32_768,
            vec![Capability::Chat],
        );
        assert_eq!(desc.estimate_cost_usd(500_000, 500_000), 0.0);
    }
}
