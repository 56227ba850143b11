//! Command-line interface for Thriftroute
//!
//! Provides argument parsing, subcommand handling, and decision rendering
//! for the Thriftroute binary.

use crate::router::RoutingDecision;
use clap::{Parser, Subcommand};

/// Cost-optimizing routing core for multi-provider LLM proxies
#[derive(Parser)]
#[command(name = "thriftroute")]
#[command(version)]
#[command(about = "Cost-optimizing routing core for multi-provider LLM proxies")]
#[command(
    long_about = "Thriftroute decides which backend model should serve each request, \
    balancing cost against capability with heuristic classification, explicit force \
    overrides, heartbeat pinning, and sub-agent cost step-down."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Route a prompt and print the decision
    Route {
        /// Prompt text (reads stdin when omitted)
        prompt: Vec<String>,

        /// Cost/quality mode: eco, standard, or performance
        #[arg(short, long)]
        mode: Option<String>,

        /// Force a model by alias (opus, sonnet, flash, ...) or full id
        #[arg(short, long)]
        force: Option<String>,

        /// Parent request id, for sub-agent cost step-down
        #[arg(long)]
        parent: Option<String>,

        /// System prompt to include in classification
        #[arg(long)]
        system: Option<String>,

        /// Decide without recording to the decision ledger
        #[arg(long)]
        dry: bool,
    },

    /// List catalog models with pricing and availability
    Models {
        /// Only list models advertising this capability
        #[arg(long)]
        capability: Option<String>,
    },

    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Render a routing decision for the `route` subcommand
///
/// The output is the chosen model's JSON descriptor, a `---` separator
/// line, and a final `Reason:` line. Dry runs print this same shape; they
/// only skip recording.
///
/// # Errors
/// Returns an error if the descriptor fails to serialize.
pub fn render_decision(decision: &RoutingDecision) -> Result<String, serde_json::Error> {
    let model = serde_json::to_string_pretty(&decision.model)?;
    Ok(format!("{model}\n---\nReason: {}", decision.reasoning))
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Thriftroute Configuration
# =========================
#
# Every section is optional. An empty file is a valid local-only
# configuration: requests route to the bundled offline model.

# ─────────────────────────────────────────────────────────────────────────────
# PROVIDERS
# ─────────────────────────────────────────────────────────────────────────────
#
# A provider becomes routable when its section carries an api_key (hosted
# APIs) or a base_url (local and self-hosted runtimes). The local provider
# is always available; its base_url only selects the runtime endpoint.
#
# Recognized providers: anthropic, openai, google, deepseek, xai, moonshot,
# mistral, local.

# [providers.anthropic]
# api_key = "sk-ant-..."

# [providers.openai]
# api_key = "sk-..."

# [providers.google]
# api_key = "AIza..."

[providers.local]
base_url = "http://127.0.0.1:8080/v1"

# ─────────────────────────────────────────────────────────────────────────────
# ROUTING
# ─────────────────────────────────────────────────────────────────────────────

[routing]
# Mode used when a request does not specify one:
#   - "eco": cheapest capable model per tier
#   - "standard": balanced cost and quality
#   - "performance": strongest model per tier
default_mode = "standard"

# ─────────────────────────────────────────────────────────────────────────────
# CLASSIFIER
# ─────────────────────────────────────────────────────────────────────────────

[classifier]
# Composite-score boundaries between tiers. Both inclusive:
# composite <= simple_max routes simple, composite >= complex_min routes
# complex, anything between routes standard. simple_max must stay strictly
# below complex_min.
simple_max = 0.15
complex_min = 0.55

# Per-dimension weights for the composite score. Uncomment to tune.
# [classifier.weights]
# token_count = 0.15
# code_presence = 0.20
# reasoning_markers = 0.25
# simple_indicators = -0.15
# multi_step = 0.15
# question_count = 0.05
# system_signal = 0.05
# conversation_depth = 0.15

# ─────────────────────────────────────────────────────────────────────────────
# DECISION LEDGER
# ─────────────────────────────────────────────────────────────────────────────

[ledger]
# Append-only JSONL file of routing decisions. Prompt content is never
# written, only a one-way hash.
path = "thriftroute-decisions.jsonl"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Tier;
    use crate::overrides::OverrideKind;
    use crate::registry::{Capability, ModelDescriptor, Provider};
    use clap::CommandFactory;
    use std::str::FromStr;

    #[test]
    fn verify_cli() {
        // Clap's built-in verification for the CLI structure
        Cli::command().debug_assert();
    }

    #[test]
    fn route_subcommand_collects_prompt_words() {
        let cli = Cli::parse_from(["thriftroute", "route", "explain", "this", "trace"]);
        match cli.command {
            Command::Route { prompt, dry, .. } => {
                assert_eq!(prompt, vec!["explain", "this", "trace"]);
                assert!(!dry);
            }
            _ => panic!("expected route subcommand"),
        }
    }

    #[test]
    fn route_subcommand_flags() {
        let cli = Cli::parse_from([
            "thriftroute",
            "route",
            "--mode",
            "eco",
            "--force",
            "opus",
            "--parent",
            "req-42",
            "--dry",
            "hello",
        ]);
        match cli.command {
            Command::Route {
                mode,
                force,
                parent,
                dry,
                ..
            } => {
                assert_eq!(mode.as_deref(), Some("eco"));
                assert_eq!(force.as_deref(), Some("opus"));
                assert_eq!(parent.as_deref(), Some("req-42"));
                assert!(dry);
            }
            _ => panic!("expected route subcommand"),
        }
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["thriftroute", "--config", "custom.toml", "models"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Command::Models { capability: None }));
    }

    #[test]
    fn models_subcommand_capability_filter() {
        let cli = Cli::parse_from(["thriftroute", "models", "--capability", "code"]);
        match cli.command {
            Command::Models { capability } => assert_eq!(capability.as_deref(), Some("code")),
            _ => panic!("expected models subcommand"),
        }
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["thriftroute", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config { output: Some(ref path) } if path == "my-config.toml"
        ));
    }

    #[test]
    fn template_is_valid_toml() {
        let template = generate_config_template();
        let result: Result<toml::Value, _> = toml::from_str(template);
        assert!(
            result.is_ok(),
            "Template should be valid TOML: {:?}",
            result.err()
        );
    }

    #[test]
    fn template_parses_as_config() {
        let config = crate::config::Config::from_str(generate_config_template())
            .expect("template should satisfy config validation");
        assert_eq!(config.classifier().simple_max(), 0.15);
        assert_eq!(config.classifier().complex_min(), 0.55);
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        assert!(template.contains("[providers.local]"));
        assert!(template.contains("[routing]"));
        assert!(template.contains("[classifier]"));
        assert!(template.contains("[ledger]"));
        assert!(template.contains("[observability]"));
    }

    fn sample_decision(reasoning: &str) -> RoutingDecision {
        RoutingDecision {
            model: ModelDescriptor::new(
                "gemini-2.5-flash",
                Provider::Google,
                0.30,
                2.50,
                1_048_576,
                vec![Capability::Chat],
            ),
            override_kind: OverrideKind::None,
            tier: Tier::Standard,
            composite_score: 0.42,
            reasoning: reasoning.to_string(),
            request_id: "req-1".to_string(),
            timestamp: "2026-01-15T10:30:00Z".parse().expect("valid timestamp"),
        }
    }

    #[test]
    fn render_decision_prints_model_json_separator_and_reason() {
        let rendered = render_decision(&sample_decision("Classified standard (composite 0.420)"))
            .expect("descriptor serializes");

        let (model_part, reason_part) = rendered
            .split_once("\n---\n")
            .expect("separator line between model and reason");
        let model: serde_json::Value =
            serde_json::from_str(model_part).expect("first section is the model descriptor");
        assert_eq!(model["id"], "gemini-2.5-flash");
        assert_eq!(model["provider"], "google");
        assert_eq!(reason_part, "Reason: Classified standard (composite 0.420)");
    }

    #[test]
    fn render_decision_reason_is_the_final_line() {
        let rendered = render_decision(&sample_decision("Override heartbeat"))
            .expect("descriptor serializes");

        let last = rendered.lines().last().expect("rendered output is non-empty");
        assert_eq!(last, "Reason: Override heartbeat");
        assert!(!rendered.ends_with('\n'));
    }
}
