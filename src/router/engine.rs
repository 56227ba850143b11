//! Routing engine
//!
//! [`route_request`] turns a classification, an override result, and the
//! registry structures into one [`RoutingDecision`]. It is free of I/O and
//! clock reads; request id and timestamp arrive as arguments, so identical
//! inputs always yield identical decisions. [`Router`] owns the immutable
//! structures for the process lifetime and adds the two impure edges:
//! override detection reads the ledger, recording writes it.

use crate::classifier::{classify, ClassificationResult, ClassifierSettings};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::ledger::{DecisionLedger, PromptHash, RoutingLogEntry};
use crate::message::{estimate_message_tokens, Message};
use crate::metrics::Metrics;
use crate::overrides::{detect_overrides, OverrideResult};
use crate::registry::catalog::ProviderAvailability;
use crate::registry::{Mode, ModelCatalog, RoutingTable};
use crate::router::{RouteOptions, RoutingDecision};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Compute a routing decision
///
/// An override is attempted first; if its model is unknown or its provider
/// is unconfigured, resolution degrades to the classified flow instead of
/// erroring. The classified flow walks the preference list for the mode and
/// tier, then falls back to the cheapest configured model, which always
/// exists. Fallback decisions carry the literal substring "Fallback" in
/// their reasoning.
#[allow(clippy::too_many_arguments)]
pub fn route_request(
    classification: &ClassificationResult,
    mode: Mode,
    overrides: &OverrideResult,
    catalog: &ModelCatalog,
    availability: &ProviderAvailability,
    table: &RoutingTable,
    request_id: &str,
    timestamp: DateTime<Utc>,
) -> RoutingDecision {
    let decision = |model: &crate::registry::ModelDescriptor, reasoning: String| RoutingDecision {
        model: model.clone(),
        override_kind: overrides.kind(),
        tier: classification.tier,
        composite_score: classification.composite,
        reasoning,
        request_id: request_id.to_string(),
        timestamp,
    };

    let mut degrade_note = String::new();
    if let Some(forced_id) = overrides.forced_model() {
        match catalog.get(forced_id) {
            Some(model) if availability.is_configured(model.provider()) => {
                return decision(
                    model,
                    format!(
                        "Override {}: routed to '{}'",
                        overrides.kind().as_str(),
                        model.id()
                    ),
                );
            }
            _ => {
                tracing::debug!(
                    forced_model = forced_id,
                    kind = overrides.kind().as_str(),
                    "Forced model unavailable, degrading to classified routing"
                );
                degrade_note = format!("Forced model '{forced_id}' is unavailable; ");
            }
        }
    }

    let preference = table.preference(mode, classification.tier);
    match catalog.resolve_preference(preference, availability) {
        Some(model) => decision(
            model,
            format!(
                "{}Classified {} (composite {:.3}); '{}' is the first configured preference for {} mode",
                degrade_note,
                classification.tier.as_str(),
                classification.composite,
                model.id(),
                mode.as_str()
            ),
        ),
        None => {
            let model = catalog.resolve_fallback(availability);
            decision(
                model,
                format!(
                    "{}Classified {} (composite {:.3}); Fallback to cheapest configured model '{}'",
                    degrade_note,
                    classification.tier.as_str(),
                    classification.composite,
                    model.id()
                ),
            )
        }
    }
}

/// Process-lifetime routing state
///
/// Owns the catalog, routing table, availability set, classifier settings,
/// ledger, and metrics. The structures are immutable once built; a config
/// reload builds a fresh `Router` and swaps it wholesale.
pub struct Router {
    catalog: Arc<ModelCatalog>,
    table: Arc<RoutingTable>,
    availability: ProviderAvailability,
    classifier: ClassifierSettings,
    ledger: Arc<DecisionLedger>,
    metrics: Arc<Metrics>,
}

impl Router {
    /// Build a router from explicit structures
    ///
    /// # Errors
    /// Returns an error if the classifier settings are invalid, the routing
    /// table references unknown models or has an empty preference list, or
    /// metric registration fails.
    pub fn new(
        catalog: ModelCatalog,
        table: RoutingTable,
        availability: ProviderAvailability,
        classifier: ClassifierSettings,
        ledger: DecisionLedger,
    ) -> AppResult<Self> {
        classifier.validate()?;
        table.validate(&catalog)?;
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("Failed to register metrics: {e}")))?;

        Ok(Self {
            catalog: Arc::new(catalog),
            table: Arc::new(table),
            availability,
            classifier,
            ledger: Arc::new(ledger),
            metrics: Arc::new(metrics),
        })
    }

    /// Build a router from runtime configuration and the builtin catalog
    ///
    /// # Errors
    /// Returns an error under the same conditions as [`Router::new`].
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            ModelCatalog::builtin(),
            RoutingTable::builtin(),
            config.provider_availability(),
            config.classifier().clone(),
            DecisionLedger::new(config.ledger_path()),
        )
    }

    /// Get the model catalog
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Get the provider availability set
    pub fn availability(&self) -> &ProviderAvailability {
        &self.availability
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Route a request, minting a fresh request id and timestamp
    pub fn route(&self, messages: &[Message], options: &RouteOptions) -> RoutingDecision {
        let request_id = Uuid::new_v4().to_string();
        self.route_with_identity(messages, options, &request_id, Utc::now())
    }

    /// Route a request under a caller-supplied identity
    ///
    /// Runs override detection, classification, and resolution, records the
    /// decision, and returns it. Recording failures degrade to a warning;
    /// the decision is always returned.
    pub fn route_with_identity(
        &self,
        messages: &[Message],
        options: &RouteOptions,
        request_id: &str,
        timestamp: DateTime<Utc>,
    ) -> RoutingDecision {
        let (decision, classification) = self.decide(messages, options, request_id, timestamp);

        tracing::info!(
            request_id,
            model = decision.model.id(),
            tier = decision.tier.as_str(),
            override_kind = decision.override_kind.as_str(),
            composite = decision.composite_score,
            "Routing decision made"
        );

        self.observe(&decision, &classification, options.mode);
        self.record(messages, &classification, &decision, options.mode);
        decision
    }

    /// Compute a decision without recording it
    ///
    /// Same flow as [`Router::route`] but skips the ledger and metrics, for
    /// dry runs.
    pub fn preview(&self, messages: &[Message], options: &RouteOptions) -> RoutingDecision {
        let request_id = Uuid::new_v4().to_string();
        let (decision, _) = self.decide(messages, options, &request_id, Utc::now());
        decision
    }

    fn decide(
        &self,
        messages: &[Message],
        options: &RouteOptions,
        request_id: &str,
        timestamp: DateTime<Utc>,
    ) -> (RoutingDecision, ClassificationResult) {
        let overrides = detect_overrides(
            messages,
            options.force_model.as_deref(),
            options.parent_request_id.as_deref(),
            self.ledger.as_ref(),
        );
        let classification = classify(messages, &self.classifier);
        let decision = route_request(
            &classification,
            options.mode,
            &overrides,
            &self.catalog,
            &self.availability,
            &self.table,
            request_id,
            timestamp,
        );
        (decision, classification)
    }

    fn observe(
        &self,
        decision: &RoutingDecision,
        classification: &ClassificationResult,
        mode: Mode,
    ) {
        if let Err(e) = self.metrics.record_decision(decision, mode) {
            tracing::warn!(error = %e, "Failed to record decision metrics");
        }
        let latency_ms = classification.latency.as_secs_f64() * 1000.0;
        if let Err(e) = self.metrics.record_classification_duration(latency_ms) {
            tracing::warn!(error = %e, "Failed to record classification latency");
        }
    }

    fn record(
        &self,
        messages: &[Message],
        classification: &ClassificationResult,
        decision: &RoutingDecision,
        mode: Mode,
    ) {
        let input_tokens = estimate_message_tokens(messages);
        // Output tokens are unknown at decision time; the host appends a
        // completed entry once the provider call finishes
        let entry = RoutingLogEntry {
            request_id: decision.request_id.clone(),
            timestamp: decision.timestamp,
            prompt_hash: PromptHash::of_messages(messages),
            composite_score: decision.composite_score,
            tier: decision.tier,
            selected_model: decision.model.id().to_string(),
            provider: decision.model.provider(),
            mode,
            override_kind: decision.override_kind,
            input_tokens,
            output_tokens: 0,
            estimated_cost_usd: decision.model.estimate_cost_usd(input_tokens, 0),
            classification_latency_us: u64::try_from(classification.latency.as_micros())
                .unwrap_or(u64::MAX),
        };

        if let Err(e) = self.ledger.append(&entry) {
            self.metrics.record_ledger_append_failure();
            tracing::warn!(
                error = %e,
                request_id = %decision.request_id,
                "Routing decision made but not recorded"
            );
        }
    }
}
