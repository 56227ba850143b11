//! Request routing
//!
//! Combines override detection, classification, and registry resolution
//! into one decision per request. The decision itself is computed by a pure
//! function so identical inputs always produce identical output; the
//! [`engine::Router`] orchestrator wraps it with ledger recording and
//! metrics.

pub mod engine;

pub use engine::{route_request, Router};

use crate::classifier::Tier;
use crate::overrides::OverrideKind;
use crate::registry::{Mode, ModelDescriptor};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of routing one request
///
/// Request-scoped. `reasoning` is a human-readable account of how the model
/// was chosen; when resolution fell through to the cheapest configured
/// model it contains the literal substring "Fallback", which callers may
/// rely on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    pub model: ModelDescriptor,
    #[serde(rename = "override")]
    pub override_kind: OverrideKind,
    pub tier: Tier,
    pub composite_score: f64,
    pub reasoning: String,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-request routing inputs beyond the message list
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Cost/quality mode the caller is operating in
    pub mode: Mode,
    /// Explicit force-model parameter, if the caller supplied one
    pub force_model: Option<String>,
    /// Request id of the spawning request, for sub-agent step-down
    pub parent_request_id: Option<String>,
}

impl RouteOptions {
    /// Options for a plain request in the given mode
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set the explicit force-model parameter
    pub fn with_force_model(mut self, model: impl Into<String>) -> Self {
        self.force_model = Some(model.into());
        self
    }

    /// Set the parent request id
    pub fn with_parent_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.parent_request_id = Some(request_id.into());
        self
    }
}
