//! Override detection
//!
//! Some requests should not go through normal classification: heartbeat
//! housekeeping must stay on a cheap model no matter what, a user can force
//! a specific model, and a spawned sub-agent steps one rung down the cost
//! ladder from its parent. Detection runs as an ordered chain of detectors,
//! first match wins, so adding a kind is a pure append with no reordering
//! risk. Precedence is fixed: heartbeat, then explicit force, then sub-agent
//! step-down. Heartbeat outranks an explicit force parameter by hard policy;
//! housekeeping traffic must never escalate cost.

use crate::ledger::DecisionLog;
use crate::message::{Message, Role};
use serde::{Deserialize, Serialize};

/// How a request bypassed (or did not bypass) normal classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    #[default]
    None,
    Heartbeat,
    ForceModel,
    ForceOpus,
    ForceSonnet,
    ForceFlash,
    SubAgentStepdown,
    SubAgentInherit,
}

impl OverrideKind {
    /// Get the snake_case name used in logs and reasoning strings
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideKind::None => "none",
            OverrideKind::Heartbeat => "heartbeat",
            OverrideKind::ForceModel => "force_model",
            OverrideKind::ForceOpus => "force_opus",
            OverrideKind::ForceSonnet => "force_sonnet",
            OverrideKind::ForceFlash => "force_flash",
            OverrideKind::SubAgentStepdown => "sub_agent_stepdown",
            OverrideKind::SubAgentInherit => "sub_agent_inherit",
        }
    }
}

impl std::fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of override detection
///
/// A non-`none` kind always carries the model id it wants; the routing
/// engine still degrades gracefully if that model's provider turns out to
/// be unconfigured.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideResult {
    kind: OverrideKind,
    forced_model: Option<String>,
}

impl OverrideResult {
    /// No override; proceed to normal classification
    pub fn none() -> Self {
        Self {
            kind: OverrideKind::None,
            forced_model: None,
        }
    }

    fn forced(kind: OverrideKind, model: impl Into<String>) -> Self {
        Self {
            kind,
            forced_model: Some(model.into()),
        }
    }

    /// Get the detected kind
    pub fn kind(&self) -> OverrideKind {
        self.kind
    }

    /// Get the model id the override wants, if any
    pub fn forced_model(&self) -> Option<&str> {
        self.forced_model.as_deref()
    }

    /// Check whether any override was detected
    pub fn is_override(&self) -> bool {
        self.kind != OverrideKind::None
    }
}

/// Phrases treated as heartbeat housekeeping
///
/// Matched against the last user message after trimming and lowercasing.
const HEARTBEAT_PHRASES: &[&str] = &[
    "ping",
    "pong",
    "heartbeat",
    "healthcheck",
    "health check",
    "are you there?",
    "still there?",
    "ok?",
    "summarize this",
    "test",
];

/// Model every heartbeat is pinned to
const HEARTBEAT_MODEL_ID: &str = "gemini-2.5-flash-lite";

/// Alias table for explicit force tokens
///
/// Keys are matched without the leading slash. The same table serves both
/// the `/alias` message prefix and the explicit force parameter.
const FORCE_ALIASES: &[(&str, OverrideKind, &str)] = &[
    ("opus", OverrideKind::ForceOpus, "claude-opus-4"),
    ("sonnet", OverrideKind::ForceSonnet, "claude-sonnet-4"),
    ("flash", OverrideKind::ForceFlash, "gemini-2.5-flash"),
    ("deepseek", OverrideKind::ForceModel, "deepseek-chat"),
    ("grok", OverrideKind::ForceModel, "grok-3-mini"),
    ("kimi", OverrideKind::ForceModel, "kimi-k2"),
    ("mistral", OverrideKind::ForceModel, "mistral-large"),
    ("local", OverrideKind::ForceModel, "llama-3.1-8b-local"),
    ("gpt-5", OverrideKind::ForceModel, "gpt-5"),
    ("o3", OverrideKind::ForceModel, "o3"),
];

/// Cost ladder for sub-agent step-down, most expensive first
///
/// A child lands one rung below its parent. Parents at the bottom, or on a
/// model outside the ladder, pass their own model through unchanged.
const STEP_DOWN_LADDER: &[&str] = &[
    "claude-opus-4",
    "claude-sonnet-4",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "llama-3.1-8b-local",
];

/// Inputs shared by every detector in the chain
struct DetectionContext<'a> {
    messages: &'a [Message],
    force_param: Option<&'a str>,
    parent_request_id: Option<&'a str>,
    log: &'a dyn DecisionLog,
}

impl DetectionContext<'_> {
    fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role() == Role::User)
            .map(Message::content)
    }
}

type Detector = fn(&DetectionContext<'_>) -> Option<OverrideResult>;

/// The precedence chain, evaluated in order, short-circuited on first match
const DETECTORS: &[Detector] = &[detect_heartbeat, detect_explicit_force, detect_sub_agent];

/// Detect whether a request bypasses normal classification
///
/// Runs the detector chain in precedence order and returns the first match,
/// or a `none` result when nothing fires. Unrecognized slash tokens and
/// missing parent records are not errors; they fall through to the next
/// detector.
pub fn detect_overrides(
    messages: &[Message],
    force_param: Option<&str>,
    parent_request_id: Option<&str>,
    log: &dyn DecisionLog,
) -> OverrideResult {
    let ctx = DetectionContext {
        messages,
        force_param,
        parent_request_id,
        log,
    };
    DETECTORS
        .iter()
        .find_map(|detector| detector(&ctx))
        .unwrap_or_else(OverrideResult::none)
}

fn detect_heartbeat(ctx: &DetectionContext<'_>) -> Option<OverrideResult> {
    let content = ctx.last_user_content()?.trim().to_lowercase();
    if HEARTBEAT_PHRASES.contains(&content.as_str()) {
        return Some(OverrideResult::forced(
            OverrideKind::Heartbeat,
            HEARTBEAT_MODEL_ID,
        ));
    }
    None
}

fn detect_explicit_force(ctx: &DetectionContext<'_>) -> Option<OverrideResult> {
    if let Some(param) = ctx.force_param {
        let trimmed = param.trim();
        let key = trimmed.strip_prefix('/').unwrap_or(trimmed);
        if !key.is_empty() {
            if let Some(result) = lookup_alias(key) {
                return Some(result);
            }
            // Not an alias: pass the value through as a raw model id and
            // let the routing engine degrade if it is unknown
            return Some(OverrideResult::forced(OverrideKind::ForceModel, key));
        }
    }

    let content = ctx.last_user_content()?.trim_start();
    let token = content.split_whitespace().next()?;
    let key = token.strip_prefix('/')?;
    // Unrecognized slash tokens are plain text, not overrides; the token
    // stays in the message for classification
    lookup_alias(key)
}

fn lookup_alias(key: &str) -> Option<OverrideResult> {
    let key = key.to_lowercase();
    FORCE_ALIASES
        .iter()
        .find(|(alias, _, _)| *alias == key)
        .map(|(_, kind, model)| OverrideResult::forced(*kind, *model))
}

fn detect_sub_agent(ctx: &DetectionContext<'_>) -> Option<OverrideResult> {
    let parent_id = ctx.parent_request_id?;
    // Point-in-time read; a parent entry not yet flushed means no override
    let parent = ctx.log.most_recent_by_request_id(parent_id)?;

    let position = STEP_DOWN_LADDER
        .iter()
        .position(|id| *id == parent.selected_model);
    match position {
        Some(rung) if rung + 1 < STEP_DOWN_LADDER.len() => Some(OverrideResult::forced(
            OverrideKind::SubAgentStepdown,
            STEP_DOWN_LADDER[rung + 1],
        )),
        // Bottom of the ladder, or a model outside it: inherit rather than
        // fail so delegation chains always resolve
        _ => Some(OverrideResult::forced(
            OverrideKind::SubAgentInherit,
            parent.selected_model,
        )),
    }
}
