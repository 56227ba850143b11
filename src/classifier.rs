//! Heuristic request classifier
//!
//! Scores a message list into a difficulty tier using eight bounded
//! dimensions and a configurable weighted sum. Pure CPU work, no I/O, so it
//! can sit on the hot path of every request; long transcripts are capped
//! during scanning to keep latency sub-millisecond.

use crate::error::{AppError, AppResult};
use crate::message::{Message, Role, estimate_tokens};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

/// Most recent messages considered when scanning content
const MAX_SCAN_MESSAGES: usize = 32;
/// Per-message byte window for content scans
const MAX_SCAN_BYTES_PER_MESSAGE: usize = 8 * 1024;

/// Token estimate at which the token-count dimension saturates
const TOKEN_SATURATION: f64 = 1024.0;
/// Reasoning-marker hits at which that dimension saturates
const REASONING_SATURATION: f64 = 3.0;
/// Simple-indicator hits at which that dimension saturates
const SIMPLE_SATURATION: f64 = 2.0;
/// Multi-step pattern hits at which that dimension saturates
const MULTI_STEP_SATURATION: f64 = 3.0;
/// Question marks at which that dimension saturates
const QUESTION_SATURATION: f64 = 3.0;
/// System-prompt characters at which that dimension saturates
const SYSTEM_SATURATION: f64 = 1500.0;
/// Prior turns at which the conversation-depth dimension saturates
const DEPTH_SATURATION: f64 = 12.0;

static REASONING_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(prove|derive|analy[sz]e|architect(?:ure)?|design|implement|refactor|debug|optimi[sz]e|algorithm|complexity|trade-?offs?|step[ -]by[ -]step|root cause|formally|theorem|benchmark|security|migrate|concurren(?:cy|t))\b",
    )
    .expect("reasoning marker pattern is valid")
});

static SIMPLE_INDICATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(what is|what's|who is|define|meaning of|translate|convert|thank you|thanks|hello|hi there|hey|remind me|list of)\b",
    )
    .expect("simple indicator pattern is valid")
});

static NUMBERED_STEPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+[.)]\s+").expect("numbered step pattern is valid"));

static STEP_REFERENCES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bstep \d+\b").expect("step reference pattern is valid"));

static FIRST_THEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bfirst\b.+?\bthen\b").expect("first/then pattern is valid")
});

/// Classifier difficulty tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Simple,
    Standard,
    Complex,
}

impl Tier {
    /// Convert to string representation for logging and serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Standard => "standard",
            Self::Complex => "complex",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-dimension weights for the composite score
///
/// `simple_indicators` defaults to a negative weight: indicator hits argue
/// against complexity. The positive defaults sum to 1.0 so a request that
/// saturates every complexity dimension scores at the top of the range.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct DimensionWeights {
    #[serde(default = "default_w_token_count")]
    pub token_count: f64,
    #[serde(default = "default_w_code_presence")]
    pub code_presence: f64,
    #[serde(default = "default_w_reasoning_markers")]
    pub reasoning_markers: f64,
    #[serde(default = "default_w_simple_indicators")]
    pub simple_indicators: f64,
    #[serde(default = "default_w_multi_step")]
    pub multi_step: f64,
    #[serde(default = "default_w_question_count")]
    pub question_count: f64,
    #[serde(default = "default_w_system_signal")]
    pub system_signal: f64,
    #[serde(default = "default_w_conversation_depth")]
    pub conversation_depth: f64,
}

fn default_w_token_count() -> f64 {
    0.15
}

fn default_w_code_presence() -> f64 {
    0.20
}

fn default_w_reasoning_markers() -> f64 {
    0.25
}

fn default_w_simple_indicators() -> f64 {
    -0.15
}

fn default_w_multi_step() -> f64 {
    0.15
}

fn default_w_question_count() -> f64 {
    0.05
}

fn default_w_system_signal() -> f64 {
    0.05
}

fn default_w_conversation_depth() -> f64 {
    0.15
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            token_count: default_w_token_count(),
            code_presence: default_w_code_presence(),
            reasoning_markers: default_w_reasoning_markers(),
            simple_indicators: default_w_simple_indicators(),
            multi_step: default_w_multi_step(),
            question_count: default_w_question_count(),
            system_signal: default_w_system_signal(),
            conversation_depth: default_w_conversation_depth(),
        }
    }
}

/// Classifier thresholds and weights
///
/// Loaded from the `[classifier]` config section; fields are private to keep
/// validated thresholds immutable. Tier boundaries are inclusive: a
/// composite equal to `simple_max` is simple, equal to `complex_min` is
/// complex.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ClassifierSettings {
    #[serde(default = "default_simple_max")]
    simple_max: f64,
    #[serde(default = "default_complex_min")]
    complex_min: f64,
    #[serde(default)]
    weights: DimensionWeights,
}

fn default_simple_max() -> f64 {
    0.15
}

fn default_complex_min() -> f64 {
    0.55
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            simple_max: default_simple_max(),
            complex_min: default_complex_min(),
            weights: DimensionWeights::default(),
        }
    }
}

impl ClassifierSettings {
    /// Create settings with explicit thresholds and default weights
    ///
    /// # Errors
    /// Returns an error if the thresholds fail validation.
    pub fn new(simple_max: f64, complex_min: f64) -> AppResult<Self> {
        let settings = Self {
            simple_max,
            complex_min,
            weights: DimensionWeights::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Get the inclusive upper bound of the simple tier
    pub fn simple_max(&self) -> f64 {
        self.simple_max
    }

    /// Get the inclusive lower bound of the complex tier
    pub fn complex_min(&self) -> f64 {
        self.complex_min
    }

    /// Get the dimension weights
    pub fn weights(&self) -> &DimensionWeights {
        &self.weights
    }

    /// Replace the dimension weights
    pub fn with_weights(mut self, weights: DimensionWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Map a composite score to its tier (boundaries inclusive)
    pub fn tier_for(&self, composite: f64) -> Tier {
        if composite <= self.simple_max {
            Tier::Simple
        } else if composite >= self.complex_min {
            Tier::Complex
        } else {
            Tier::Standard
        }
    }

    /// Validate thresholds and weights
    ///
    /// # Errors
    /// Returns an error if a threshold is outside [0, 1] or not finite, if
    /// `simple_max` is not strictly below `complex_min`, or if any weight is
    /// not finite.
    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("classifier.simple_max", self.simple_max),
            ("classifier.complex_min", self.complex_min),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(AppError::Config(format!(
                    "{} must be a finite number between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }

        if self.simple_max >= self.complex_min {
            return Err(AppError::Config(format!(
                "classifier.simple_max ({}) must be strictly below classifier.complex_min ({}). \
                Equal or inverted boundaries would leave no standard tier.",
                self.simple_max, self.complex_min
            )));
        }

        let w = &self.weights;
        for (name, value) in [
            ("token_count", w.token_count),
            ("code_presence", w.code_presence),
            ("reasoning_markers", w.reasoning_markers),
            ("simple_indicators", w.simple_indicators),
            ("multi_step", w.multi_step),
            ("question_count", w.question_count),
            ("system_signal", w.system_signal),
            ("conversation_depth", w.conversation_depth),
        ] {
            if !value.is_finite() {
                return Err(AppError::Config(format!(
                    "classifier.weights.{} must be a finite number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// The eight per-dimension scores, each normalized to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DimensionScores {
    pub token_count: f64,
    pub code_presence: f64,
    pub reasoning_markers: f64,
    pub simple_indicators: f64,
    pub multi_step: f64,
    pub question_count: f64,
    pub system_signal: f64,
    pub conversation_depth: f64,
}

/// Result of classifying one request
///
/// Request-scoped; the routing engine copies what it needs into the
/// decision and the ledger entry.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub tier: Tier,
    pub composite: f64,
    pub dimensions: DimensionScores,
    pub latency: Duration,
}

/// Classify a message list into a difficulty tier
///
/// Scans at most the last [`MAX_SCAN_MESSAGES`] messages, each truncated to
/// [`MAX_SCAN_BYTES_PER_MESSAGE`] bytes. An empty message list scores a
/// composite of 0 and classifies as simple.
pub fn classify(messages: &[Message], settings: &ClassifierSettings) -> ClassificationResult {
    let started = Instant::now();

    let window_start = messages.len().saturating_sub(MAX_SCAN_MESSAGES);
    let window = &messages[window_start..];

    let mut scan_text = String::new();
    let mut system_chars = 0usize;
    for message in window {
        let clipped = clip(message.content(), MAX_SCAN_BYTES_PER_MESSAGE);
        if message.role() == Role::System {
            system_chars += clipped.chars().count();
        }
        scan_text.push_str(clipped);
        scan_text.push('\n');
    }

    let dimensions = DimensionScores {
        token_count: ratio(f64::from(estimate_tokens(&scan_text)), TOKEN_SATURATION),
        code_presence: score_code_presence(&scan_text),
        reasoning_markers: ratio(
            count_matches(&REASONING_MARKERS, &scan_text) as f64,
            REASONING_SATURATION,
        ),
        simple_indicators: ratio(
            count_matches(&SIMPLE_INDICATORS, &scan_text) as f64,
            SIMPLE_SATURATION,
        ),
        multi_step: score_multi_step(&scan_text),
        question_count: ratio(
            scan_text.matches('?').count() as f64,
            QUESTION_SATURATION,
        ),
        system_signal: ratio(system_chars as f64, SYSTEM_SATURATION),
        conversation_depth: ratio(
            messages.len().saturating_sub(1) as f64,
            DEPTH_SATURATION,
        ),
    };

    let composite = composite_score(&dimensions, settings.weights());
    let tier = settings.tier_for(composite);

    ClassificationResult {
        tier,
        composite,
        dimensions,
        latency: started.elapsed(),
    }
}

/// Weighted sum of the dimension scores, clamped to [0, 1]
fn composite_score(d: &DimensionScores, w: &DimensionWeights) -> f64 {
    let raw = w.token_count * d.token_count
        + w.code_presence * d.code_presence
        + w.reasoning_markers * d.reasoning_markers
        + w.simple_indicators * d.simple_indicators
        + w.multi_step * d.multi_step
        + w.question_count * d.question_count
        + w.system_signal * d.system_signal
        + w.conversation_depth * d.conversation_depth;
    raw.clamp(0.0, 1.0)
}

fn score_code_presence(text: &str) -> f64 {
    let fence_score = ratio(text.matches("```").count() as f64 * 0.4, 1.0);

    let total_chars = text.chars().count();
    if total_chars == 0 {
        return 0.0;
    }
    let code_chars = text
        .chars()
        .filter(|c| matches!(c, '{' | '}' | '(' | ')' | ';' | '=' | '<' | '>' | '[' | ']'))
        .count();
    let density_score = ratio(code_chars as f64 / total_chars as f64 * 12.0, 1.0);

    fence_score.max(density_score)
}

fn score_multi_step(text: &str) -> f64 {
    let mut hits = count_matches(&NUMBERED_STEPS, text) + count_matches(&STEP_REFERENCES, text);
    if FIRST_THEN.is_match(text) {
        hits += 1;
    }
    ratio(hits as f64, MULTI_STEP_SATURATION)
}

fn count_matches(pattern: &Regex, text: &str) -> usize {
    pattern.find_iter(text).count()
}

fn ratio(value: f64, saturation: f64) -> f64 {
    (value / saturation).min(1.0)
}

/// Truncate to at most `max` bytes without splitting a UTF-8 character
fn clip(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
