//! Model catalog and provider availability
//!
//! The catalog is the static list of routable models. Resolution walks
//! preference lists against the set of configured providers; fallback is
//! total because the local provider never needs credentials and the catalog
//! constructor requires at least one local model.

use super::{ModelDescriptor, Provider};
use crate::error::{AppError, AppResult};
use crate::registry::Capability;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Derived per-provider availability
///
/// A provider is configured when its credential or base URL is present in
/// the runtime config. The local provider is configured unconditionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAvailability {
    configured: BTreeSet<Provider>,
}

impl ProviderAvailability {
    /// Derive availability from the set of providers with credentials
    ///
    /// The local provider is always inserted, whether or not it appears in
    /// the input.
    pub fn from_configured(providers: impl IntoIterator<Item = Provider>) -> Self {
        let mut configured: BTreeSet<Provider> = providers.into_iter().collect();
        configured.insert(Provider::Local);
        Self { configured }
    }

    /// Availability with no credentialed providers (local only)
    pub fn local_only() -> Self {
        Self::from_configured([])
    }

    /// Check whether a provider is configured
    pub fn is_configured(&self, provider: Provider) -> bool {
        self.configured.contains(&provider)
    }

    /// Get the configured provider set
    pub fn providers(&self) -> &BTreeSet<Provider> {
        &self.configured
    }
}

/// Immutable model catalog
///
/// Built once at startup (or per test fixture) and swapped wholesale on
/// reload, never mutated in place.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
    // Index of a local-provider model, proven to exist by `new`. Seeds the
    // fallback fold so resolution is total without a panicking unwrap.
    local_seed: usize,
}

impl ModelCatalog {
    /// Build a catalog from descriptors
    ///
    /// # Errors
    /// Returns an error if two descriptors share an id, or if no descriptor
    /// belongs to the local provider (which would break fallback totality).
    pub fn new(models: Vec<ModelDescriptor>) -> AppResult<Self> {
        let mut seen = BTreeSet::new();
        for model in &models {
            if !seen.insert(model.id()) {
                return Err(AppError::Validation(format!(
                    "Catalog contains duplicate model id '{}'",
                    model.id()
                )));
            }
        }

        let local_seed = models
            .iter()
            .position(|m| m.provider() == Provider::Local)
            .ok_or_else(|| {
                AppError::Validation(
                    "Catalog has no local-provider model; fallback resolution requires one \
                    always-available entry"
                        .to_string(),
                )
            })?;

        Ok(Self { models, local_seed })
    }

    /// The catalog shipped with the binary
    ///
    /// Unit costs are USD per million tokens.
    pub fn builtin() -> Self {
        use Capability::{Analysis, Chat, Code, Reasoning, Vision};

        let models = vec![
            ModelDescriptor::new(
                "claude-opus-4",
                Provider::Anthropic,
                15.0,
                75.0,
                200_000,
                vec![Chat, Code, Analysis, Reasoning, Vision],
            ),
            ModelDescriptor::new(
                "claude-sonnet-4",
                Provider::Anthropic,
                3.0,
                15.0,
                200_000,
                vec![Chat, Code, Analysis, Vision],
            ),
            ModelDescriptor::new(
                "gpt-5",
                Provider::OpenAi,
                1.25,
                10.0,
                400_000,
                vec![Chat, Code, Analysis, Reasoning, Vision],
            ),
            ModelDescriptor::new(
                "o3",
                Provider::OpenAi,
                2.0,
                8.0,
                200_000,
                vec![Chat, Code, Analysis, Reasoning],
            ),
            ModelDescriptor::new(
                "gpt-4o-mini",
                Provider::OpenAi,
                0.15,
                0.60,
                128_000,
                vec![Chat, Vision],
            ),
            ModelDescriptor::new(
                "gemini-2.5-flash",
                Provider::Google,
                0.30,
                2.50,
                1_048_576,
                vec![Chat, Code, Vision],
            ),
            ModelDescriptor::new(
                "gemini-2.5-flash-lite",
                Provider::Google,
                0.10,
                0.40,
                1_048_576,
                vec![Chat, Vision],
            ),
            ModelDescriptor::new(
                "deepseek-chat",
                Provider::DeepSeek,
                0.27,
                1.10,
                128_000,
                vec![Chat, Code],
            ),
            ModelDescriptor::new(
                "grok-3-mini",
                Provider::XAi,
                0.30,
                0.50,
                131_072,
                vec![Chat, Reasoning],
            ),
            ModelDescriptor::new(
                "kimi-k2",
                Provider::Moonshot,
                0.60,
                2.50,
                131_072,
                vec![Chat, Code],
            ),
            ModelDescriptor::new(
                "mistral-large",
                Provider::Mistral,
                2.0,
                6.0,
                128_000,
                vec![Chat, Code, Analysis],
            ),
            ModelDescriptor::new(
                "llama-3.1-8b-local",
                Provider::Local,
                0.0,
                0.0,
                131_072,
                vec![Chat],
            ),
        ];

        Self::new(models).expect("builtin catalog must satisfy catalog invariants")
    }

    /// Look up a model by id
    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id() == id)
    }

    /// Iterate over all catalog entries
    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Resolve a preference list to the first model whose provider is
    /// configured
    ///
    /// Ids not present in the catalog are skipped. Returns `None` when no
    /// entry in the list is resolvable, in which case callers fall back via
    /// [`ModelCatalog::resolve_fallback`].
    pub fn resolve_preference<S: AsRef<str>>(
        &self,
        ordered_ids: &[S],
        availability: &ProviderAvailability,
    ) -> Option<&ModelDescriptor> {
        ordered_ids
            .iter()
            .filter_map(|id| self.get(id.as_ref()))
            .find(|m| availability.is_configured(m.provider()))
    }

    /// Resolve the cheapest configured model across the whole catalog
    ///
    /// Tie-break is deterministic: lowest input cost, then lowest output
    /// cost, then lexicographic id. Never fails: the local model validated
    /// by the constructor is always configured, so the candidate set is
    /// never empty.
    pub fn resolve_fallback(&self, availability: &ProviderAvailability) -> &ModelDescriptor {
        self.models
            .iter()
            .filter(|m| availability.is_configured(m.provider()))
            .fold(&self.models[self.local_seed], cheaper)
    }
}

/// Pick the cheaper of two descriptors under the fallback ordering
///
/// Keeps `best` on ties so folding preserves first-seen order before the
/// lexicographic id comparison breaks genuine ties.
fn cheaper<'a>(best: &'a ModelDescriptor, candidate: &'a ModelDescriptor) -> &'a ModelDescriptor {
    let ordering = best
        .input_cost_per_mtok()
        .total_cmp(&candidate.input_cost_per_mtok())
        .then_with(|| {
            best.output_cost_per_mtok()
                .total_cmp(&candidate.output_cost_per_mtok())
        })
        .then_with(|| best.id().cmp(candidate.id()));

    if ordering == Ordering::Greater {
        candidate
    } else {
        best
    }
}
