//! Routing table: (mode, tier) to ordered model preference lists
//!
//! Immutable after construction. A config reload builds a fresh table and
//! swaps it wholesale; there is no mutation API, so no reader can observe a
//! partially updated preference list.

use super::{Mode, ModelCatalog};
use crate::classifier::Tier;
use crate::error::{AppError, AppResult};
use std::collections::BTreeMap;

const ALL_MODES: [Mode; 3] = [Mode::Eco, Mode::Standard, Mode::Performance];
const ALL_TIERS: [Tier; 3] = [Tier::Simple, Tier::Standard, Tier::Complex];

/// Immutable (mode, tier) → preference list map
#[derive(Debug, Clone)]
pub struct RoutingTable {
    cells: BTreeMap<(Mode, Tier), Vec<String>>,
}

impl RoutingTable {
    /// Build a table from explicit cells
    pub fn new(cells: impl IntoIterator<Item = ((Mode, Tier), Vec<String>)>) -> Self {
        Self {
            cells: cells.into_iter().collect(),
        }
    }

    /// The routing table shipped with the binary
    ///
    /// Lists lean cheap in eco mode and capable in performance mode; every
    /// id appears in [`ModelCatalog::builtin`].
    pub fn builtin() -> Self {
        Self::new([
            (
                (Mode::Eco, Tier::Simple),
                ids(&[
                    "gemini-2.5-flash-lite",
                    "gpt-4o-mini",
                    "deepseek-chat",
                    "llama-3.1-8b-local",
                ]),
            ),
            (
                (Mode::Eco, Tier::Standard),
                ids(&[
                    "gemini-2.5-flash",
                    "gpt-4o-mini",
                    "deepseek-chat",
                    "grok-3-mini",
                ]),
            ),
            (
                (Mode::Eco, Tier::Complex),
                ids(&["claude-sonnet-4", "gpt-5", "kimi-k2", "gemini-2.5-flash"]),
            ),
            (
                (Mode::Standard, Tier::Simple),
                ids(&["gemini-2.5-flash-lite", "gpt-4o-mini", "gemini-2.5-flash"]),
            ),
            (
                (Mode::Standard, Tier::Standard),
                ids(&[
                    "gemini-2.5-flash",
                    "claude-sonnet-4",
                    "gpt-5",
                    "deepseek-chat",
                ]),
            ),
            (
                (Mode::Standard, Tier::Complex),
                ids(&["claude-sonnet-4", "gpt-5", "claude-opus-4", "o3"]),
            ),
            (
                (Mode::Performance, Tier::Simple),
                ids(&["gemini-2.5-flash", "claude-sonnet-4", "gpt-4o-mini"]),
            ),
            (
                (Mode::Performance, Tier::Standard),
                ids(&["claude-sonnet-4", "gpt-5", "o3", "gemini-2.5-flash"]),
            ),
            (
                (Mode::Performance, Tier::Complex),
                ids(&["claude-opus-4", "gpt-5", "o3", "claude-sonnet-4"]),
            ),
        ])
    }

    /// Get the preference list for a (mode, tier) cell
    ///
    /// Returns an empty slice for a missing cell; [`RoutingTable::validate`]
    /// makes that state unreachable after startup.
    pub fn preference(&self, mode: Mode, tier: Tier) -> &[String] {
        self.cells
            .get(&(mode, tier))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Validate the table against a catalog
    ///
    /// # Errors
    /// Returns an error if any (mode, tier) cell is missing or empty, or if
    /// a cell references a model id the catalog does not contain. Fatal at
    /// startup: no request is routed until the table is fixed.
    pub fn validate(&self, catalog: &ModelCatalog) -> AppResult<()> {
        for mode in ALL_MODES {
            for tier in ALL_TIERS {
                let list = self.preference(mode, tier);
                if list.is_empty() {
                    return Err(AppError::Validation(format!(
                        "Routing table cell ({}, {}) has no preference list. Every mode/tier \
                        combination must list at least one model id.",
                        mode.as_str(),
                        tier.as_str()
                    )));
                }
                for id in list {
                    if catalog.get(id).is_none() {
                        return Err(AppError::Validation(format!(
                            "Routing table cell ({}, {}) references unknown model id '{}'",
                            mode.as_str(),
                            tier.as_str(),
                            id
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}
