//! Thriftroute - cost-optimizing routing core for multi-provider LLM proxies
//!
//! Decides, per request, which backend model should serve it while balancing
//! cost against capability: a sub-millisecond heuristic classifier scores the
//! message list into a tier, a fixed-precedence override resolver detects
//! heartbeat, explicit force, and sub-agent step-down bypasses, and the model
//! registry resolves preference lists with a guaranteed fallback. Every
//! decision is recorded in an append-only ledger that the sub-agent logic
//! reads back.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod message;
pub mod metrics;
pub mod overrides;
pub mod registry;
pub mod router;
pub mod telemetry;
