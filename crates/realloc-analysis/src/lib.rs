//! realloc-analysis crate
//!
//! Pair classification over the loaded reallocation dataset: block equi-join
//! of withdraw and deposit legs, per-pair metric derivation, strategy
//! heuristics, and conjunctive filtering.

pub mod classify;
pub mod query;

pub use classify::{StrategyFilter, StrategyFlags};
pub use query::{query, RenderRow};
