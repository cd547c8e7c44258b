//! Type definitions for reallocation event records.

use serde::{Deserialize, Serialize};

/// Direction of one reallocation leg.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Capital supplied into a lending market.
    Deposit,
    /// Capital pulled out of a lending market.
    Withdraw,
}

impl EventKind {
    /// Parses the dataset's `type` column. Unrecognized values yield `None`,
    /// which keeps the row out of both join partitions.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Deposit" => Some(Self::Deposit),
            "Withdraw" => Some(Self::Withdraw),
            _ => None,
        }
    }
}

/// One row of the reallocation dataset.
///
/// Numeric fields are `None` when the source cell failed coercion. A null
/// field excludes the row from computations that need it; it never aborts
/// the load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReallocationEvent {
    /// Leg direction (`None` if the `type` cell was unrecognized).
    pub kind: Option<EventKind>,
    /// Block number; shared by both legs of an atomic reallocation.
    pub block_number: Option<u64>,
    /// Name of the vault that moved the capital.
    pub vault_name: String,
    /// Symbol of the vault's underlying asset.
    pub vault_asset_symbol: String,
    /// Decimal scale of `assets`.
    pub vault_asset_decimals: Option<u32>,
    /// Raw token amount before decimal scaling.
    pub assets: Option<f64>,
    /// Collateral asset symbol of the lending market.
    pub market_collateral_asset_symbol: String,
    /// Market liquidation LTV at 1e18 fixed-point scale.
    pub market_lltv: Option<f64>,
    /// Per-block borrow rate at 1e8 scale, current snapshot.
    pub borrow_rate_current: Option<f64>,
    /// Per-block borrow rate at 1e8 scale, previous snapshot.
    pub borrow_rate_previous: Option<f64>,
    /// Transaction hash (0x-prefixed hex).
    pub tx_hash: String,
}
