//! Strategy heuristics for reallocation pairs.
//!
//! A pair is one Withdraw-kind and one Deposit-kind event sharing a block.
//! Three heuristics classify what the vault curator was doing; each maps to
//! a filter key the query interface accepts.

use realloc_data::types::ReallocationEvent;
use serde::{Deserialize, Serialize};

/// Fixed-point scale of the borrow-rate columns.
pub const RATE_SCALE: f64 = 1e8;

/// Fixed-point scale of the market LLTV column.
pub const LLTV_SCALE: f64 = 1e18;

/// Strategy filters accepted by the query interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyFilter {
    /// The collateral symbol changed between the two markets.
    CollateralDiversification,
    /// Capital left a lower-rate market for a higher-rate one.
    YieldChasing,
    /// Capital moved to a market with a lower liquidation LTV.
    LtvReduction,
}

impl StrategyFilter {
    /// All filters, in display order.
    pub const ALL: [StrategyFilter; 3] = [
        StrategyFilter::CollateralDiversification,
        StrategyFilter::YieldChasing,
        StrategyFilter::LtvReduction,
    ];

    /// Parses a wire key. Unknown keys yield `None` so callers can skip them
    /// instead of rejecting the request.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "collateral_diversification" => Some(Self::CollateralDiversification),
            "yield_chasing" => Some(Self::YieldChasing),
            "ltv_reduction" => Some(Self::LtvReduction),
            _ => None,
        }
    }

    /// The wire key for this filter.
    pub fn key(self) -> &'static str {
        match self {
            Self::CollateralDiversification => "collateral_diversification",
            Self::YieldChasing => "yield_chasing",
            Self::LtvReduction => "ltv_reduction",
        }
    }
}

/// Derived strategy booleans for one withdraw/deposit pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StrategyFlags {
    /// Collateral symbol differs between the two markets.
    pub collateral_diversification: bool,
    /// Withdraw-leg current rate exceeds deposit-leg current rate.
    pub yield_chasing: bool,
    /// Withdraw-leg LLTV is below deposit-leg LLTV.
    pub ltv_reduction: bool,
}

impl StrategyFlags {
    /// Classifies a pair. The withdraw leg feeds the `supply_*` side of the
    /// rendered schema; the deposit leg feeds the `withdraw_*` side.
    ///
    /// Returns `None` when a numeric field the heuristics need is null, so
    /// the caller drops the pair instead of classifying on garbage.
    pub fn classify(
        withdraw: &ReallocationEvent,
        deposit: &ReallocationEvent,
    ) -> Option<Self> {
        let withdraw_rate = withdraw.borrow_rate_current?;
        let deposit_rate = deposit.borrow_rate_current?;
        let withdraw_lltv = withdraw.market_lltv?;
        let deposit_lltv = deposit.market_lltv?;

        Some(Self {
            collateral_diversification: withdraw.market_collateral_asset_symbol
                != deposit.market_collateral_asset_symbol,
            yield_chasing: withdraw_rate / RATE_SCALE > deposit_rate / RATE_SCALE,
            ltv_reduction: withdraw_lltv / LLTV_SCALE < deposit_lltv / LLTV_SCALE,
        })
    }

    /// True when every filter in `filters` is satisfied. An empty slice
    /// matches everything.
    pub fn matches(&self, filters: &[StrategyFilter]) -> bool {
        filters.iter().all(|filter| match filter {
            StrategyFilter::CollateralDiversification => self.collateral_diversification,
            StrategyFilter::YieldChasing => self.yield_chasing,
            StrategyFilter::LtvReduction => self.ltv_reduction,
        })
    }
}
