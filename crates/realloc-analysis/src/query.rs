//! Block equi-join and per-pair derivation over the reallocation dataset.
//!
//! Each query re-scans the immutable dataset and returns a fresh projection;
//! nothing is cached between requests.

use std::collections::HashMap;

use realloc_data::dataset::Dataset;
use realloc_data::types::{EventKind, ReallocationEvent};
use serde::Serialize;
use tracing::debug;

use crate::classify::{StrategyFilter, StrategyFlags, LLTV_SCALE, RATE_SCALE};

/// Block-explorer prefix for transaction links.
const ETHERSCAN_TX_URL: &str = "https://etherscan.io/tx/";

/// One rendered row of the reallocation pair table.
///
/// Serialized field names follow the published schema. The `supply_*` side
/// reads the Withdraw-kind leg and the `withdraw_*` side the Deposit-kind
/// leg; the supply leg also sources the transfer value, the vault token
/// symbol, and the transaction link.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderRow {
    /// Block shared by both legs.
    #[serde(rename = "blockNumber")]
    pub block_number: u64,
    /// Withdraw-leg token amount scaled by the vault asset decimals, rounded
    /// to a whole number.
    #[serde(rename = "assetsValue")]
    pub assets_value: f64,
    /// Vault underlying asset symbol (the "vault token" column).
    #[serde(rename = "collateralAsset.symbol")]
    pub vault_token: String,
    /// Withdraw-leg market LLTV normalized from 1e18 scale, 2 dp.
    #[serde(rename = "supplyLTV")]
    pub supply_ltv: f64,
    /// Withdraw-leg market collateral symbol.
    #[serde(rename = "supplyAsset")]
    pub supply_asset: String,
    /// Deposit-leg market LLTV normalized from 1e18 scale, 2 dp.
    #[serde(rename = "withdrawLTV")]
    pub withdraw_ltv: f64,
    /// Deposit-leg market collateral symbol.
    #[serde(rename = "withdrawAsset")]
    pub withdraw_asset: String,
    /// Withdraw-leg current borrow rate in percent, 2 dp.
    #[serde(rename = "supplyRate")]
    pub supply_rate: f64,
    /// Deposit-leg previous borrow rate in percent, 2 dp.
    #[serde(rename = "withdrawRate")]
    pub withdraw_rate: f64,
    /// Current-rate spread between the two legs in percentage points, 2 dp.
    #[serde(rename = "ratesDifference")]
    pub rates_difference: f64,
    #[serde(rename = "collateralDiversification")]
    pub collateral_diversification: bool,
    #[serde(rename = "yieldChasing")]
    pub yield_chasing: bool,
    #[serde(rename = "ltvReduction")]
    pub ltv_reduction: bool,
    /// Markdown link `[<first 10 chars>](https://etherscan.io/tx/<hash>)`.
    #[serde(rename = "txHashDisplay")]
    pub tx_hash_display: String,
}

impl RenderRow {
    fn flags(&self) -> StrategyFlags {
        StrategyFlags {
            collateral_diversification: self.collateral_diversification,
            yield_chasing: self.yield_chasing,
            ltv_reduction: self.ltv_reduction,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Markdown link labelled with the first 10 hash characters.
fn tx_hash_display(hash: &str) -> String {
    let label = if hash.len() > 10 { &hash[..10] } else { hash };
    format!("[{label}]({ETHERSCAN_TX_URL}{hash})")
}

/// Derives one render row from a withdraw/deposit pair sharing `block_number`.
///
/// Returns `None` when any numeric field the derivation needs is null; the
/// pair is dropped rather than rendered partially.
fn derive_pair(
    block_number: u64,
    withdraw: &ReallocationEvent,
    deposit: &ReallocationEvent,
) -> Option<RenderRow> {
    let flags = StrategyFlags::classify(withdraw, deposit)?;

    let supply_rate_raw = withdraw.borrow_rate_current?;
    let deposit_rate_raw = deposit.borrow_rate_current?;
    let assets = withdraw.assets?;
    let decimals = withdraw.vault_asset_decimals?;

    // withdraw_rate reads the t-1 rate; rates_difference compares t rates on
    // both legs.
    Some(RenderRow {
        block_number,
        assets_value: (assets / 10f64.powi(decimals as i32)).round(),
        vault_token: withdraw.vault_asset_symbol.clone(),
        supply_ltv: round2(withdraw.market_lltv? / LLTV_SCALE),
        supply_asset: withdraw.market_collateral_asset_symbol.clone(),
        withdraw_ltv: round2(deposit.market_lltv? / LLTV_SCALE),
        withdraw_asset: deposit.market_collateral_asset_symbol.clone(),
        supply_rate: round2(supply_rate_raw / RATE_SCALE),
        withdraw_rate: round2(deposit.borrow_rate_previous? / RATE_SCALE),
        rates_difference: round2(supply_rate_raw / RATE_SCALE - deposit_rate_raw / RATE_SCALE),
        collateral_diversification: flags.collateral_diversification,
        yield_chasing: flags.yield_chasing,
        ltv_reduction: flags.ltv_reduction,
        tx_hash_display: tx_hash_display(&withdraw.tx_hash),
    })
}

/// Runs the pair query: select by vault, equi-join deposits to withdrawals
/// on block number, derive metrics, and apply the strategy filters.
///
/// Join semantics: all m×n combinations within a block are retained, so a
/// block with several legs fans out into several candidate pairs. Rows with
/// a null block number never join. Output order is stable: withdrawal legs
/// in dataset order, deposit legs in dataset order within each block.
///
/// An empty `filters` slice applies no filtering; filters are ANDed. A vault
/// name matching zero rows yields an empty result, never an error.
pub fn query(
    dataset: &Dataset,
    vault: Option<&str>,
    filters: &[StrategyFilter],
) -> Vec<RenderRow> {
    let selected: Vec<&ReallocationEvent> = dataset
        .events()
        .iter()
        .filter(|event| vault.map_or(true, |name| event.vault_name == name))
        .collect();

    let mut deposits_by_block: HashMap<u64, Vec<&ReallocationEvent>> = HashMap::new();
    for event in selected.iter().copied() {
        if event.kind == Some(EventKind::Deposit) {
            if let Some(block) = event.block_number {
                deposits_by_block.entry(block).or_default().push(event);
            }
        }
    }

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for withdraw in selected
        .iter()
        .copied()
        .filter(|event| event.kind == Some(EventKind::Withdraw))
    {
        let Some(block) = withdraw.block_number else {
            continue;
        };
        let Some(deposits) = deposits_by_block.get(&block) else {
            continue;
        };

        for deposit in deposits {
            match derive_pair(block, withdraw, deposit) {
                Some(row) => {
                    if row.flags().matches(filters) {
                        rows.push(row);
                    }
                }
                None => dropped += 1,
            }
        }
    }

    if dropped > 0 {
        debug!(dropped, "pairs dropped due to null numeric fields");
    }

    rows
}
