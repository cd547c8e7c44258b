//! Shared test helpers and utilities.
//!
//! Provides factory functions for creating reallocation event test doubles
//! with sensible defaults.

#![allow(dead_code)]

use realloc_data::types::{EventKind, ReallocationEvent};

/// A 66-character hash whose first 10 characters are `0xabc12345`.
pub const SAMPLE_TX_HASH: &str =
    "0xabc12345000000000000000000000000000000000000000000000000000000ff";

/// Creates a fully populated Withdraw-kind event.
///
/// Defaults: USDC vault asset with 6 decimals, 1_000_000 raw assets (one
/// whole token), wstETH collateral, 5.00% current rate, 0.8 LLTV.
pub fn sample_withdraw(block: u64, vault: &str) -> ReallocationEvent {
    ReallocationEvent {
        kind: Some(EventKind::Withdraw),
        block_number: Some(block),
        vault_name: vault.to_string(),
        vault_asset_symbol: "USDC".to_string(),
        vault_asset_decimals: Some(6),
        assets: Some(1_000_000.0),
        market_collateral_asset_symbol: "wstETH".to_string(),
        market_lltv: Some(800_000_000_000_000_000.0),
        borrow_rate_current: Some(500_000_000.0),
        borrow_rate_previous: Some(480_000_000.0),
        tx_hash: SAMPLE_TX_HASH.to_string(),
    }
}

/// Creates a fully populated Deposit-kind event.
///
/// Defaults: USDC vault asset with 6 decimals, WETH collateral, 3.00%
/// current rate, 2.50% previous rate, 0.7 LLTV.
pub fn sample_deposit(block: u64, vault: &str) -> ReallocationEvent {
    ReallocationEvent {
        kind: Some(EventKind::Deposit),
        block_number: Some(block),
        vault_name: vault.to_string(),
        vault_asset_symbol: "USDC".to_string(),
        vault_asset_decimals: Some(6),
        assets: Some(2_000_000.0),
        market_collateral_asset_symbol: "WETH".to_string(),
        market_lltv: Some(700_000_000_000_000_000.0),
        borrow_rate_current: Some(300_000_000.0),
        borrow_rate_previous: Some(250_000_000.0),
        tx_hash: "0xdeadbeef00000000000000000000000000000000000000000000000000000000"
            .to_string(),
    }
}
