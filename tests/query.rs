//! Integration tests for the pair query: join semantics, derivation values,
//! and filter behavior.

mod common;

use common::{sample_deposit, sample_withdraw, SAMPLE_TX_HASH};
use realloc_analysis::classify::StrategyFilter;
use realloc_analysis::query::query;
use realloc_data::dataset::Dataset;

/// One withdraw and one deposit in the same block and vault.
///
/// Expected derivations:
/// - supplyRate 5.00 (withdraw leg current rate 500000000 / 1e8)
/// - withdrawRate 2.50 (deposit leg previous rate 250000000 / 1e8)
/// - ratesDifference 2.00 (current rates on both legs: 5.00 - 3.00)
/// - supplyLTV 0.80, withdrawLTV 0.70
/// - assetsValue 1 (1000000 / 10^6)
/// - collateralDiversification true, yieldChasing true, ltvReduction false
#[test]
fn end_to_end_single_pair() {
    let mut withdraw = sample_withdraw(100, "V1");
    withdraw.market_collateral_asset_symbol = "USDC".to_string();
    let deposit = sample_deposit(100, "V1");
    let dataset = Dataset::from_events(vec![withdraw, deposit]);

    let rows = query(&dataset, Some("V1"), &[]);
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.block_number, 100);
    assert_eq!(row.supply_rate, 5.0);
    assert_eq!(row.withdraw_rate, 2.5);
    assert_eq!(row.rates_difference, 2.0);
    assert_eq!(row.supply_ltv, 0.8);
    assert_eq!(row.withdraw_ltv, 0.7);
    assert_eq!(row.assets_value, 1.0);
    assert_eq!(row.vault_token, "USDC");
    assert_eq!(row.supply_asset, "USDC");
    assert_eq!(row.withdraw_asset, "WETH");
    assert!(row.collateral_diversification);
    assert!(row.yield_chasing);
    assert!(!row.ltv_reduction);
    assert_eq!(
        row.tx_hash_display,
        format!("[0xabc12345](https://etherscan.io/tx/{SAMPLE_TX_HASH})")
    );

    // The pair keeps LTV exposure flat-or-higher, so the ltv_reduction
    // filter must empty the result.
    assert!(query(&dataset, Some("V1"), &[StrategyFilter::LtvReduction]).is_empty());
}

/// For a block with m withdrawals and n deposits after selection, the join
/// must produce exactly m*n pairs for that block.
#[test]
fn join_produces_m_by_n_pairs_per_block() {
    let events = vec![
        sample_withdraw(100, "V1"),
        sample_withdraw(100, "V1"),
        sample_withdraw(100, "V1"),
        sample_deposit(100, "V1"),
        sample_deposit(100, "V1"),
        sample_withdraw(200, "V1"),
        sample_deposit(200, "V1"),
        sample_deposit(300, "V1"), // deposit with no matching withdrawal
    ];
    let dataset = Dataset::from_events(events);

    let rows = query(&dataset, None, &[]);
    assert_eq!(rows.iter().filter(|r| r.block_number == 100).count(), 3 * 2);
    assert_eq!(rows.iter().filter(|r| r.block_number == 200).count(), 1);
    assert_eq!(rows.iter().filter(|r| r.block_number == 300).count(), 0);
    assert_eq!(rows.len(), 7);
}

/// Selection restricts the join input, not just the output: legs from other
/// vaults never pair with the selected vault's legs.
#[test]
fn vault_selection_restricts_join_input() {
    let events = vec![
        sample_withdraw(100, "V1"),
        sample_deposit(100, "V2"), // same block, different vault
    ];
    let dataset = Dataset::from_events(events);

    assert!(query(&dataset, Some("V1"), &[]).is_empty());
    assert!(query(&dataset, Some("V2"), &[]).is_empty());
    // Without a vault selector the two legs do pair.
    assert_eq!(query(&dataset, None, &[]).len(), 1);
}

#[test]
fn unknown_vault_yields_empty_not_error() {
    let dataset = Dataset::from_events(vec![
        sample_withdraw(100, "V1"),
        sample_deposit(100, "V1"),
    ]);

    assert!(query(&dataset, Some("NoSuchVault"), &[]).is_empty());
}

/// query(v, {A, B}) must be a subset of query(v, {A}) and of query(v, {B}).
#[test]
fn filter_conjunction_is_subset_of_single_filters() {
    let mut ltv_reducing_deposit = sample_deposit(200, "V1");
    ltv_reducing_deposit.market_lltv = Some(900_000_000_000_000_000.0);
    let mut same_collateral_deposit = sample_deposit(300, "V1");
    same_collateral_deposit.market_collateral_asset_symbol = "wstETH".to_string();

    let events = vec![
        sample_withdraw(100, "V1"),
        sample_deposit(100, "V1"),
        sample_withdraw(200, "V1"),
        ltv_reducing_deposit,
        sample_withdraw(300, "V1"),
        same_collateral_deposit,
    ];
    let dataset = Dataset::from_events(events);

    let diversified = query(
        &dataset,
        Some("V1"),
        &[StrategyFilter::CollateralDiversification],
    );
    let reduced = query(&dataset, Some("V1"), &[StrategyFilter::LtvReduction]);
    let both = query(
        &dataset,
        Some("V1"),
        &[
            StrategyFilter::CollateralDiversification,
            StrategyFilter::LtvReduction,
        ],
    );

    assert_eq!(diversified.len(), 2);
    assert_eq!(reduced.len(), 1);
    assert_eq!(both.len(), 1);
    for row in &both {
        assert!(diversified.contains(row));
        assert!(reduced.contains(row));
    }
}

/// An empty filter set performs no filtering at all.
#[test]
fn empty_filter_set_is_identity() {
    let mut flat_deposit = sample_deposit(200, "V1");
    flat_deposit.market_collateral_asset_symbol = "wstETH".to_string();
    flat_deposit.market_lltv = Some(800_000_000_000_000_000.0);
    flat_deposit.borrow_rate_current = Some(500_000_000.0);

    let events = vec![
        sample_withdraw(100, "V1"),
        sample_deposit(100, "V1"),
        sample_withdraw(200, "V1"),
        flat_deposit, // pair 2 satisfies none of the three heuristics
    ];
    let dataset = Dataset::from_events(events);

    assert_eq!(query(&dataset, Some("V1"), &[]).len(), 2);
}

/// A row with non-numeric assets must never appear as a pair's withdraw leg;
/// the same null on the deposit leg is harmless because only the withdraw
/// leg sources the transfer value.
#[test]
fn null_assets_excludes_withdraw_leg_only() {
    let mut broken_withdraw = sample_withdraw(100, "V1");
    broken_withdraw.assets = None;
    let dataset = Dataset::from_events(vec![broken_withdraw, sample_deposit(100, "V1")]);
    assert!(query(&dataset, None, &[]).is_empty());

    let mut broken_deposit = sample_deposit(100, "V1");
    broken_deposit.assets = None;
    let dataset = Dataset::from_events(vec![sample_withdraw(100, "V1"), broken_deposit]);
    assert_eq!(query(&dataset, None, &[]).len(), 1);
}

/// Pairs come out withdrawal-major in dataset order, deposits in dataset
/// order within each block, with no implicit resort.
#[test]
fn join_result_order_is_stable() {
    let mut first_deposit = sample_deposit(100, "V1");
    first_deposit.market_collateral_asset_symbol = "WBTC".to_string();
    let mut second_withdraw = sample_withdraw(100, "V1");
    second_withdraw.market_collateral_asset_symbol = "cbETH".to_string();

    let events = vec![
        sample_withdraw(100, "V1"),
        first_deposit,
        second_withdraw,
        sample_deposit(100, "V1"),
    ];
    let dataset = Dataset::from_events(events);

    let rows = query(&dataset, None, &[]);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].supply_asset, "wstETH");
    assert_eq!(rows[0].withdraw_asset, "WBTC");
    assert_eq!(rows[1].supply_asset, "wstETH");
    assert_eq!(rows[1].withdraw_asset, "WETH");
    assert_eq!(rows[2].supply_asset, "cbETH");
    assert_eq!(rows[2].withdraw_asset, "WBTC");
    assert_eq!(rows[3].supply_asset, "cbETH");
    assert_eq!(rows[3].withdraw_asset, "WETH");
}
