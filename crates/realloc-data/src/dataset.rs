//! CSV ingestion and normalization for the reallocation dataset.
//!
//! The export quotes thousands-separated fixed-point values (e.g.
//! `"860,000,000,000,000,000"` for a market LLTV), so records are parsed with
//! a real CSV reader rather than split on commas.
//!
//! Load policy: structural problems (unreadable file, absent required column)
//! fail the whole load; per-cell coercion failures set the field to `None`
//! and keep the row.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use thiserror::Error;
use tracing::{debug, info};

use crate::types::{EventKind, ReallocationEvent};

const COL_TYPE: &str = "type";
const COL_BLOCK_NUMBER: &str = "blockNumber";
const COL_VAULT_NAME: &str = "vault.name";
const COL_VAULT_ASSET_SYMBOL: &str = "vault.asset.symbol";
const COL_VAULT_ASSET_DECIMALS: &str = "vault.asset.decimals";
const COL_ASSETS: &str = "assets";
const COL_COLLATERAL_SYMBOL: &str = "market.collateralAsset.symbol";
const COL_LLTV: &str = "market.lltv";
const COL_RATE_CURRENT: &str = "borrow rate (t)";
const COL_RATE_PREVIOUS: &str = "borrow rate (t-1)";
const COL_HASH: &str = "hash";

/// Errors raised while loading the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file could not be read.
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV stream itself is malformed.
    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("required column '{0}' not found in dataset header")]
    MissingColumn(&'static str),
}

/// Resolved header indices for the required columns.
struct Columns {
    kind: usize,
    block_number: usize,
    vault_name: usize,
    vault_asset_symbol: usize,
    vault_asset_decimals: usize,
    assets: usize,
    collateral_symbol: usize,
    lltv: usize,
    rate_current: usize,
    rate_previous: usize,
    hash: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, DatasetError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or(DatasetError::MissingColumn(name))
        };

        Ok(Self {
            kind: find(COL_TYPE)?,
            block_number: find(COL_BLOCK_NUMBER)?,
            vault_name: find(COL_VAULT_NAME)?,
            vault_asset_symbol: find(COL_VAULT_ASSET_SYMBOL)?,
            vault_asset_decimals: find(COL_VAULT_ASSET_DECIMALS)?,
            assets: find(COL_ASSETS)?,
            collateral_symbol: find(COL_COLLATERAL_SYMBOL)?,
            lltv: find(COL_LLTV)?,
            rate_current: find(COL_RATE_CURRENT)?,
            rate_previous: find(COL_RATE_PREVIOUS)?,
            hash: find(COL_HASH)?,
        })
    }

    fn event_from_record(&self, record: &StringRecord) -> ReallocationEvent {
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        ReallocationEvent {
            kind: EventKind::parse(cell(self.kind)),
            block_number: parse_u64(cell(self.block_number)),
            vault_name: cell(self.vault_name).trim().to_string(),
            vault_asset_symbol: cell(self.vault_asset_symbol).trim().to_string(),
            vault_asset_decimals: parse_u32(cell(self.vault_asset_decimals)),
            assets: parse_f64(cell(self.assets)),
            market_collateral_asset_symbol: cell(self.collateral_symbol).trim().to_string(),
            market_lltv: parse_lltv(cell(self.lltv)),
            borrow_rate_current: parse_f64(cell(self.rate_current)),
            borrow_rate_previous: parse_f64(cell(self.rate_previous)),
            tx_hash: cell(self.hash).trim().to_string(),
        }
    }
}

fn parse_f64(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

fn parse_u64(cell: &str) -> Option<u64> {
    cell.trim().parse().ok()
}

fn parse_u32(cell: &str) -> Option<u32> {
    cell.trim().parse().ok()
}

/// The LLTV column carries thousands separators; strip them before parsing.
fn parse_lltv(cell: &str) -> Option<f64> {
    let cleaned: String = cell.chars().filter(|c| *c != ',').collect();
    parse_f64(&cleaned)
}

fn has_null_field(event: &ReallocationEvent) -> bool {
    event.kind.is_none()
        || event.block_number.is_none()
        || event.vault_asset_decimals.is_none()
        || event.assets.is_none()
        || event.market_lltv.is_none()
        || event.borrow_rate_current.is_none()
        || event.borrow_rate_previous.is_none()
}

/// Immutable in-memory reallocation table.
///
/// Loaded once at startup and read-only afterwards; there is no mutating
/// API. Hosts that need hot reload construct a fresh `Dataset` and swap the
/// handle (e.g. behind an `Arc`) instead of mutating in place.
#[derive(Clone, Debug)]
pub struct Dataset {
    events: Vec<ReallocationEvent>,
}

/// Aggregate statistics over a loaded dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetSummary {
    /// Total rows loaded.
    pub rows: usize,
    /// Rows of Deposit kind.
    pub deposits: usize,
    /// Rows of Withdraw kind.
    pub withdrawals: usize,
    /// Distinct vault names.
    pub vaults: usize,
    /// Min and max block number across rows that have one.
    pub block_range: Option<(u64, u64)>,
}

impl Dataset {
    /// Loads and normalizes the CSV export at `path`.
    ///
    /// # Errors
    /// Returns [`DatasetError`] if the file cannot be read, the CSV stream is
    /// malformed, or a required column is missing from the header.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            rows = dataset.events.len(),
            "reallocation dataset loaded"
        );
        Ok(dataset)
    }

    /// Loads and normalizes CSV content from any reader.
    ///
    /// # Errors
    /// Same contract as [`Dataset::from_csv_path`].
    pub fn from_reader(reader: impl Read) -> Result<Self, DatasetError> {
        // flexible: a row with too few fields coerces to nulls instead of
        // aborting the load.
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns = Columns::resolve(csv_reader.headers()?)?;

        let mut events = Vec::new();
        let mut rows_with_nulls = 0usize;
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            let event = columns.event_from_record(&record);
            if has_null_field(&event) {
                rows_with_nulls += 1;
                debug!(row, "row kept with null fields after coercion");
            }
            events.push(event);
        }

        if rows_with_nulls > 0 {
            info!(
                rows = events.len(),
                rows_with_nulls, "some rows failed numeric coercion and carry nulls"
            );
        }

        Ok(Self { events })
    }

    /// Builds a dataset directly from rows. Used by embedding hosts and
    /// tests that bypass the CSV layer.
    pub fn from_events(events: Vec<ReallocationEvent>) -> Self {
        Self { events }
    }

    /// Read-only view of the loaded rows.
    pub fn events(&self) -> &[ReallocationEvent] {
        &self.events
    }

    /// Distinct vault names in first-seen order. Stable within a load, so a
    /// selector populated from it keeps its ordering for the session.
    pub fn vault_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.events
            .iter()
            .map(|event| event.vault_name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Counts and block range for the `status` surface.
    pub fn summary(&self) -> DatasetSummary {
        let deposits = self
            .events
            .iter()
            .filter(|event| event.kind == Some(EventKind::Deposit))
            .count();
        let withdrawals = self
            .events
            .iter()
            .filter(|event| event.kind == Some(EventKind::Withdraw))
            .count();

        let mut block_range: Option<(u64, u64)> = None;
        for block in self.events.iter().filter_map(|event| event.block_number) {
            block_range = Some(match block_range {
                Some((min, max)) => (min.min(block), max.max(block)),
                None => (block, block),
            });
        }

        DatasetSummary {
            rows: self.events.len(),
            deposits,
            withdrawals,
            vaults: self.vault_names().len(),
            block_range,
        }
    }
}
