use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use realloc_analysis::classify::StrategyFilter;
use realloc_analysis::query::{query, RenderRow};
use realloc_data::dataset::Dataset;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "realloc-explorer")]
#[command(about = "Vault reallocation pair explorer for lending markets")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Path to the reallocation CSV export.
    #[arg(long, global = true, default_value = "data/reallocations.csv")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Join withdraw/deposit legs into pairs and render the strategy table.
    Pairs(PairsArgs),
    /// List distinct vault names present in the dataset.
    Vaults(VaultsArgs),
    /// Show dataset summary statistics.
    Status(StatusArgs),
}

#[derive(Args, Debug)]
struct PairsArgs {
    /// Restrict to one vault (exact, case-sensitive match).
    #[arg(long)]
    vault: Option<String>,

    /// Strategy filter key, repeatable; filters are ANDed. Known keys:
    /// collateral_diversification, yield_chasing, ltv_reduction.
    #[arg(long = "filter")]
    filters: Vec<String>,

    #[arg(long, default_value = "table")]
    output: String,
}

#[derive(Args, Debug)]
struct VaultsArgs {}

#[derive(Args, Debug)]
struct StatusArgs {}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    let dataset = Dataset::from_csv_path(&cli.data)
        .wrap_err_with(|| format!("failed to load dataset from {}", cli.data.display()))?;

    match cli.command {
        Commands::Pairs(args) => handle_pairs(&dataset, args),
        Commands::Vaults(args) => handle_vaults(&dataset, args),
        Commands::Status(args) => handle_status(&dataset, &cli.data, args),
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("failed to initialize tracing filter")?;

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Maps wire keys to strategy filters, skipping unknown keys with a warning
/// and dropping duplicates (filters are conjunctive, repeats are no-ops).
fn parse_filters(keys: &[String]) -> Vec<StrategyFilter> {
    let mut filters = Vec::new();
    let mut seen = HashSet::new();
    for key in keys {
        match StrategyFilter::from_key(key) {
            Some(filter) => {
                if seen.insert(filter) {
                    filters.push(filter);
                }
            }
            None => warn!(key = %key, "ignoring unknown strategy filter"),
        }
    }
    filters
}

fn handle_pairs(dataset: &Dataset, args: PairsArgs) -> Result<()> {
    let filters = parse_filters(&args.filters);
    let rows = query(dataset, args.vault.as_deref(), &filters);

    match args.output.to_lowercase().as_str() {
        "table" => print_pairs_table(&rows),
        "json" => print_pairs_json(&rows)?,
        "csv" => print_pairs_csv(&rows),
        _ => {
            return Err(eyre!(
                "unknown output format '{}'; use 'table', 'json', or 'csv'",
                args.output
            ))
        }
    }

    info!(
        vault = args.vault.as_deref().unwrap_or("<all>"),
        filters = filters.len(),
        pairs = rows.len(),
        "pairs command completed"
    );

    Ok(())
}

fn print_pairs_table(rows: &[RenderRow]) {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec![
        "Block Number",
        "Transfer Value",
        "Vault Token",
        "Supply LTV",
        "Supply Asset",
        "Withdraw LTV",
        "Withdraw Asset",
        "Rate (%) - supplied",
        "Rate (%) - withdrawn",
        "Rates Delta (%pts)",
        "Collateral Diversification",
        "Yield Chasing",
        "LTV Reduction",
        "Tx Hash",
    ]);

    for row in rows {
        table.add_row(vec![
            row.block_number.to_string(),
            format!("{:.0}", row.assets_value),
            row.vault_token.clone(),
            format!("{:.2}", row.supply_ltv),
            row.supply_asset.clone(),
            format!("{:.2}", row.withdraw_ltv),
            row.withdraw_asset.clone(),
            format!("{:.2}", row.supply_rate),
            format!("{:.2}", row.withdraw_rate),
            format!("{:.2}", row.rates_difference),
            row.collateral_diversification.to_string(),
            row.yield_chasing.to_string(),
            row.ltv_reduction.to_string(),
            row.tx_hash_display.clone(),
        ]);
    }

    println!("\n{table}\n");

    // Strategy counts over the filtered result set.
    let mut summary = Table::new();
    summary.load_preset(UTF8_BORDERS_ONLY);
    summary.set_header(vec!["Metric", "Value"]);
    summary.add_row(vec!["Pairs", &format!("{}", rows.len())]);
    summary.add_row(vec![
        "Collateral Diversification",
        &format!(
            "{}",
            rows.iter().filter(|r| r.collateral_diversification).count()
        ),
    ]);
    summary.add_row(vec![
        "Yield Chasing",
        &format!("{}", rows.iter().filter(|r| r.yield_chasing).count()),
    ]);
    summary.add_row(vec![
        "LTV Reduction",
        &format!("{}", rows.iter().filter(|r| r.ltv_reduction).count()),
    ]);

    println!("{summary}\n");
}

fn print_pairs_json(rows: &[RenderRow]) -> Result<()> {
    let json_str = serde_json::to_string_pretty(rows).wrap_err("failed to serialize JSON")?;
    println!("{json_str}");
    Ok(())
}

fn print_pairs_csv(rows: &[RenderRow]) {
    println!(
        "blockNumber,assetsValue,collateralAsset.symbol,supplyLTV,supplyAsset,withdrawLTV,withdrawAsset,supplyRate,withdrawRate,ratesDifference,collateralDiversification,yieldChasing,ltvReduction,txHashDisplay"
    );

    for row in rows {
        println!(
            "{},{:.0},{},{:.2},{},{:.2},{},{:.2},{:.2},{:.2},{},{},{},{}",
            row.block_number,
            row.assets_value,
            row.vault_token,
            row.supply_ltv,
            row.supply_asset,
            row.withdraw_ltv,
            row.withdraw_asset,
            row.supply_rate,
            row.withdraw_rate,
            row.rates_difference,
            row.collateral_diversification,
            row.yield_chasing,
            row.ltv_reduction,
            row.tx_hash_display,
        );
    }
}

fn handle_vaults(dataset: &Dataset, _args: VaultsArgs) -> Result<()> {
    let names = dataset.vault_names();

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Vault", "Events"]);

    for name in &names {
        let count = dataset
            .events()
            .iter()
            .filter(|event| event.vault_name == *name)
            .count();
        table.add_row(vec![name.to_string(), count.to_string()]);
    }

    println!("\n{table}\n");

    info!(vaults = names.len(), "vaults command completed");
    Ok(())
}

fn handle_status(dataset: &Dataset, data_path: &Path, _args: StatusArgs) -> Result<()> {
    let summary = dataset.summary();

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Metric", "Value"]);

    table.add_row(vec!["Dataset Path", &data_path.display().to_string()]);
    table.add_row(vec!["Rows", &format!("{}", summary.rows)]);
    table.add_row(vec!["Deposits", &format!("{}", summary.deposits)]);
    table.add_row(vec!["Withdrawals", &format!("{}", summary.withdrawals)]);
    table.add_row(vec!["Vaults", &format!("{}", summary.vaults)]);

    match summary.block_range {
        Some((min, max)) => {
            table.add_row(vec!["Block Range", &format!("{min} - {max}")]);
        }
        None => {
            table.add_row(vec!["Block Range", "No numbered blocks in dataset"]);
        }
    }

    println!("\n{table}\n");

    info!(
        rows = summary.rows,
        deposits = summary.deposits,
        withdrawals = summary.withdrawals,
        vaults = summary.vaults,
        "status command completed"
    );

    Ok(())
}
