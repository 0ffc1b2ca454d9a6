//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvMarketDataAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report;
use crate::domain::disabled_rules::DisabledRules;
use crate::domain::error::BitageError;
use crate::domain::plan::{Plan, PlanId, PlanKind};
use crate::domain::plan_validation::{AccumulationDraft, AuthoringPolicy, SingleEntryDraft};
use crate::domain::rule::RuleSide;
use crate::domain::rule_parser;
use crate::domain::snapshot::PriceSnapshot;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::plan_store_port::PlanStorePort;

#[derive(Parser, Debug)]
#[command(name = "bitage", about = "Crypto investment plan tracker")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true, default_value = "bitage.ini")]
    pub config: PathBuf,
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Accumulation,
    SingleEntry,
}

impl From<KindArg> for PlanKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Accumulation => PlanKind::Accumulation,
            KindArg::SingleEntry => PlanKind::SingleEntry,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SideArg {
    Buy,
    Sell,
}

impl From<SideArg> for RuleSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Buy => RuleSide::Buy,
            SideArg::Sell => RuleSide::Sell,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AccumulationArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub ticker: String,
    /// Manually recorded all-time high
    #[arg(long, allow_hyphen_values = true)]
    pub ath: String,
    /// Date of the recorded all-time high (YYYY-MM-DD)
    #[arg(long)]
    pub ath_date: String,
    /// Buy rules: factor,amount or upper,lower,amount separated by ';'
    #[arg(long, default_value = "")]
    pub buy_rules: String,
    /// Sell rules: factor,percent separated by ';'
    #[arg(long, default_value = "")]
    pub sell_rules: String,
}

impl From<AccumulationArgs> for AccumulationDraft {
    fn from(args: AccumulationArgs) -> Self {
        AccumulationDraft {
            name: args.name,
            ticker: args.ticker,
            ath_value: args.ath,
            ath_date: args.ath_date,
            buy_rules: args.buy_rules,
            sell_rules: args.sell_rules,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SingleEntryArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub ticker: String,
    #[arg(long, allow_hyphen_values = true)]
    pub purchase_price: String,
    /// Sell rules: factor,percent separated by ';'
    #[arg(long, default_value = "")]
    pub sell_rules: String,
}

impl From<SingleEntryArgs> for SingleEntryDraft {
    fn from(args: SingleEntryArgs) -> Self {
        SingleEntryDraft {
            name: args.name,
            ticker: args.ticker,
            purchase_price: args.purchase_price,
            sell_rules: args.sell_rules,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List stored plans
    List {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Evaluate a plan against current market data
    Show {
        #[arg(value_enum)]
        kind: KindArg,
        id: PlanId,
    },
    /// Create an accumulation plan
    AddAccumulation(AccumulationArgs),
    /// Replace the fields of an accumulation plan
    EditAccumulation {
        #[arg(long)]
        id: PlanId,
        #[command(flatten)]
        plan: AccumulationArgs,
    },
    /// Create a single-entry plan
    AddSingleEntry(SingleEntryArgs),
    /// Replace the fields of a single-entry plan
    EditSingleEntry {
        #[arg(long)]
        id: PlanId,
        #[command(flatten)]
        plan: SingleEntryArgs,
    },
    /// Delete a plan
    Delete {
        #[arg(value_enum)]
        kind: KindArg,
        id: PlanId,
    },
    /// Enable or disable one sell rule of a plan
    ToggleSellRule {
        #[arg(value_enum)]
        kind: KindArg,
        id: PlanId,
        index: usize,
    },
    /// Parse a rule list and report per-rule diagnostics
    CheckRules {
        #[arg(long, value_enum)]
        side: SideArg,
        #[arg(allow_hyphen_values = true)]
        rules: String,
    },
    /// Show the price snapshot for a ticker
    Snapshot { ticker: String },
}

pub fn run(cli: Cli) -> ExitCode {
    let config_path = cli.config;
    let result = match cli.command {
        Command::List { kind } => with_store(&config_path, |_, store| {
            list_plans(store, kind.map(PlanKind::from))
        }),
        Command::Show { kind, id } => with_store(&config_path, |config, store| {
            let market = CsvMarketDataAdapter::from_config(config)?;
            show_plan(store, &market, kind.into(), id)
        }),
        Command::AddAccumulation(args) => with_store(&config_path, |config, store| {
            let policy = AuthoringPolicy::from_config(config, Local::now().date_naive());
            let id = save_accumulation(store, &args.into(), None, &policy)?;
            Ok(format!("Created accumulation plan {id}\n"))
        }),
        Command::EditAccumulation { id, plan } => with_store(&config_path, |config, store| {
            let policy = AuthoringPolicy::from_config(config, Local::now().date_naive());
            save_accumulation(store, &plan.into(), Some(id), &policy)?;
            Ok(format!("Updated accumulation plan {id}\n"))
        }),
        Command::AddSingleEntry(args) => with_store(&config_path, |_, store| {
            let id = save_single_entry(store, &args.into(), None)?;
            Ok(format!("Created single-entry plan {id}\n"))
        }),
        Command::EditSingleEntry { id, plan } => with_store(&config_path, |_, store| {
            save_single_entry(store, &plan.into(), Some(id))?;
            Ok(format!("Updated single-entry plan {id}\n"))
        }),
        Command::Delete { kind, id } => with_store(&config_path, |_, store| {
            let kind = PlanKind::from(kind);
            store.delete_plan(kind, id)?;
            info!(%kind, id, "plan deleted");
            Ok(format!("Deleted {kind} plan {id}\n"))
        }),
        Command::ToggleSellRule { kind, id, index } => with_store(&config_path, |_, store| {
            let enabled = toggle_sell_rule(store, kind.into(), id, index)?;
            let state = if enabled { "enabled" } else { "disabled" };
            Ok(format!("Sell rule {index} {state}\n"))
        }),
        Command::CheckRules { side, rules } => {
            let (report, all_valid) = check_rules(side.into(), &rules);
            print!("{report}");
            return if all_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(4)
            };
        }
        Command::Snapshot { ticker } => load_config(&config_path).and_then(|config| {
            let market = CsvMarketDataAdapter::from_config(&config)?;
            Ok(snapshot_report(&market, &ticker))
        }),
    };

    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BitageError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| BitageError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(feature = "sqlite")]
pub fn open_store(
    config: &dyn ConfigPort,
) -> Result<crate::adapters::sqlite_adapter::SqliteAdapter, BitageError> {
    let store = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(store)
}

fn with_store<F>(config_path: &Path, f: F) -> Result<String, BitageError>
where
    F: FnOnce(&FileConfigAdapter, &dyn PlanStorePort) -> Result<String, BitageError>,
{
    let config = load_config(config_path)?;

    #[cfg(feature = "sqlite")]
    {
        let sqlite = open_store(&config)?;
        let store: &dyn PlanStorePort = &sqlite;
        f(&config, store)
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (&config, f);
        Err(BitageError::Database {
            reason: "sqlite feature is required for plan storage".into(),
        })
    }
}

pub fn list_plans(
    store: &dyn PlanStorePort,
    kind: Option<PlanKind>,
) -> Result<String, BitageError> {
    let mut plans = Vec::new();
    if kind != Some(PlanKind::SingleEntry) {
        plans.extend(
            store
                .list_accumulation_plans()?
                .into_iter()
                .map(Plan::Accumulation),
        );
    }
    if kind != Some(PlanKind::Accumulation) {
        plans.extend(
            store
                .list_single_entry_plans()?
                .into_iter()
                .map(Plan::SingleEntry),
        );
    }
    Ok(text_report::render_plan_list(&plans))
}

/// Snapshot for `ticker`, with provider failures degraded to "no data".
pub fn fetch_snapshot_or_none(market: &dyn MarketDataPort, ticker: &str) -> Option<PriceSnapshot> {
    match market.fetch_snapshot(ticker) {
        Ok(Some(snapshot)) => Some(snapshot),
        Ok(None) => {
            warn!(
                ticker,
                "{}",
                BitageError::DataUnavailable {
                    ticker: ticker.to_string()
                }
            );
            None
        }
        Err(e) => {
            warn!(ticker, error = %e, "market data fetch failed");
            None
        }
    }
}

pub fn show_plan(
    store: &dyn PlanStorePort,
    market: &dyn MarketDataPort,
    kind: PlanKind,
    id: PlanId,
) -> Result<String, BitageError> {
    match store.find_plan(kind, id)? {
        Plan::Accumulation(plan) => {
            let snapshot = fetch_snapshot_or_none(market, &plan.ticker);
            let eval = plan.evaluate(snapshot.as_ref());
            Ok(text_report::render_accumulation(&plan, &eval))
        }
        Plan::SingleEntry(plan) => {
            let snapshot = fetch_snapshot_or_none(market, &plan.ticker);
            let eval = plan.evaluate(snapshot.as_ref());
            Ok(text_report::render_single_entry(&plan, &eval))
        }
    }
}

/// Create (`id == None`) or replace an accumulation plan. Editing keeps the
/// stored disabled sell-rule set.
pub fn save_accumulation(
    store: &dyn PlanStorePort,
    draft: &AccumulationDraft,
    id: Option<PlanId>,
    policy: &AuthoringPolicy,
) -> Result<PlanId, BitageError> {
    let disabled = match id {
        Some(id) => store.find_accumulation_plan(id)?.disabled_sell,
        None => DisabledRules::new(),
    };
    let plan = draft.validate(policy, id, disabled)?;
    let id = store.upsert_plan(&Plan::Accumulation(plan))?;
    info!(id, "accumulation plan saved");
    Ok(id)
}

/// Create (`id == None`) or replace a single-entry plan. Editing keeps the
/// stored disabled sell-rule set.
pub fn save_single_entry(
    store: &dyn PlanStorePort,
    draft: &SingleEntryDraft,
    id: Option<PlanId>,
) -> Result<PlanId, BitageError> {
    let disabled = match id {
        Some(id) => store.find_single_entry_plan(id)?.disabled_sell,
        None => DisabledRules::new(),
    };
    let plan = draft.validate(id, disabled)?;
    let id = store.upsert_plan(&Plan::SingleEntry(plan))?;
    info!(id, "single-entry plan saved");
    Ok(id)
}

/// Flip one sell rule and persist the plan's disabled set.
/// Returns `true` if the rule is now enabled.
pub fn toggle_sell_rule(
    store: &dyn PlanStorePort,
    kind: PlanKind,
    id: PlanId,
    index: usize,
) -> Result<bool, BitageError> {
    let mut plan = store.find_plan(kind, id)?;
    let enabled = plan.toggle_sell_rule(index)?;
    store.set_disabled_sell_indices(kind, id, plan.disabled_sell())?;
    info!(%kind, id, index, enabled, "sell rule toggled");
    Ok(enabled)
}

/// Diagnostics for a rule list and whether every token parsed.
pub fn check_rules(side: RuleSide, rules: &str) -> (String, bool) {
    let entries = rule_parser::parse(rules, side);
    let all_valid = entries.iter().all(|e| e.is_valid());
    (
        text_report::render_rule_check(rules, side, &entries),
        all_valid,
    )
}

pub fn snapshot_report(market: &dyn MarketDataPort, ticker: &str) -> String {
    let snapshot = fetch_snapshot_or_none(market, ticker);
    text_report::render_snapshot(ticker, snapshot.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_show() {
        let cli = Cli::try_parse_from(["bitage", "show", "accumulation", "3"]).unwrap();
        match cli.command {
            Command::Show { kind, id } => {
                assert_eq!(kind, KindArg::Accumulation);
                assert_eq!(id, 3);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("bitage.ini"));
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn cli_parses_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["bitage", "list", "--kind", "single-entry", "-c", "x.ini"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("x.ini"));
        assert!(matches!(
            cli.command,
            Command::List {
                kind: Some(KindArg::SingleEntry)
            }
        ));
    }

    #[test]
    fn cli_parses_edit_accumulation() {
        let cli = Cli::try_parse_from([
            "bitage",
            "edit-accumulation",
            "--id",
            "2",
            "--name",
            "BTC",
            "--ticker",
            "btc-usd",
            "--ath",
            "-5",
            "--ath-date",
            "2021-11-10",
            "--sell-rules",
            "2,50",
        ])
        .unwrap();
        match cli.command {
            Command::EditAccumulation { id, plan } => {
                assert_eq!(id, 2);
                assert_eq!(plan.ath, "-5");
                assert_eq!(plan.buy_rules, "");
                assert_eq!(plan.sell_rules, "2,50");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["bitage", "delete", "bogus", "1"]).is_err());
    }

    #[test]
    fn check_rules_reports_validity() {
        let (report, ok) = check_rules(RuleSide::Buy, "0.8,100;0.6,0.5,200");
        assert!(ok);
        assert!(report.contains("buy rules: 2"));

        let (report, ok) = check_rules(RuleSide::Sell, "2,50;oops");
        assert!(!ok);
        assert!(report.contains("[1] invalid rule: 'oops'"));
    }

    #[test]
    fn load_config_takes_plain_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bitage.ini");
        std::fs::write(&path, "[sqlite]\npath = plans.db\n").unwrap();

        let config = load_config(path.as_path()).unwrap();
        assert_eq!(config.get_string("sqlite", "path").as_deref(), Some("plans.db"));

        let err = load_config(Path::new("/nonexistent/bitage.ini")).err().unwrap();
        assert!(matches!(err, BitageError::ConfigParse { .. }));
    }
}
