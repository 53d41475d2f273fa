use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use settleup_engine::{
    Currency, EngineConfig, EngineError, Expense, MatchingStrategy, SettlementEngine,
};

#[derive(Parser, Debug)]
#[command(name = "settleup")]
#[command(about = "Settle a group's shared expenses: expenses as JSON in, balances and payments as JSON out")]
struct Cli {
    /// Group currency (overrides `SETTLEUP_CURRENCY`).
    #[arg(long)]
    currency: Option<Currency>,

    /// `sequential` or `resorting` (overrides `SETTLEUP_MATCHING`).
    #[arg(long)]
    matching: Option<MatchingStrategy>,

    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,

    /// JSON file with an array of expenses; stdin when omitted.
    input: Option<PathBuf>,
}

fn main() -> ExitCode {
    settleup_observability::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            // Internal faults get their own status so hosts can tell them apart.
            let fatal = e
                .downcast_ref::<EngineError>()
                .is_some_and(EngineError::is_fatal);
            if fatal { ExitCode::from(2) } else { ExitCode::FAILURE }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = EngineConfig::from_env();
    if let Some(currency) = cli.currency {
        config = config.with_currency(currency);
    }
    if let Some(matching) = cli.matching {
        config = config.with_matching(matching);
    }

    let raw = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    let expenses: Vec<Expense> =
        serde_json::from_str(&raw).context("input is not a JSON array of expenses")?;
    tracing::info!(expenses = expenses.len(), "expenses loaded");

    let report = SettlementEngine::new(config).run(&expenses)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if cli.pretty {
        serde_json::to_writer_pretty(&mut out, &report)?;
    } else {
        serde_json::to_writer(&mut out, &report)?;
    }
    writeln!(out)?;
    Ok(())
}
