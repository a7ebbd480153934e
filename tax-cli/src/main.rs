use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use tax_cli::app::{self, Circumstances, TaxApp};
use tax_cli::{logging, report, utils};
use tax_core::StoreConfig;
use tax_core::calculations::ReliefClaim;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Malaysian personal income tax estimator.
///
/// Registers taxpayers, computes relief and tax payable for a year of
/// assessment, and keeps one record per taxpayer in the configured store.
#[derive(Debug, Parser)]
#[command(name = "tax-estimator", version)]
struct Cli {
    /// Record store backend: csv, sqlite or memory.
    /// Inferred from the store file's extension when omitted.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Store file (e.g. `tax_records.csv`, `tax_records.db`), or `:memory:`
    /// with `--backend sqlite`.
    #[arg(long, global = true, default_value = "tax_records.csv")]
    store: String,

    /// Bracket schedule CSV. Defaults to the built-in YA2024 schedule.
    #[arg(long, global = true)]
    brackets: Option<PathBuf>,

    /// Relief limits CSV. Defaults to the built-in YA2024 limits.
    #[arg(long, global = true)]
    reliefs: Option<PathBuf>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a new taxpayer.
    Register {
        #[arg(long)]
        user_id: String,

        /// 12-digit IC number.
        #[arg(long)]
        ic: String,

        /// Last 4 digits of the IC number.
        #[arg(long)]
        password: String,
    },

    /// Compute relief and tax payable, then save the result.
    Calculate {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        password: String,

        /// Annual income in RM; thousands separators are accepted.
        #[arg(long)]
        income: String,

        /// Claim the disabled-individual relief.
        #[arg(long)]
        disabled: bool,

        /// Claim the relief for a spouse with no income.
        #[arg(long)]
        spouse_not_working: bool,

        /// Claim the disabled-spouse relief.
        #[arg(long)]
        spouse_disabled: bool,

        /// Additional relief as CATEGORY=VALUE; repeatable.
        /// Per-child categories take a count, the rest an amount in RM.
        #[arg(long = "relief", value_name = "CATEGORY=VALUE", value_parser = utils::parse_relief_arg)]
        reliefs: Vec<ReliefClaim>,
    },

    /// Show one taxpayer's stored record.
    Show {
        #[arg(long)]
        user_id: String,
    },

    /// List every stored record.
    List,

    /// Print the relief limits in effect.
    Categories,

    /// Print the bracket schedule in effect.
    Brackets,
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_file.as_deref())?;

    let config = tax_data::load_tax_year(cli.brackets.as_deref(), cli.reliefs.as_deref())
        .context("failed to load tax-year tables")?;

    match cli.command {
        Command::Categories => {
            print!("{}", report::relief_table(config.relief_limits()));
            return Ok(());
        }
        Command::Brackets => {
            print!("{}", report::bracket_table(config.schedule()));
            return Ok(());
        }
        _ => {}
    }

    let store_config = StoreConfig {
        backend: cli.backend,
        location: cli.store,
    };
    let store = app::build_registry()
        .open(&store_config)
        .await
        .with_context(|| format!("failed to open {store_config}"))?;
    let app = TaxApp::new(store, config);

    match cli.command {
        Command::Register {
            user_id,
            ic,
            password,
        } => {
            let record = app.register(&user_id, &ic, &password).await?;
            println!("Registration successful! User ID: {}", record.user_id);
        }
        Command::Calculate {
            user_id,
            password,
            income,
            disabled,
            spouse_not_working,
            spouse_disabled,
            reliefs,
        } => {
            let mut claims = app.automatic_claims(Circumstances {
                disabled,
                spouse_not_working,
                spouse_disabled,
            });
            claims.extend(reliefs);

            let calculation = app.calculate(&user_id, &password, &income, &claims).await?;
            print!("{}", report::relief_summary(&calculation.assessment.breakdown));
            println!();
            print!("{}", report::tax_summary(&calculation.assessment));
            println!("Tax record saved for {}.", calculation.record.user_id);
        }
        Command::Show { user_id } => {
            let record = app.record(&user_id).await?;
            print!("{}", report::record_details(&record));
        }
        Command::List => {
            let records = app.records().await?;
            print!("{}", report::records_listing(&records));
        }
        Command::Categories | Command::Brackets => {}
    }

    Ok(())
}
