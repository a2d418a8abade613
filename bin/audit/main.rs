//! Reward Audit CLI
//!
//! Cross-checks the off-chain reward ledger against the reward contract.
//! Exit code 0 means every accepted answer is consistent, 1 means at least
//! one answer needs attention, 2 means the audit could not run.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use reward_audit::storage::{create_pool, PgLedgerReader, LEDGER_SCHEMA};
use reward_audit::{
    AuditConfig, AuditError, ChainReader, ConfigOverrides, ContractChainReader, LedgerReader,
    ReconciliationEngine,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const EXIT_CLEAN: u8 = 0;
const EXIT_ATTENTION: u8 = 1;
const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(name = "reward-audit")]
#[command(about = "Reconcile the off-chain reward ledger with on-chain reward state")]
struct Cli {
    /// Path to a TOML config file (defaults to ~/.reward-audit/config.toml if present)
    #[arg(short, long, env = "REWARD_AUDIT_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the chain
    #[arg(long, env = "REWARD_AUDIT_RPC_URL")]
    rpc_url: Option<String>,

    /// Reward contract address
    #[arg(long, env = "REWARD_AUDIT_CONTRACT")]
    contract: Option<String>,

    /// Ledger database URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile every accepted answer
    Run {
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
        /// Per-answer checks in flight at once
        #[arg(long)]
        concurrency: Option<usize>,
        /// Bound on the whole batch, in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Reconcile a single answer
    Check {
        answer_id: String,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show the contract-derived key for an answer and whether it was rewarded
    Key { answer_id: String },
    /// Print the effective configuration
    Config {
        /// Print the expected ledger schema instead
        #[arg(long)]
        schema: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reward_audit=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    ExitCode::from(run(cli).await.unwrap_or_else(|e| fatal(&e)))
}

fn fatal(err: &anyhow::Error) -> u8 {
    eprintln!("error: {:#}", err);
    EXIT_FATAL
}

async fn run(cli: Cli) -> Result<u8> {
    let (concurrency, batch_timeout_secs) = match &cli.command {
        Commands::Run {
            concurrency,
            timeout,
            ..
        } => (*concurrency, *timeout),
        _ => (None, None),
    };

    let config = AuditConfig::load_or_default(cli.config.as_deref())?.with_overrides(
        ConfigOverrides {
            rpc_url: cli.rpc_url,
            contract_address: cli.contract,
            database_url: cli.database_url,
            concurrency,
            batch_timeout_secs,
        },
    );

    match cli.command {
        Commands::Config { schema } => {
            if schema {
                println!("{}", LEDGER_SCHEMA);
            } else {
                println!("{:#?}", config);
            }
            Ok(EXIT_CLEAN)
        }
        Commands::Key { answer_id } => {
            config.validate()?;
            let chain = connect_chain(&config).await?;
            let key = chain
                .derive_on_chain_key(&answer_id)
                .await
                .with_context(|| format!("Failed to derive key for answer {}", answer_id))?;
            let rewarded = chain
                .is_rewarded(&key)
                .await
                .with_context(|| format!("Failed to read reward state of {}", key))?;
            println!("answer:   {}", answer_id);
            println!("key:      {}", key);
            println!("rewarded: {}", rewarded);
            Ok(EXIT_CLEAN)
        }
        Commands::Check { answer_id, format } => {
            config.validate()?;
            let engine = build_engine(&config).await?;
            let record = engine.reconcile_one(&answer_id).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
                OutputFormat::Table => {
                    println!(
                        "{}",
                        reward_audit::reconcile::report::records_table(std::slice::from_ref(
                            &record
                        ))
                    )
                }
            }
            Ok(exit_code(!record.needs_attention()))
        }
        Commands::Run { format, .. } => {
            config.validate()?;
            let engine = build_engine(&config).await?;
            let report = engine.run().await?;
            match format {
                OutputFormat::Json => println!("{}", report.to_json()?),
                OutputFormat::Table => println!("{}", report.render_table()),
            }
            Ok(exit_code(report.is_clean()))
        }
    }
}

fn exit_code(clean: bool) -> u8 {
    if clean {
        EXIT_CLEAN
    } else {
        EXIT_ATTENTION
    }
}

async fn connect_chain(config: &AuditConfig) -> Result<ContractChainReader> {
    let chain = ContractChainReader::from_config(&config.chain)?;
    if let Some(expected) = config.chain.expected_chain_id {
        chain.verify_chain_id(expected).await?;
    }
    info!(
        "Reward contract {} via {}",
        chain.contract_address(),
        config.chain.redacted_rpc_url()
    );
    Ok(chain)
}

async fn build_engine(
    config: &AuditConfig,
) -> Result<ReconciliationEngine<ContractChainReader, PgLedgerReader>> {
    let pool = create_pool(&config.database).map_err(AuditError::from)?;
    let ledger = PgLedgerReader::new(pool);
    ledger.ping().await.map_err(AuditError::from)?;

    let chain = connect_chain(config).await?;
    Ok(ReconciliationEngine::new(
        chain,
        ledger,
        config.reconcile.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run_overrides() {
        let cli = Cli::try_parse_from([
            "reward-audit",
            "--contract",
            "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "run",
            "--format",
            "json",
            "--concurrency",
            "4",
        ])
        .unwrap();
        assert!(cli.contract.is_some());
        match cli.command {
            Commands::Run {
                format, concurrency, ..
            } => {
                assert!(matches!(format, OutputFormat::Json));
                assert_eq!(concurrency, Some(4));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(true), 0);
        assert_eq!(exit_code(false), 1);
        assert_eq!(fatal(&anyhow::anyhow!("ledger down")), 2);
    }

    #[tokio::test]
    async fn test_malformed_database_url_is_store_unavailable() {
        let mut config = AuditConfig::default();
        config.database.url = Some("postgres://audit@db:notaport/rewards".to_string());
        let err = match build_engine(&config).await {
            Ok(_) => panic!("engine built from a malformed database url"),
            Err(e) => e,
        };
        assert!(matches!(
            err.downcast_ref::<AuditError>(),
            Some(AuditError::StoreUnavailable(_))
        ));
    }
}
