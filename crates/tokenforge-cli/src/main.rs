//! TokenForge CLI
//!
//! Operator interface for a file-backed TokenForge ledger. Every command
//! loads the saved snapshot, applies one operation and saves it back.

mod config;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use config::{CliConfig, LoggingConfig};
use serde::Serialize;
use std::path::PathBuf;
use tokenforge_ledger::prelude::*;
use tokenforge_ledger::{FileStore, TokenMetadata};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "tokenforge")]
#[command(author = "TokenForge Contributors")]
#[command(version = "0.1.0")]
#[command(
    about = "TokenForge - role-gated, pausable, supply-capped token ledger",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "tokenforge.toml")]
    config: PathBuf,

    /// Ledger state file (overrides [storage].state_path)
    #[arg(short, long, global = true, env = "TOKENFORGE_STATE")]
    state: Option<PathBuf>,

    /// Acting principal: 0x-prefixed address, or a label hashed into one
    #[arg(long, global = true, env = "TOKENFORGE_CALLER")]
    caller: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new ledger owned by the caller
    Deploy {
        /// Replace an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Show token metadata and supply
    Info,

    /// Show an account balance
    Balance { account: String },

    /// Show how much `spender` may move out of `owner`'s account
    Allowance { owner: String, spender: String },

    /// Transfer tokens from the caller
    Transfer { to: String, amount: String },

    /// Approve a spender ("unlimited" for an uncapped allowance)
    Approve { spender: String, amount: String },

    /// Transfer on behalf of `from` using the caller's allowance
    TransferFrom { from: String, to: String, amount: String },

    /// Mint new tokens (MINTER)
    Mint {
        to: String,
        amount: String,
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Burn the caller's tokens
    Burn {
        amount: String,
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Burn another account's tokens (BURNER)
    BurnFrom {
        from: String,
        amount: String,
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Halt transfers (PAUSER)
    Pause {
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Resume transfers (PAUSER)
    Unpause,

    /// Grant a role (ADMIN)
    GrantRole { role: String, account: String },

    /// Revoke a role (ADMIN)
    RevokeRole { role: String, account: String },

    /// Give up one of the caller's roles
    RenounceRole {
        role: String,
        /// Must name the caller; defaults to it
        #[arg(long)]
        confirm: Option<String>,
    },

    /// List role members, or the roles of one account
    Roles { account: Option<String> },

    /// Show the event log
    Events {
        /// First sequence number to show
        #[arg(long, default_value = "0")]
        since: u64,

        /// Only events involving this account
        #[arg(long)]
        account: Option<String>,
    },
}

fn init_logging(verbose: bool, logging: &LoggingConfig) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Parse a principal from `0x` hex, or derive one from a label
fn resolve_principal(text: &str) -> anyhow::Result<Principal> {
    let text = text.trim();
    if text.starts_with("0x") || text.starts_with("0X") {
        return Principal::from_hex(text).with_context(|| format!("invalid address {text}"));
    }
    if text.is_empty() {
        bail!("empty principal");
    }
    Ok(Principal::from_public_key(text.as_bytes()))
}

fn parse_amount(text: &str, decimals: u8) -> anyhow::Result<Amount> {
    parse_units(text, decimals).with_context(|| format!("invalid amount {text:?}"))
}

fn parse_role(text: &str) -> anyhow::Result<Role> {
    text.parse::<Role>().map_err(anyhow::Error::msg)
}

/// `info --json` output
#[derive(Serialize)]
struct Summary<'a> {
    metadata: &'a TokenMetadata,
    total_supply: Amount,
    remaining_supply: Amount,
    paused: bool,
    pause_reason: Option<String>,
    events: usize,
}

struct Session {
    config: CliConfig,
    store: FileStore,
    caller: Option<Principal>,
    json: bool,
}

impl Session {
    fn caller(&self) -> anyhow::Result<Principal> {
        self.caller.context("this command needs --caller")
    }

    fn open(&self) -> anyhow::Result<TokenForge> {
        let snapshot = self.store.load()?.with_context(|| {
            format!(
                "no ledger at {} (run `tokenforge deploy` first)",
                self.store.path().display()
            )
        })?;
        Ok(TokenForge::from_snapshot(snapshot)?)
    }

    fn save(&self, token: &TokenForge) -> anyhow::Result<()> {
        self.store.save(&token.snapshot())?;
        Ok(())
    }

    /// Run a mutating operation and persist the result
    fn apply<F>(&self, op: F) -> anyhow::Result<()>
    where
        F: FnOnce(&TokenForge, Principal) -> anyhow::Result<Receipt>,
    {
        let caller = self.caller()?;
        let token = self.open()?;
        let receipt = op(&token, caller)?;
        self.save(&token)?;
        self.print_records(&receipt.events, token.decimals())
    }

    fn print_records(&self, records: &[EventRecord], decimals: u8) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(records)?);
            return Ok(());
        }
        if records.is_empty() {
            println!("No change");
        }
        for record in records {
            println!("#{:<6} {}", record.sequence, describe(&record.event, decimals));
        }
        Ok(())
    }

    fn print_amount(&self, label: &str, amount: Amount, token: &TokenForge) -> anyhow::Result<()> {
        if self.json {
            println!(
                "{}",
                serde_json::json!({
                    label: amount.to_string(),
                    "formatted": format_units(amount, token.decimals()),
                })
            );
        } else {
            println!("{} {}", format_units(amount, token.decimals()), token.symbol());
        }
        Ok(())
    }
}

/// Human-readable event line with amounts in display units
fn describe(event: &LedgerEvent, decimals: u8) -> String {
    let units = |v: Amount| format_units(v, decimals);
    match event {
        LedgerEvent::Transfer { from, to, value } => {
            format!("Transfer      {from} -> {to}  {}", units(*value))
        }
        LedgerEvent::Approval { owner, spender, value } => {
            let value = if *value == UNLIMITED_ALLOWANCE {
                "unlimited".to_string()
            } else {
                units(*value)
            };
            format!("Approval      {owner} -> {spender}  {value}")
        }
        LedgerEvent::TokensMinted { to, amount, reason } => {
            format!("TokensMinted  {to}  {}  ({reason})", units(*amount))
        }
        LedgerEvent::TokensBurned { from, amount, reason } => {
            format!("TokensBurned  {from}  {}  ({reason})", units(*amount))
        }
        other => other.to_string(),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(&cli.config)?;
    init_logging(cli.verbose, &config.logging);

    let state_path = cli
        .state
        .clone()
        .unwrap_or_else(|| config.storage.state_path.clone());
    let caller = cli.caller.as_deref().map(resolve_principal).transpose()?;
    let session = Session {
        store: FileStore::new(state_path),
        config,
        caller,
        json: cli.json,
    };

    run(&session, cli.command)
}

fn run(session: &Session, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Deploy { force } => {
            let owner = session.caller()?;
            if session.store.exists() && !force {
                bail!(
                    "ledger already exists at {} (use --force to replace it)",
                    session.store.path().display()
                );
            }
            let token = TokenForge::with_config(owner, session.config.token.clone())?;
            session.save(&token)?;

            tracing::info!(path = %session.store.path().display(), "ledger deployed");
            println!("Deployed {} ({})", token.name(), token.symbol());
            println!("Owner: {owner}");
            println!("State: {}", session.store.path().display());
            session.print_records(&token.events(), token.decimals())?;
        }

        Commands::Info => {
            let token = session.open()?;
            let metadata = token.metadata();
            let decimals = token.decimals();
            let deployed = chrono::DateTime::<chrono::Utc>::from_timestamp(metadata.deployed_at, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| metadata.deployed_at.to_string());

            if session.json {
                let summary = Summary {
                    metadata,
                    total_supply: token.total_supply(),
                    remaining_supply: token.remaining_supply(),
                    paused: token.paused(),
                    pause_reason: token.pause_reason(),
                    events: token.event_count(),
                };
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("Name:             {}", token.name());
            println!("Symbol:           {}", token.symbol());
            println!("Decimals:         {decimals}");
            println!("Owner:            {}", metadata.owner);
            println!("Deployed:         {deployed}");
            println!("Total supply:     {}", format_units(token.total_supply(), decimals));
            println!("Max supply:       {}", format_units(token.max_supply(), decimals));
            println!("Remaining supply: {}", format_units(token.remaining_supply(), decimals));
            match token.pause_reason().filter(|_| token.paused()) {
                Some(reason) => println!("Paused:           yes ({reason})"),
                None => println!("Paused:           no"),
            }
            println!("Events:           {}", token.event_count());
        }

        Commands::Balance { account } => {
            let token = session.open()?;
            let account = resolve_principal(&account)?;
            session.print_amount("balance", token.balance_of(&account), &token)?;
        }

        Commands::Allowance { owner, spender } => {
            let token = session.open()?;
            let owner = resolve_principal(&owner)?;
            let spender = resolve_principal(&spender)?;
            let allowance = token.allowance(&owner, &spender);
            if allowance == UNLIMITED_ALLOWANCE && !session.json {
                println!("unlimited");
            } else {
                session.print_amount("allowance", allowance, &token)?;
            }
        }

        Commands::Transfer { to, amount } => {
            let to = resolve_principal(&to)?;
            session.apply(|token, caller| {
                let amount = parse_amount(&amount, token.decimals())?;
                Ok(token.transfer(caller, to, amount)?)
            })?;
        }

        Commands::Approve { spender, amount } => {
            let spender = resolve_principal(&spender)?;
            session.apply(|token, caller| {
                let amount = if amount.eq_ignore_ascii_case("unlimited") {
                    UNLIMITED_ALLOWANCE
                } else {
                    parse_amount(&amount, token.decimals())?
                };
                Ok(token.approve(caller, spender, amount)?)
            })?;
        }

        Commands::TransferFrom { from, to, amount } => {
            let from = resolve_principal(&from)?;
            let to = resolve_principal(&to)?;
            session.apply(|token, caller| {
                let amount = parse_amount(&amount, token.decimals())?;
                Ok(token.transfer_from(caller, from, to, amount)?)
            })?;
        }

        Commands::Mint { to, amount, reason } => {
            let to = resolve_principal(&to)?;
            session.apply(|token, caller| {
                let amount = parse_amount(&amount, token.decimals())?;
                Ok(token.mint(caller, to, amount, reason.as_deref())?)
            })?;
        }

        Commands::Burn { amount, reason } => {
            session.apply(|token, caller| {
                let amount = parse_amount(&amount, token.decimals())?;
                Ok(token.burn(caller, amount, reason.as_deref())?)
            })?;
        }

        Commands::BurnFrom { from, amount, reason } => {
            let from = resolve_principal(&from)?;
            session.apply(|token, caller| {
                let amount = parse_amount(&amount, token.decimals())?;
                Ok(token.burn_from(caller, from, amount, reason.as_deref())?)
            })?;
        }

        Commands::Pause { reason } => {
            session.apply(|token, caller| Ok(token.pause(caller, reason.as_deref())?))?;
        }

        Commands::Unpause => {
            session.apply(|token, caller| Ok(token.unpause(caller)?))?;
        }

        Commands::GrantRole { role, account } => {
            let role = parse_role(&role)?;
            let account = resolve_principal(&account)?;
            session.apply(|token, caller| Ok(token.grant_role(caller, role, account)?))?;
        }

        Commands::RevokeRole { role, account } => {
            let role = parse_role(&role)?;
            let account = resolve_principal(&account)?;
            session.apply(|token, caller| Ok(token.revoke_role(caller, role, account)?))?;
        }

        Commands::RenounceRole { role, confirm } => {
            let role = parse_role(&role)?;
            let confirm = confirm.as_deref().map(resolve_principal).transpose()?;
            session.apply(|token, caller| {
                Ok(token.renounce_role(caller, role, confirm.unwrap_or(caller))?)
            })?;
        }

        Commands::Roles { account } => {
            let token = session.open()?;
            if let Some(account) = account {
                let account = resolve_principal(&account)?;
                let roles = token.roles_of(&account);
                if session.json {
                    let names: Vec<_> = roles.iter().map(Role::name).collect();
                    println!("{}", serde_json::to_string_pretty(&names)?);
                } else if roles.is_empty() {
                    println!("{account} holds no roles");
                } else {
                    for role in roles {
                        println!("{role}");
                    }
                }
                return Ok(());
            }

            if session.json {
                let table: serde_json::Map<String, serde_json::Value> = Role::ALL
                    .into_iter()
                    .map(|role| {
                        (role.name().to_string(), serde_json::json!(token.role_members(role)))
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&table)?);
                return Ok(());
            }
            for role in Role::ALL {
                println!("{role} (0x{}) admin={}", hex::encode(role.id()), token.role_admin(role));
                for member in token.role_members(role) {
                    println!("  {member}");
                }
            }
        }

        Commands::Events { since, account } => {
            let token = session.open()?;
            let records = match account {
                Some(account) => {
                    let account = resolve_principal(&account)?;
                    token
                        .events_for(&account)
                        .into_iter()
                        .filter(|r| r.sequence >= since)
                        .collect()
                }
                None => token.events_since(since),
            };
            session.print_records(&records, token.decimals())?;
        }
    }

    Ok(())
}
