//! Vouch cosigned tree head verifier.
//!
//! Loads a witness quorum policy and checks tree heads read from a file or
//! standard input against it.
//!
//! ```text
//! vouch verify <log-key-hash> [FILE]      key=value cosigned tree head
//! vouch checkpoint <log-key-hash> [FILE]  signed checkpoint note
//! vouch policies                          list named policies
//! ```

mod config;

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use vouch_checkpoint::Checkpoint;
use vouch_core::{checkpoint_origin, CosignedTreeHead, KeyHash};
use vouch_policy::{FsPolicyDirectory, Policy, PolicyCatalog};

use crate::config::Config;

/// Verify witness-cosigned transparency log tree heads against a quorum
/// policy.
#[derive(Debug, Parser)]
#[command(name = "vouch", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Verify a key=value cosigned tree head against the policy quorum.
    Verify {
        /// Hex key hash of the log that signed the tree head.
        #[arg(value_parser = parse_log_key_hash)]
        log: KeyHash,
        /// File to read; standard input when absent or `-`.
        input: Option<PathBuf>,
    },
    /// Verify the log signature on a checkpoint note.
    Checkpoint {
        /// Hex key hash of the log that signed the checkpoint.
        #[arg(value_parser = parse_log_key_hash)]
        log: KeyHash,
        /// File to read; standard input when absent or `-`.
        input: Option<PathBuf>,
    },
    /// List named policies from the policy directory and the builtins.
    Policies,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    init_tracing(&config)?;
    debug!(?config, "configuration loaded");

    let catalog = PolicyCatalog::new(FsPolicyDirectory::new(&config.policy_dir));

    match cli.command {
        Command::Verify { log, input } => {
            let policy = load_policy(&config, &catalog)?;
            let text = read_input(input.as_deref())?;
            let cth = CosignedTreeHead::from_ascii(&text)
                .context("Failed to parse cosigned tree head")?;

            let report = policy
                .verify_cosigned_tree_head(&log, &cth)
                .with_context(|| format!("Tree head of size {} rejected", cth.tree_head().size))?;

            println!(
                "size={} verified={} failed={} ignored={}",
                cth.tree_head().size,
                report.verified,
                report.failed,
                report.ignored
            );
        },
        Command::Checkpoint { log, input } => {
            let policy = load_policy(&config, &catalog)?;
            let text = read_input(input.as_deref())?;
            let checkpoint = Checkpoint::from_ascii(&text).context("Failed to parse checkpoint")?;

            let entity = policy
                .log(&log)
                .with_context(|| format!("Log {log} is not part of the policy"))?;
            if checkpoint.origin != checkpoint_origin(&log) {
                bail!("Checkpoint origin {:?} does not belong to log {log}", checkpoint.origin);
            }
            checkpoint.verify(&entity.public_key).context("Checkpoint rejected")?;

            info!(log = %log, size = checkpoint.tree_head().size, "checkpoint verified");
            println!("size={}", checkpoint.tree_head().size);
        },
        Command::Policies => {
            for name in catalog.list().context("Failed to list policies")? {
                println!("{name}");
            }
        },
    }

    Ok(())
}

/// Initializes tracing, preferring `RUST_LOG` over the configured filter.
fn init_tracing(config: &Config) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.rust_log)
            .with_context(|| format!("Invalid log filter {:?}", config.rust_log))?,
    };

    let fmt_layer = fmt::layer().with_target(true).with_writer(io::stderr);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    Ok(())
}

fn parse_log_key_hash(hex: &str) -> std::result::Result<KeyHash, String> {
    KeyHash::from_hex(hex).map_err(|e| e.to_string())
}

/// Resolves the configured policy by file path or by name.
fn load_policy(config: &Config, catalog: &PolicyCatalog<FsPolicyDirectory>) -> Result<Policy> {
    let policy = match (&config.policy_file, &config.policy) {
        (Some(path), _) => {
            let contents = fs::read(path)
                .with_context(|| format!("Failed to read policy file {}", path.display()))?;
            Policy::parse(&contents)
                .with_context(|| format!("Invalid policy file {}", path.display()))?
        },
        (None, Some(name)) => {
            catalog.load(name).with_context(|| format!("Failed to load policy {name:?}"))?
        },
        (None, None) => bail!("No policy configured"),
    };

    info!(
        logs = policy.logs().len(),
        witnesses = policy.witnesses().len(),
        "policy loaded"
    );
    Ok(policy)
}

/// Reads the whole input from `path`, or from stdin when absent or `-`.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("Failed to read standard input")?;
            Ok(text)
        },
    }
}
