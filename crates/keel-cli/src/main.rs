use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use keel_core::{Kernel, KernelConfig, Map, Value};
use tracing::{debug, info};

/// Inspect and edit a keel context from the command line.
#[derive(Parser, Debug)]
#[command(name = "keel")]
#[command(about = "Read and write dotted-path context values")]
struct Cli {
    /// Kernel configuration (JSON)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Context file loaded at start and written back after changes
    #[arg(long, value_name = "FILE", global = true)]
    context: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print values as JSON
    Get {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Assign `key=value` pairs; values are read as scalars when they look like one
    Set {
        #[arg(required = true, value_name = "KEY=VALUE")]
        pairs: Vec<String>,
    },
    /// Remove keys
    Remove {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print the whole context
    Dump,
}

/// Keys the kernel seeds itself; never written back to the context file.
const BOOTSTRAP_KEYS: [&str; 6] = ["PROJECT", "TMP", "ENV", "DEBUG", "CACHE_DRIVER", "CACHE_REF"];

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(match cli.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        })
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let stdout = io::stdout();
    run(cli, &mut stdout.lock())
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = match &cli.config {
        Some(path) => KernelConfig::from_file(path)?,
        None => KernelConfig::default(),
    };
    let kernel = Kernel::from_config(config);
    info!(env = %kernel.env(), "kernel ready");

    if let Some(path) = cli.context.as_deref().filter(|p| p.exists()) {
        kernel.all_set(load_context(path)?, None);
    }

    match cli.command {
        Command::Get { keys } => {
            if let [key] = keys.as_slice() {
                print_json(out, &kernel.get(key))?;
            } else {
                print_json(out, &Value::from(kernel.all_get(keys)))?;
            }
        }
        Command::Set { pairs } => {
            for pair in &pairs {
                let (key, value) = parse_assignment(pair)?;
                debug!(key, value = ?value, "set");
                kernel.set(key, value);
            }
            save(&kernel, cli.context.as_deref())?;
        }
        Command::Remove { keys } => {
            kernel.all_remove(&keys);
            save(&kernel, cli.context.as_deref())?;
        }
        Command::Dump => print_json(out, &Value::from(kernel.context()))?,
    }
    Ok(())
}

fn parse_assignment(pair: &str) -> Result<(&str, Value)> {
    let Some((key, raw)) = pair.split_once('=') else {
        bail!("expected KEY=VALUE, got `{pair}`");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in `{pair}`");
    }
    Ok((key, Value::cast(raw)))
}

fn load_context(path: &Path) -> Result<Map> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn save(kernel: &Kernel, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let mut context = kernel.context();
    context.retain(|key, _| !BOOTSTRAP_KEYS.contains(&key.as_str()));
    let raw = serde_json::to_string_pretty(&Value::from(context))?;
    fs::write(path, raw).with_context(|| format!("writing {}", path.display()))?;
    debug!(path = %path.display(), "context saved");
    Ok(())
}

fn print_json(out: &mut impl Write, value: &Value) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}
