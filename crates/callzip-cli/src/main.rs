#![allow(missing_docs)]

use callzip::{compress_call, format_bytecode, Algorithm};
use callzip_cli::{build_payload, override_code, read_payload};
use clap::Parser;
use color_eyre::{
    eyre::{bail, eyre},
    Result,
};
use std::path::PathBuf;

/// Compresses an `eth_call` JSON-RPC payload for the wire.
#[derive(Parser)]
#[command(name = "callzip", version)]
struct Cli {
    /// Path to a JSON-RPC payload file, or `-` for stdin.
    payload: Option<PathBuf>,

    /// Raw 0x-prefixed calldata to wrap in a fresh eth_call payload.
    #[arg(long, conflicts_with = "payload")]
    data: Option<String>,
    /// Target address for --data.
    #[arg(long, requires = "data")]
    to: Option<String>,

    /// Force a compression path (jit, flz or cd) instead of selecting by
    /// payload size.
    #[arg(long)]
    algorithm: Option<String>,

    /// Disassemble the injected bytecode to stderr.
    #[arg(long)]
    disasm: bool,
    /// Report size accounting to stderr.
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = init_tracing_subscriber();
    let cli = Cli::parse();

    let payload = match (&cli.payload, &cli.data) {
        (Some(path), None) => read_payload(path)?,
        (None, Some(data)) => {
            let to = cli.to.as_deref().ok_or_else(|| eyre!("--data requires --to"))?;
            build_payload(data, to)?
        }
        (None, None) => bail!("provide a payload file or --data with --to"),
        (Some(_), Some(_)) => unreachable!("clap rejects the combination"),
    };

    let algorithm = cli.algorithm.as_deref().map(str::parse::<Algorithm>).transpose()?;

    let out = compress_call(&payload, algorithm);
    if out == payload {
        eprintln!("payload is ineligible or incompressible; passing through unchanged");
    }

    if cli.stats {
        let before = payload["params"][0]["data"].as_str().map_or(0, |s| s.len() / 2);
        let after = out["params"][0]["data"].as_str().map_or(0, |s| s.len() / 2);
        let code = override_code(&out).map(|c| c.len()).unwrap_or(0);
        eprintln!("calldata: {before} -> {after} bytes, injected code: {code} bytes");
    }
    if cli.disasm {
        let code = override_code(&out)?;
        eprintln!("{}", format_bytecode(&code));
    }

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn init_tracing_subscriber() -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::prelude::*;
    tracing_subscriber::Registry::default()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_error::ErrorLayer::default())
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
