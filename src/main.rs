//! Adscore signature verifier CLI
//!
//! Verifies one signature against a request's IPs and user agent and prints
//! the decoded claims and verdict.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zentinel_adscore_signature::config::KeyEncoding;
use zentinel_adscore_signature::{Judgement, Signature5, VerifierConfig};

#[derive(Parser, Debug)]
#[command(name = "adscore-verify")]
#[command(author, version, about = "Verify Adscore signatures")]
struct Args {
    /// Signature to verify
    #[arg(short, long)]
    signature: String,

    /// Candidate client IP address (repeatable)
    #[arg(short, long = "ip", required = true)]
    ips: Vec<String>,

    /// Client User-Agent
    #[arg(short, long)]
    user_agent: String,

    /// Decryption key, overrides keys from the configuration file
    #[arg(short, long)]
    key: Option<String>,

    /// Encoding of --key
    #[arg(long, value_enum, default_value = "base64")]
    key_encoding: KeyEncodingArg,

    /// Path to configuration file (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum KeyEncodingArg {
    Base64,
    Hex,
    Raw,
}

impl From<KeyEncodingArg> for KeyEncoding {
    fn from(arg: KeyEncodingArg) -> Self {
        match arg {
            KeyEncodingArg::Base64 => KeyEncoding::Base64,
            KeyEncodingArg::Hex => KeyEncoding::Hex,
            KeyEncodingArg::Raw => KeyEncoding::Raw,
        }
    }
}

fn init_logging(json: bool, level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => VerifierConfig::from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => VerifierConfig::default(),
    };

    if let Some(key) = &args.key {
        config.keys.zones.clear();
        config.keys.default_key = Some(key.clone());
        config.keys.encoding = args.key_encoding.into();
    }

    let keys = config.key_source()?;
    let formatter = config.formatter();

    let signature = Signature5::create_from_request(
        &args.signature,
        &args.ips,
        &args.user_agent,
        &keys,
        Some(&formatter),
    )?;

    let result = signature.result()?;
    let output = serde_json::json!({
        "zone_id": signature.zone_id(),
        "matched_ip": signature.matched_ip().map(|ip| ip.to_string()),
        "result": result,
        "verdict": Judgement::from_result(result).map(|j| j.verdict()),
        "name": Judgement::from_result(result).map(|j| j.name()),
        "payload": signature.payload(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    init_logging(args.json_logs, &args.log_level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Signature rejected");
            eprintln!("signature rejected: {e:#}");
            ExitCode::FAILURE
        }
    }
}
