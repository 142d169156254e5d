use std::path::PathBuf;

use anyhow::{Context, Result};
use cdcstamp_core::{CloudTimestamp, NormalizerConfig, PipelineInstant, TimestampNormalizer};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Change-stream timestamp conversions", long_about = None)]
struct Cli {
    /// Normalizer config (TOML); falls back to CDCSTAMP_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a protobuf timestamp (seconds + nanos) to epoch millis
    WireToInstant(WireArgs),
    /// Convert an RFC 3339 database timestamp to epoch millis
    CloudToInstant {
        timestamp: String,
    },
    /// Convert epoch millis to a database timestamp
    InstantToCloud {
        #[arg(allow_hyphen_values = true)]
        epoch_millis: i64,
    },
}

#[derive(Args, Debug)]
struct WireArgs {
    #[arg(long, allow_hyphen_values = true)]
    seconds: i64,
    #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
    nanos: i32,
}

#[derive(Debug, Serialize)]
struct InstantOutput {
    epoch_millis: i64,
    instant: String,
}

impl From<PipelineInstant> for InstantOutput {
    fn from(value: PipelineInstant) -> Self {
        Self {
            epoch_millis: value.epoch_millis(),
            instant: value.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CloudOutput {
    seconds: i64,
    nanos: i32,
    timestamp: String,
}

impl From<CloudTimestamp> for CloudOutput {
    fn from(value: CloudTimestamp) -> Self {
        Self {
            seconds: value.seconds(),
            nanos: value.nanos(),
            timestamp: value.to_string(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let normalizer = TimestampNormalizer::new(&load_config(cli.config)?);
    debug!(nanos_policy = ?normalizer.nanos_policy(), "normalizer ready");

    let output = run(&normalizer, cli.command)?;
    println!("{output}");
    Ok(())
}

fn run(normalizer: &TimestampNormalizer, command: Command) -> Result<String> {
    let output = match command {
        Command::WireToInstant(args) => {
            let wire = prost_types::Timestamp {
                seconds: args.seconds,
                nanos: args.nanos,
            };
            let instant = normalizer
                .wire_to_instant(&wire)
                .context("failed to convert wire timestamp")?;
            serde_json::to_string(&InstantOutput::from(instant))?
        }
        Command::CloudToInstant { timestamp } => {
            let parsed: CloudTimestamp = timestamp
                .parse()
                .with_context(|| format!("failed to parse database timestamp '{timestamp}'"))?;
            serde_json::to_string(&InstantOutput::from(normalizer.cloud_to_instant(&parsed)))?
        }
        Command::InstantToCloud { epoch_millis } => {
            let cloud = normalizer
                .instant_to_cloud(PipelineInstant::from_epoch_millis(epoch_millis))
                .context("failed to convert instant")?;
            serde_json::to_string(&CloudOutput::from(cloud))?
        }
    };
    Ok(output)
}

fn load_config(path: Option<PathBuf>) -> Result<NormalizerConfig> {
    dotenvy::dotenv().ok();

    let path = path.or_else(|| std::env::var_os("CDCSTAMP_CONFIG").map(PathBuf::from));
    match path {
        Some(path) => {
            info!(path = %path.display(), "Loading normalizer config");
            NormalizerConfig::load(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))
        }
        None => Ok(NormalizerConfig::default()),
    }
}
