//! riskctl - administrative CLI for the IoMT scoring engine
//!
//! Usage:
//!   riskctl retrain --device-type glucose_monitor --contamination 0.1
//!   riskctl models
//!   riskctl score '{"device_id": "g1", "device_type": "glucose_monitor", "pkt_sec": 1.1}'
//!   riskctl seed --normal 200 --anomalous 20 --device-type ventilator
//!
//! Paths and training parameters come from the `IOMT_*` environment variables.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use risk_core::baseline::BaselineCatalog;
use risk_core::dataset::synthetic;
use risk_core::{EngineConfig, ScoringEngine, TelemetryRecord};

#[derive(Parser, Debug)]
#[command(name = "riskctl")]
#[command(about = "Manage IoMT anomaly models and telemetry", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Retrain one device type (or all logged types) from the telemetry log
    Retrain {
        #[arg(long)]
        device_type: Option<String>,

        /// Expected anomaly fraction, in (0, 0.5]
        #[arg(long)]
        contamination: Option<f64>,
    },

    /// List persisted model keys
    Models,

    /// Score one JSON telemetry record
    Score {
        record: String,

        /// Also append the record to the telemetry log
        #[arg(long)]
        record_telemetry: bool,
    },

    /// Append synthetic telemetry to the log
    Seed {
        #[arg(long, default_value = "200")]
        normal: usize,

        #[arg(long, default_value = "20")]
        anomalous: usize,

        /// Repeatable; defaults to every catalog type
        #[arg(long = "device-type")]
        device_types: Vec<String>,

        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let engine = ScoringEngine::new(EngineConfig::from_env()).context("failed to start scoring engine")?;

    match args.command {
        Command::Retrain { device_type, contamination } => {
            let results = engine.retrain_from_log(device_type.as_deref(), contamination)?;
            if results.is_empty() {
                println!("{}", serde_json::json!({ "status": "no_data" }));
            } else {
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
        }

        Command::Models => {
            for key in engine.list_models()? {
                println!("{}", key);
            }
        }

        Command::Score { record, record_telemetry } => {
            let record: TelemetryRecord =
                serde_json::from_str(&record).context("record is not a JSON object")?;
            let result = if record_telemetry {
                engine.ingest(&record)?
            } else {
                engine.predict(&record)?
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Command::Seed { normal, anomalous, device_types, seed } => {
            let catalog = match &engine.config().baselines_path {
                Some(path) => BaselineCatalog::load(path)?,
                None => BaselineCatalog::builtin(),
            };
            let device_types = if device_types.is_empty() {
                catalog.device_types().map(str::to_string).collect()
            } else {
                device_types
            };

            let mut rng = StdRng::seed_from_u64(seed);
            let mut written = 0usize;
            for device_type in &device_types {
                for record in synthetic::generate(&catalog, device_type, normal, anomalous, &mut rng) {
                    engine.telemetry().append(&record)?;
                    written += 1;
                }
            }
            log::info!("Seeded {} records for {} device types", written, device_types.len());
            println!("{}", engine.telemetry().dir().display());
        }
    }

    Ok(())
}
