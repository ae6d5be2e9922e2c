//! Edge Risk Gateway
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────────┐
//!                     │                    RISK GATEWAY                    │
//!                     │                                                    │
//!   Client Request    │  ┌─────────┐    ┌─────────┐    ┌──────────────┐    │
//!   ──────────────────┼─▶│  http   │───▶│ routing │───▶│   gateway    │    │
//!                     │  │ server  │    │ matcher │    │ extract/build│    │
//!                     │  └─────────┘    └────┬────┘    └──────┬───────┘    │
//!                     │                      │ no match        │           │
//!                     │                      ▼                 ▼           │     Risk
//!   Client Response   │  ┌─────────┐    ┌─────────┐    ┌──────────────┐    │   Scoring
//!   ◀─────────────────┼──│response │◀───│ policy  │◀───│   scoring    │◀───┼──▶ Service
//!                     │  │ mapping │    │threshold│    │    client    │    │
//!                     │  └─────────┘    └─────────┘    └──────────────┘    │
//!                     │                                                    │
//!                     │  config · security · observability · lifecycle     │
//!                     └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use secrecy::SecretString;

use risk_gateway::config::{load_config, ConfigOverrides};
use risk_gateway::lifecycle::startup;
use risk_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "risk-gateway", version)]
#[command(about = "Edge gateway that scores authentication requests", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "RISK_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080
    #[arg(long, env = "RISK_GATEWAY_BIND")]
    bind: Option<String>,

    /// Scoring service API secret
    #[arg(long, env = "CASTLE_API_SECRET", hide_env_values = true)]
    api_secret: Option<String>,

    /// Browser SDK application id (demo page)
    #[arg(long, env = "CASTLE_APP_ID")]
    app_id: Option<String>,

    /// Requests scoring above this value are denied
    #[arg(long, env = "CASTLE_RISK_THRESHOLD")]
    risk_threshold: Option<f64>,
}

impl Cli {
    fn overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.bind,
            api_secret: self.api_secret.map(SecretString::from),
            app_id: self.app_id,
            risk_threshold: self.risk_threshold,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cli = Cli::parse();
    let config_path = cli.config.take();

    let config = match load_config(config_path.as_deref(), cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("risk-gateway: {e}");
            std::process::exit(2);
        }
    };

    logging::init_logging(&config.observability)?;

    tracing::info!("risk-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
