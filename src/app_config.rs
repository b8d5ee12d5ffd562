use crate::analysis::AnalysisParams;
use crate::config;
use crate::loader::SnapshotRequest;
use crate::models::{DataSource, ExpiryType, Index};
use anyhow::{Context, Result, bail};
use colored::Colorize;
use std::path::PathBuf;

pub const MODES: [&str; 4] = ["snapshot", "quotes", "expiries", "server"];

/// Application configuration handler
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: String,
    pub port: u16,
    pub symbol: String,
    pub expiry_type: String,
    pub source: String,
    pub strike_range_pct: f64,
    pub risk_free_rate_pct: f64,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Create new configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            mode: config::get_execution_mode().to_ascii_lowercase(),
            port: config::get_port(),
            symbol: config::get_symbol(),
            expiry_type: config::get_expiry_type(),
            source: config::get_data_source(),
            strike_range_pct: config::get_strike_range_pct(),
            risk_free_rate_pct: config::get_risk_free_rate_pct(),
            output_dir: PathBuf::from(config::get_output_dir()),
            log_dir: PathBuf::from(config::get_log_dir()),
        }
    }

    pub fn log_config(&self) {
        println!("{} Mode: {}", "→".cyan(), self.mode.yellow());
        if self.mode == "snapshot" {
            println!(
                "{} {} {} ({} data, ±{}% strikes, r = {}%)",
                "→".cyan(),
                self.symbol.yellow(),
                self.expiry_type,
                self.source,
                self.strike_range_pct,
                self.risk_free_rate_pct
            );
        }
        println!();
    }

    pub fn index(&self) -> Result<Index> {
        Ok(self.symbol.parse::<Index>()?)
    }

    pub fn expiry_type(&self) -> Result<ExpiryType> {
        Ok(self.expiry_type.parse::<ExpiryType>()?)
    }

    pub fn data_source(&self) -> Result<DataSource> {
        Ok(self.source.parse::<DataSource>()?)
    }

    pub fn snapshot_request(&self) -> Result<SnapshotRequest> {
        Ok(SnapshotRequest::new(
            self.index()?,
            self.expiry_type()?,
            self.data_source()?,
        ))
    }

    pub fn analysis_params(&self) -> AnalysisParams {
        AnalysisParams::from_percent(self.strike_range_pct, self.risk_free_rate_pct)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !MODES.contains(&self.mode.as_str()) {
            bail!(
                "Unknown mode '{}' (expected one of: {})",
                self.mode,
                MODES.join(", ")
            );
        }
        if self.port == 0 {
            bail!("Port must be non-zero");
        }

        self.index().context("Invalid GEX_SYMBOL")?;
        self.expiry_type().context("Invalid GEX_EXPIRY_TYPE")?;
        self.data_source().context("Invalid GEX_SOURCE")?;
        Ok(())
    }
}
