use anyhow::Result;
use gex_analyzer::app_config::AppConfig;
use gex_analyzer::commands::GexCommands;
use gex_analyzer::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // ========================================
    // CONFIGURATION - from environment
    // ========================================

    let cfg = AppConfig::from_env();
    logging::init_logging(&cfg.log_dir)?;

    if let Err(e) = cfg.validate() {
        error!(error = %e, "invalid configuration");
        GexCommands::print_usage();
        return Err(e);
    }

    info!(mode = %cfg.mode, port = cfg.port, symbol = %cfg.symbol, "starting gex-analyzer");
    cfg.log_config();

    // ========================================

    match cfg.mode.as_str() {
        "snapshot" => GexCommands::run_snapshot(&cfg).await?,
        "quotes" => GexCommands::run_quotes().await?,
        "expiries" => GexCommands::run_expiries(&cfg).await?,
        "server" => GexCommands::run_server(cfg.port).await?,
        _ => GexCommands::print_usage(),
    }

    Ok(())
}
