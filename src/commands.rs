use crate::alerts::{self, AlertThresholds, AlertsOutput, Severity};
use crate::analysis::{self, AnalysisReport};
use crate::api_server_axum;
use crate::app_config::AppConfig;
use crate::export;
use crate::models::{DataOrigin, ExpiryType, Index, IndexQuote, MarketStatus};
use crate::nse_client::NSEClient;
use crate::{loader, utils};

use anyhow::Result;
use chrono::Local;
use colored::Colorize;

const TOP_STRIKES: usize = 10;

/// Command handler for every execution mode
pub struct GexCommands;

impl GexCommands {
    fn header(title: &str) {
        println!("{}", "=".repeat(60).blue());
        println!("{}", title.green().bold());
        println!("{}", "=".repeat(60).blue());
    }

    fn section(title: &str) {
        println!("{}", "-".repeat(60).blue());
        println!("{}", title.cyan().bold());
    }

    /// Load one snapshot, analyse it, print the report and write its files
    pub async fn run_snapshot(cfg: &AppConfig) -> Result<()> {
        Self::header("GEX Snapshot");
        println!();

        let request = cfg.snapshot_request()?;
        let params = cfg.analysis_params();
        let client = NSEClient::new()?;

        println!(
            "{} Loading {} {:?} chain ({:?} source)...",
            "→".cyan(),
            request.index.symbol().yellow(),
            request.expiry_type,
            request.source
        );

        let snapshot = loader::load_snapshot(&client, &request).await?;
        let report = analysis::analyze(&snapshot, &params, Local::now().naive_local());

        Self::display_report(&report);

        let alerts = alerts::run_rules(&report, &AlertThresholds::default());
        Self::display_alerts(alerts.as_ref());

        Self::section("Output");
        let json_path = export::write_report_json(&cfg.output_dir, &report)?;
        println!("{} Saved report to {}", "✓".green(), json_path.display());
        let csv_path = export::write_gex_csv(&cfg.output_dir, &report)?;
        println!("{} Saved GEX table to {}", "✓".green(), csv_path.display());

        if let Some(output) = &alerts {
            let path = export::write_alerts_json(&cfg.output_dir, &report, output)?;
            println!("{} Saved alerts to {}", "✓".green(), path.display());
        }

        println!();
        Self::header("Done!");
        Ok(())
    }

    /// NIFTY / BANKNIFTY quote cards plus market status
    pub async fn run_quotes() -> Result<()> {
        Self::header("Index Quotes");
        println!();

        let client = NSEClient::new()?;
        let (quotes, status) = futures::join!(client.get_index_quotes(), client.get_market_status());

        Self::display_market_status(&status);

        match quotes {
            Ok(quotes) if !quotes.is_empty() => {
                for quote in &quotes {
                    Self::display_quote(quote);
                }
            }
            Ok(_) => println!("{} No index quotes returned", "✗".red()),
            Err(e) => println!("{} Failed to fetch quotes: {}", "✗".red(), e),
        }

        println!("{}", "=".repeat(60).blue());
        Ok(())
    }

    /// Calendar expiries, and the ones NSE currently lists when reachable
    pub async fn run_expiries(cfg: &AppConfig) -> Result<()> {
        Self::header("Expiries");
        println!();

        let today = Local::now().date_naive();
        println!(
            "{} Next weekly: {}",
            "ℹ".blue(),
            utils::format_expiry(utils::next_expiry(ExpiryType::Weekly, today)).yellow()
        );
        println!(
            "{} Next monthly: {}",
            "ℹ".blue(),
            utils::format_expiry(utils::next_expiry(ExpiryType::Monthly, today)).yellow()
        );
        println!();

        println!("{}", "Upcoming weekly expiries:".cyan());
        for expiry in utils::available_expiries(today) {
            println!("  {}", expiry);
        }
        println!();

        let index = cfg.index()?;
        let client = NSEClient::new()?;
        match client.fetch_option_chain(index, None).await {
            Ok(chain) => {
                println!("{} {} expiries listed by NSE:", "✓".green(), index.symbol().yellow());
                for expiry in chain.expiry_dates.iter().take(12) {
                    println!("  {}", expiry);
                }
            }
            Err(e) => println!("{} Could not fetch listed expiries: {}", "✗".red(), e),
        }

        println!("{}", "=".repeat(60).blue());
        Ok(())
    }

    /// Run API server mode
    pub async fn run_server(port: u16) -> Result<()> {
        Self::header("GEX API Server");
        println!();

        api_server_axum::start_server(port).await
    }

    fn display_market_status(status: &MarketStatus) {
        let state = if status.is_open() {
            status.market_state.green().bold()
        } else {
            status.market_state.red().bold()
        };
        println!("{} Market: {} ({})", "ℹ".blue(), state, status.timestamp);
        if let Some(message) = &status.message {
            println!("  {}", message);
        }
        println!();
    }

    fn display_quote(quote: &IndexQuote) {
        let change = format!("{:+.2}%", quote.change);
        let change = if quote.change >= 0.0 { change.green() } else { change.red() };

        println!("{} {}", "▸".cyan(), quote.index.quote_name().bold());
        println!("  Last: {}  {}", format!("₹{:.2}", quote.last).yellow(), change);
        println!(
            "  Open: {:.2}  High: {:.2}  Low: {:.2}  Prev close: {:.2}",
            quote.open, quote.high, quote.low, quote.previous_close
        );
        println!();
    }

    fn display_report(report: &AnalysisReport) {
        println!();
        match report.origin {
            DataOrigin::Live => println!("{} Live NSE option chain", "✓".green()),
            DataOrigin::SampleWithLiveSpot => {
                println!("{} Sample data around the live spot", "ℹ".yellow())
            }
            DataOrigin::SampleWithFallbackSpot => {
                println!("{} Sample data around a fallback spot", "⚠".red())
            }
        }
        println!();

        Self::section(&format!("{} {} Key Metrics", report.symbol(), report.expiry));
        println!("{} Spot: {}", "→".cyan(), format!("₹{:.2}", report.spot).yellow());
        println!(
            "{} Gamma flip: ₹{:.0} ({:+.0})",
            "→".cyan(),
            report.levels.gamma_flip,
            report.flip_distance
        );
        let regime = report.summary.regime.label();
        let regime = if report.summary.net_gex > 0.0 { regime.green() } else { regime.red() };
        println!("{} Regime: {}", "→".cyan(), regime);
        println!("{} Net GEX: {}", "→".cyan(), utils::format_inr(report.summary.net_gex));
        println!(
            "{} Time to expiry: {:.4}y  Rate: {:.2}%  Range: ±{}%",
            "ℹ".blue(),
            report.time_to_expiry,
            report.risk_free_rate * 100.0,
            report.strike_range_pct
        );
        println!();

        Self::section("Key Levels");
        let level = |v: Option<f64>| v.map_or("N/A".to_string(), |s| format!("₹{:.0}", s));
        println!("{} Support: {}", "✓".green(), level(report.levels.support));
        println!("{} Resistance: {}", "✓".green(), level(report.levels.resistance));
        println!("{} ATM strike: ₹{:.0}", "✓".green(), report.atm_strike);
        println!();

        Self::section("GEX Summary");
        println!("  Total call GEX: {}", utils::format_inr(report.summary.total_call_gex));
        println!("  Total put GEX:  {}", utils::format_inr(report.summary.total_put_gex));
        println!("  Net GEX:        {}", report.summary.net_gex_display);
        println!(
            "  Above spot: {}  Below spot: {}",
            utils::format_inr(report.levels.net_gex_above_spot),
            utils::format_inr(report.levels.net_gex_below_spot)
        );
        println!();

        Self::section("Open Interest");
        let totals = &report.pcr_totals;
        println!("  Total call OI: {}", utils::group_thousands(totals.total_call_oi));
        println!("  Total put OI:  {}", utils::group_thousands(totals.total_put_oi));
        println!("  Overall PCR:   {:.2}", totals.overall_pcr);
        println!();

        Self::section(&format!("Top {} strikes by |GEX|", TOP_STRIKES));
        println!(
            "  {:>10} {:>12} {:>12} {:>14}",
            "Strike", "Call OI", "Put OI", "Net GEX"
        );
        for row in report.top_strikes(TOP_STRIKES) {
            let net = format!("{:>14}", utils::format_inr(row.total_gex));
            let net = if row.total_gex >= 0.0 { net.green() } else { net.red() };
            println!(
                "  {:>10.0} {:>12} {:>12} {}",
                row.strike,
                utils::group_thousands(row.call_oi),
                utils::group_thousands(row.put_oi),
                net
            );
        }
        println!();
    }

    fn display_alerts(alerts: Option<&AlertsOutput>) {
        Self::section("Alerts");
        let Some(output) = alerts else {
            println!("{} No alerts found", "ℹ".blue());
            println!();
            return;
        };

        for alert in &output.alerts {
            let marker = match alert.severity {
                Severity::Critical => "✗".red(),
                Severity::Warning => "⚠".yellow(),
                Severity::Info => "ℹ".blue(),
            };
            println!("{} [{}] {}", marker, alert.alert_type.code(), alert.description);
        }
        println!("{} Total alerts: {}", "ℹ".blue(), output.alerts.len());
        println!();
    }

    /// Print usage instructions
    pub fn print_usage() {
        eprintln!("Set GEX_MODE environment variable to control execution mode");
        eprintln!("Examples:");
        eprintln!("  GEX_MODE=snapshot GEX_SYMBOL=NIFTY cargo run          # One-off analysis");
        eprintln!("  GEX_MODE=snapshot GEX_SOURCE=sample cargo run         # Analysis on sample data");
        eprintln!("  GEX_MODE=quotes cargo run                             # Index quotes and market status");
        eprintln!("  GEX_MODE=expiries GEX_SYMBOL=BANKNIFTY cargo run      # Upcoming expiries");
        eprintln!("  GEX_MODE=server GEX_PORT=3001 cargo run               # Start API server");
        eprintln!(
            "Symbols: {}",
            Index::ALL.iter().map(|i| i.symbol()).collect::<Vec<_>>().join(", ")
        );
    }
}
