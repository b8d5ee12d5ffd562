use crate::alerts::AlertsOutput;
use crate::analysis::AnalysisReport;
use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const CSV_HEADER: [&str; 9] = [
    "strike",
    "call_oi",
    "put_oi",
    "call_gamma",
    "put_gamma",
    "call_gex",
    "put_gex",
    "total_gex",
    "cumulative_gex",
];

/// `gex_data_NIFTY_29-JAN-2026_20260122_101500.csv`
pub fn csv_file_name(report: &AnalysisReport) -> String {
    format!(
        "gex_data_{}_{}_{}.csv",
        report.symbol(),
        report.expiry,
        report.fetched_at.format("%Y%m%d_%H%M%S")
    )
}

/// Per-strike GEX table as CSV text
pub fn gex_csv_string(report: &AnalysisReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for row in &report.gex {
        writer.write_record([
            row.strike.to_string(),
            row.call_oi.to_string(),
            row.put_oi.to_string(),
            row.call_gamma.to_string(),
            row.put_gamma.to_string(),
            row.call_gex.to_string(),
            row.put_gex.to_string(),
            row.total_gex.to_string(),
            row.cumulative_gex.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

pub fn write_gex_csv(dir: &Path, report: &AnalysisReport) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join(csv_file_name(report));
    fs::write(&path, gex_csv_string(report)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), strikes = report.gex.len(), "wrote GEX csv");
    Ok(path)
}

/// Full report, pretty-printed
pub fn write_report_json(dir: &Path, report: &AnalysisReport) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join(format!(
        "gex_report_{}_{}.json",
        report.symbol(),
        report.fetched_at.format("%Y%m%d_%H%M%S")
    ));
    fs::write(&path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), "wrote report json");
    Ok(path)
}

/// Triggered alerts for one report, stamped like the report file
pub fn write_alerts_json(dir: &Path, report: &AnalysisReport, alerts: &AlertsOutput) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join(format!(
        "gex_alerts_{}_{}.json",
        report.symbol(),
        report.fetched_at.format("%Y%m%d_%H%M%S")
    ));
    fs::write(&path, serde_json::to_string_pretty(alerts)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), alerts = alerts.alerts.len(), "wrote alerts json");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisParams, analyze};
    use crate::models::{DataOrigin, Index, OptionQuote, OptionType, Snapshot};
    use chrono::{Local, NaiveDate, TimeZone};

    fn report() -> AnalysisReport {
        let quote = |strike: f64, option_type: OptionType, oi: f64| OptionQuote {
            strike,
            expiry: "29-JAN-2026".to_string(),
            option_type,
            oi,
            oi_change: 0.0,
            volume: 0.0,
            iv: 14.0,
            ltp: 0.0,
            change: 0.0,
            bid_qty: 0.0,
            ask_qty: 0.0,
        };
        let snap = Snapshot {
            index: Index::BankNifty,
            spot: 48_050.0,
            expiry: "29-JAN-2026".to_string(),
            rows: vec![
                quote(48_000.0, OptionType::Call, 1_200.0),
                quote(48_000.0, OptionType::Put, 1_500.0),
                quote(48_100.0, OptionType::Call, 900.0),
            ],
            origin: DataOrigin::SampleWithFallbackSpot,
            fetched_at: Local.with_ymd_and_hms(2026, 1, 22, 10, 15, 0).unwrap(),
        };
        let now = NaiveDate::from_ymd_opt(2026, 1, 22)
            .and_then(|d| d.and_hms_opt(10, 15, 0))
            .unwrap();
        analyze(&snap, &AnalysisParams::default(), now)
    }

    #[test]
    fn test_csv_file_name() {
        assert_eq!(
            csv_file_name(&report()),
            "gex_data_BANKNIFTY_29-JAN-2026_20260122_101500.csv"
        );
    }

    #[test]
    fn test_csv_has_header_and_row_per_strike() {
        let csv = gex_csv_string(&report()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert!(lines[1].starts_with("48000,1200,1500,"));
        assert!(lines[2].starts_with("48100,900,0,"));
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let r = report();

        let csv_path = write_gex_csv(&out, &r).unwrap();
        assert!(csv_path.exists());
        assert_eq!(fs::read_to_string(&csv_path).unwrap(), gex_csv_string(&r).unwrap());

        let json_path = write_report_json(&out, &r).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(value["index"], "BANKNIFTY");
        assert_eq!(value["origin"], "sample_with_fallback_spot");
        assert_eq!(value["gex"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_alerts_file_is_stamped_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let r = report();
        let alerts = AlertsOutput {
            symbol: r.symbol().to_string(),
            expiry: r.expiry.clone(),
            timestamp: "2026-01-22 10:15:00".to_string(),
            spot: r.spot,
            alerts: Vec::new(),
        };

        let path = write_alerts_json(dir.path(), &r, &alerts).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "gex_alerts_BANKNIFTY_20260122_101500.json"
        );

        let mut later = r.clone();
        later.fetched_at = later.fetched_at + chrono::Duration::seconds(1);
        let second = write_alerts_json(dir.path(), &later, &alerts).unwrap();
        assert_ne!(path, second);
        assert!(path.exists());

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(second).unwrap()).unwrap();
        assert_eq!(value["symbol"], "BANKNIFTY");
    }
}
