use crate::analysis::AnalysisReport;
use crate::config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    NegativeGammaRegime,
    NearGammaFlip,
    HighPcr,
    LowPcr,
    SupportNearSpot,
    ResistanceNearSpot,
}

impl AlertType {
    pub fn code(&self) -> &'static str {
        match self {
            AlertType::NegativeGammaRegime => "NEGATIVE_GAMMA_REGIME",
            AlertType::NearGammaFlip => "NEAR_GAMMA_FLIP",
            AlertType::HighPcr => "HIGH_PCR",
            AlertType::LowPcr => "LOW_PCR",
            AlertType::SupportNearSpot => "SUPPORT_NEAR_SPOT",
            AlertType::ResistanceNearSpot => "RESISTANCE_NEAR_SPOT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// A triggered risk rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GexAlert {
    pub alert_type: AlertType,
    pub severity: Severity,
    pub description: String,
    pub values: AlertValues,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertValues {
    pub spot: f64,
    pub gamma_flip: f64,
    pub net_gex: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcr: Option<f64>,

    /// Distance of the relevant level from spot, in percent of spot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsOutput {
    pub symbol: String,
    pub expiry: String,
    pub timestamp: String,
    pub spot: f64,
    pub alerts: Vec<GexAlert>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub flip_proximity_pct: f64,
    pub wall_proximity_pct: f64,
    pub high_pcr: f64,
    pub low_pcr: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            flip_proximity_pct: config::FLIP_PROXIMITY_PCT,
            wall_proximity_pct: config::WALL_PROXIMITY_PCT,
            high_pcr: config::HIGH_PCR,
            low_pcr: config::LOW_PCR,
        }
    }
}

fn distance_pct(level: f64, spot: f64) -> f64 {
    if spot > 0.0 {
        (spot - level).abs() / spot * 100.0
    } else {
        f64::INFINITY
    }
}

/// Evaluate the risk rules against a report. None when nothing fires.
pub fn run_rules(report: &AnalysisReport, thresholds: &AlertThresholds) -> Option<AlertsOutput> {
    let spot = report.spot;
    let flip = report.levels.gamma_flip;
    let net_gex = report.summary.net_gex;

    let base = AlertValues {
        spot,
        gamma_flip: flip,
        net_gex,
        strike: None,
        pcr: None,
        distance_pct: None,
    };

    let mut alerts = Vec::new();

    // Rule 1: dealers short gamma, moves get amplified
    if net_gex < 0.0 {
        alerts.push(GexAlert {
            alert_type: AlertType::NegativeGammaRegime,
            severity: Severity::Warning,
            description: format!(
                "Net GEX is negative ({}); expect higher volatility",
                report.summary.net_gex_display
            ),
            values: base.clone(),
        });
    }

    // Rule 2: spot sitting on the flip
    if !report.gex.is_empty() {
        let dist = distance_pct(flip, spot);
        if dist <= thresholds.flip_proximity_pct {
            alerts.push(GexAlert {
                alert_type: AlertType::NearGammaFlip,
                severity: Severity::Critical,
                description: format!(
                    "Spot {:.2} is within {:.2}% of the gamma flip at {:.0}",
                    spot, dist, flip
                ),
                values: AlertValues {
                    strike: Some(flip),
                    distance_pct: Some(dist),
                    ..base.clone()
                },
            });
        }
    }

    // Rule 3: skewed positioning
    let pcr = report.pcr_totals.overall_pcr;
    if pcr > 0.0 {
        if pcr >= thresholds.high_pcr {
            alerts.push(GexAlert {
                alert_type: AlertType::HighPcr,
                severity: Severity::Info,
                description: format!("Overall PCR {:.2} is at or above {:.2}", pcr, thresholds.high_pcr),
                values: AlertValues {
                    pcr: Some(pcr),
                    ..base.clone()
                },
            });
        } else if pcr <= thresholds.low_pcr {
            alerts.push(GexAlert {
                alert_type: AlertType::LowPcr,
                severity: Severity::Info,
                description: format!("Overall PCR {:.2} is at or below {:.2}", pcr, thresholds.low_pcr),
                values: AlertValues {
                    pcr: Some(pcr),
                    ..base.clone()
                },
            });
        }
    }

    // Rule 4: walls close to spot
    let walls = [
        (report.levels.support, AlertType::SupportNearSpot, "Support"),
        (report.levels.resistance, AlertType::ResistanceNearSpot, "Resistance"),
    ];
    for (level, alert_type, name) in walls {
        let Some(strike) = level else { continue };
        let dist = distance_pct(strike, spot);
        if dist <= thresholds.wall_proximity_pct {
            alerts.push(GexAlert {
                alert_type,
                severity: Severity::Info,
                description: format!("{} at {:.0} is {:.2}% from spot", name, strike, dist),
                values: AlertValues {
                    strike: Some(strike),
                    distance_pct: Some(dist),
                    ..base.clone()
                },
            });
        }
    }

    // Skip if no alerts
    if alerts.is_empty() {
        return None;
    }

    Some(AlertsOutput {
        symbol: report.symbol().to_string(),
        expiry: report.expiry.clone(),
        timestamp: report.fetched_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        spot,
        alerts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisParams, analyze};
    use crate::models::{DataOrigin, Index, OptionQuote, OptionType, Snapshot};
    use chrono::{Local, NaiveDate};

    fn quote(strike: f64, option_type: OptionType, oi: f64) -> OptionQuote {
        OptionQuote {
            strike,
            expiry: "29-JAN-2026".to_string(),
            option_type,
            oi,
            oi_change: 0.0,
            volume: 0.0,
            iv: 15.0,
            ltp: 0.0,
            change: 0.0,
            bid_qty: 0.0,
            ask_qty: 0.0,
        }
    }

    fn report(spot: f64, rows: Vec<OptionQuote>) -> AnalysisReport {
        let snap = Snapshot {
            index: Index::Nifty,
            spot,
            expiry: "29-JAN-2026".to_string(),
            rows,
            origin: DataOrigin::Live,
            fetched_at: Local::now(),
        };
        let now = NaiveDate::from_ymd_opt(2026, 1, 22)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap();
        analyze(&snap, &AnalysisParams::default(), now)
    }

    fn types(out: &AlertsOutput) -> Vec<AlertType> {
        out.alerts.iter().map(|a| a.alert_type).collect()
    }

    #[test]
    fn test_call_heavy_book_is_negative_gamma() {
        let r = report(
            23_500.0,
            vec![
                quote(23_500.0, OptionType::Call, 10_000.0),
                quote(23_500.0, OptionType::Put, 2_000.0),
            ],
        );
        let out = run_rules(&r, &AlertThresholds::default()).unwrap();
        let t = types(&out);
        assert!(t.contains(&AlertType::NegativeGammaRegime));
        assert!(t.contains(&AlertType::LowPcr));
        assert!(!t.contains(&AlertType::HighPcr));
        assert_eq!(out.symbol, "NIFTY");
    }

    #[test]
    fn test_put_heavy_book_flags_high_pcr() {
        let r = report(
            23_500.0,
            vec![
                quote(23_500.0, OptionType::Call, 1_000.0),
                quote(23_500.0, OptionType::Put, 4_000.0),
            ],
        );
        let out = run_rules(&r, &AlertThresholds::default()).unwrap();
        let t = types(&out);
        assert!(t.contains(&AlertType::HighPcr));
        assert!(!t.contains(&AlertType::NegativeGammaRegime));
        // single strike at spot: flip, support and resistance all sit on it
        assert!(t.contains(&AlertType::NearGammaFlip));
        assert!(t.contains(&AlertType::SupportNearSpot));
    }

    #[test]
    fn test_quiet_book_yields_none() {
        // balanced PCR, positive GEX, levels far from spot
        let r = report(
            23_500.0,
            vec![
                quote(22_000.0, OptionType::Put, 5_000.0),
                quote(25_000.0, OptionType::Call, 5_000.0),
            ],
        );
        let thresholds = AlertThresholds {
            flip_proximity_pct: 0.1,
            wall_proximity_pct: 0.1,
            ..AlertThresholds::default()
        };
        let out = run_rules(&r, &thresholds);
        assert!(
            out.as_ref().is_none_or(|o| !types(o).iter().any(|t| matches!(
                t,
                AlertType::NearGammaFlip
                    | AlertType::SupportNearSpot
                    | AlertType::ResistanceNearSpot
                    | AlertType::HighPcr
                    | AlertType::LowPcr
            ))),
        );
    }

    #[test]
    fn test_zero_pcr_never_fires() {
        let r = report(23_500.0, vec![quote(23_500.0, OptionType::Put, 4_000.0)]);
        let out = run_rules(&r, &AlertThresholds::default()).unwrap();
        let t = types(&out);
        assert!(!t.contains(&AlertType::LowPcr));
        assert!(!t.contains(&AlertType::HighPcr));
    }

    #[test]
    fn test_alert_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&AlertType::NearGammaFlip).unwrap();
        assert_eq!(json, "\"NEAR_GAMMA_FLIP\"");
        assert_eq!(AlertType::ResistanceNearSpot.code(), "RESISTANCE_NEAR_SPOT");
    }
}
