use crate::config;
use crate::gex::{self, GammaLevels, StrikeDex, StrikeGex};
use crate::models::{DataOrigin, Index, OptionQuote, OptionType, Snapshot};
use crate::utils;
use chrono::{DateTime, Local, NaiveDateTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Percent of spot kept on either side
    pub strike_range_pct: f64,
    /// Decimal, e.g. 0.07
    pub risk_free_rate: f64,
    pub sweep_range: f64,
    pub sweep_step: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            strike_range_pct: config::DEFAULT_STRIKE_RANGE_PCT,
            risk_free_rate: config::DEFAULT_RISK_FREE_RATE_PCT / 100.0,
            sweep_range: config::SPOT_SWEEP_RANGE,
            sweep_step: config::SPOT_SWEEP_STEP,
        }
    }
}

impl AnalysisParams {
    /// Build from user-facing percent values, clamped to the accepted ranges
    pub fn from_percent(strike_range_pct: f64, risk_free_rate_pct: f64) -> Self {
        Self {
            strike_range_pct: config::clamp_strike_range(strike_range_pct),
            risk_free_rate: config::clamp_risk_free_rate(risk_free_rate_pct) / 100.0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketRegime {
    PositiveGamma,
    NegativeGamma,
}

impl MarketRegime {
    pub fn from_net_gex(net_gex: f64) -> Self {
        if net_gex > 0.0 {
            MarketRegime::PositiveGamma
        } else {
            MarketRegime::NegativeGamma
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarketRegime::PositiveGamma => "Positive Gamma",
            MarketRegime::NegativeGamma => "Negative Gamma",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_call_gex: f64,
    pub total_put_gex: f64,
    pub net_gex: f64,
    pub total_call_gex_display: String,
    pub total_put_gex_display: String,
    pub net_gex_display: String,
    pub gamma_flip: f64,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub regime: MarketRegime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OiDistribution {
    pub strikes: Vec<f64>,
    pub call_oi: Vec<f64>,
    pub put_oi: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikePcr {
    pub strike: f64,
    pub pcr: f64,
    pub call_oi: f64,
    pub put_oi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PcrTotals {
    pub total_call_oi: f64,
    pub total_put_oi: f64,
    /// 0 when there is no call OI
    pub overall_pcr: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotGexPoint {
    pub spot: f64,
    pub net_gex: f64,
}

/// Everything derived from one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub index: Index,
    pub spot: f64,
    pub expiry: String,
    pub time_to_expiry: f64,
    pub risk_free_rate: f64,
    pub strike_range_pct: f64,
    pub origin: DataOrigin,
    pub fetched_at: DateTime<Local>,
    pub atm_strike: f64,
    /// gamma_flip - spot
    pub flip_distance: f64,
    pub rows_analyzed: usize,
    pub gex: Vec<StrikeGex>,
    pub dex: Vec<StrikeDex>,
    pub levels: GammaLevels,
    pub summary: SummaryMetrics,
    pub oi: OiDistribution,
    pub pcr: Vec<StrikePcr>,
    pub pcr_totals: PcrTotals,
    pub spot_curve: Vec<SpotGexPoint>,
}

impl AnalysisReport {
    pub fn symbol(&self) -> &'static str {
        self.index.symbol()
    }

    /// Strikes ordered by absolute total GEX, largest first
    pub fn top_strikes(&self, n: usize) -> Vec<StrikeGex> {
        let mut ranked = self.gex.clone();
        ranked.sort_by(|a, b| b.total_gex.abs().total_cmp(&a.total_gex.abs()));
        ranked.truncate(n);
        ranked
    }
}

pub fn summary_metrics(gex: &[StrikeGex], levels: &GammaLevels) -> SummaryMetrics {
    let total_call_gex: f64 = gex.iter().map(|g| g.call_gex).sum();
    let total_put_gex: f64 = gex.iter().map(|g| g.put_gex).sum();
    let net_gex: f64 = gex.iter().map(|g| g.total_gex).sum();

    SummaryMetrics {
        total_call_gex,
        total_put_gex,
        net_gex,
        total_call_gex_display: utils::group_thousands(total_call_gex),
        total_put_gex_display: utils::group_thousands(total_put_gex),
        net_gex_display: utils::group_thousands(net_gex),
        gamma_flip: levels.gamma_flip,
        support: levels.support,
        resistance: levels.resistance,
        regime: MarketRegime::from_net_gex(net_gex),
    }
}

pub fn oi_distribution(gex: &[StrikeGex]) -> OiDistribution {
    OiDistribution {
        strikes: gex.iter().map(|g| g.strike).collect(),
        call_oi: gex.iter().map(|g| g.call_oi).collect(),
        put_oi: gex.iter().map(|g| g.put_oi).collect(),
    }
}

fn ratio(put_oi: f64, call_oi: f64) -> f64 {
    if call_oi > 0.0 { put_oi / call_oi } else { 0.0 }
}

pub fn pcr_by_strike(gex: &[StrikeGex]) -> Vec<StrikePcr> {
    gex.iter()
        .map(|g| StrikePcr {
            strike: g.strike,
            pcr: ratio(g.put_oi, g.call_oi),
            call_oi: g.call_oi,
            put_oi: g.put_oi,
        })
        .collect()
}

pub fn pcr_totals(rows: &[OptionQuote]) -> PcrTotals {
    let (mut total_call_oi, mut total_put_oi) = (0.0, 0.0);
    for row in rows {
        match row.option_type {
            OptionType::Call => total_call_oi += row.oi,
            OptionType::Put => total_put_oi += row.oi,
        }
    }

    PcrTotals {
        total_call_oi,
        total_put_oi,
        overall_pcr: ratio(total_put_oi, total_call_oi),
    }
}

/// Net GEX at simulated spots across `[spot - range, spot + range)`
pub fn spot_gex_curve(
    aggregates: &[gex::StrikeAggregate],
    spot: f64,
    time: f64,
    rate: f64,
    range: f64,
    step: f64,
) -> Vec<SpotGexPoint> {
    if step <= 0.0 || range <= 0.0 {
        return Vec::new();
    }

    let points = (2.0 * range / step).ceil() as usize;

    (0..points)
        .into_par_iter()
        .map(|i| {
            let simulated = spot - range + i as f64 * step;
            SpotGexPoint {
                spot: simulated,
                net_gex: gex::net_gex_at(aggregates, simulated, time, rate),
            }
        })
        .collect()
}

pub fn analyze(snapshot: &Snapshot, params: &AnalysisParams, now: NaiveDateTime) -> AnalysisReport {
    let spot = snapshot.spot;
    let rows = utils::filter_strikes(&snapshot.rows, spot, params.strike_range_pct);
    let time = utils::time_to_expiry(&snapshot.expiry, now);
    let rate = params.risk_free_rate;

    let aggregates = gex::aggregate_by_strike(&rows);
    let gex = gex::gex_from_aggregates(&aggregates, spot, time, rate);
    let dex = gex::calculate_dex(&rows, spot, time, rate);
    let levels = gex::find_gamma_levels(&gex, spot);
    let spot_curve = spot_gex_curve(
        &aggregates,
        spot,
        time,
        rate,
        params.sweep_range,
        params.sweep_step,
    );

    AnalysisReport {
        index: snapshot.index,
        spot,
        expiry: snapshot.expiry.clone(),
        time_to_expiry: time,
        risk_free_rate: rate,
        strike_range_pct: params.strike_range_pct,
        origin: snapshot.origin,
        fetched_at: snapshot.fetched_at,
        atm_strike: utils::atm_strike(spot, snapshot.index.strike_interval()),
        flip_distance: levels.gamma_flip - spot,
        rows_analyzed: rows.len(),
        summary: summary_metrics(&gex, &levels),
        oi: oi_distribution(&gex),
        pcr: pcr_by_strike(&gex),
        pcr_totals: pcr_totals(&rows),
        dex,
        levels,
        gex,
        spot_curve,
    }
}
