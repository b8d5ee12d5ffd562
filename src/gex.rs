use crate::config;
use crate::greeks;
use crate::models::{OptionQuote, OptionType};
use serde::{Deserialize, Serialize};

/// Per-strike open interest and volatility, both sides
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeAggregate {
    pub strike: f64,
    pub call_oi: f64,
    pub put_oi: f64,
    /// Decimal volatility used for the call side
    pub call_iv: f64,
    /// Decimal volatility used for the put side
    pub put_iv: f64,
}

/// Gamma exposure at one strike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeGex {
    pub strike: f64,
    pub call_oi: f64,
    pub put_oi: f64,
    pub call_gamma: f64,
    pub put_gamma: f64,
    pub call_gex: f64,
    pub put_gex: f64,
    pub total_gex: f64,
    /// Running sum of `total_gex` in ascending strike order
    pub cumulative_gex: f64,
}

/// Delta exposure at one strike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeDex {
    pub strike: f64,
    pub call_delta: f64,
    pub put_delta: f64,
    pub call_dex: f64,
    pub put_dex: f64,
    pub total_dex: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaLevels {
    /// Strike where cumulative GEX is closest to zero
    pub gamma_flip: f64,
    /// Strike with the largest positive GEX
    pub support: Option<f64>,
    /// Strike with the largest negative GEX
    pub resistance: Option<f64>,
    pub total_gex: f64,
    pub net_gex_above_spot: f64,
    pub net_gex_below_spot: f64,
}

fn side_iv(sum: f64, count: usize) -> f64 {
    if count == 0 {
        return config::DEFAULT_IV;
    }
    let mean = sum / count as f64;
    if mean > 0.0 { mean / 100.0 } else { config::DEFAULT_IV }
}

/// Collapse option rows into one entry per unique strike, ascending
pub fn aggregate_by_strike(rows: &[OptionQuote]) -> Vec<StrikeAggregate> {
    let mut sorted: Vec<&OptionQuote> = rows.iter().collect();
    sorted.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    let mut aggregates = Vec::new();
    let mut i = 0;

    while i < sorted.len() {
        let strike = sorted[i].strike;
        let (mut call_oi, mut put_oi) = (0.0, 0.0);
        let (mut call_iv_sum, mut put_iv_sum) = (0.0, 0.0);
        let (mut call_n, mut put_n) = (0usize, 0usize);

        while i < sorted.len() && sorted[i].strike == strike {
            let row = sorted[i];
            match row.option_type {
                OptionType::Call => {
                    call_oi += row.oi;
                    call_iv_sum += row.iv;
                    call_n += 1;
                }
                OptionType::Put => {
                    put_oi += row.oi;
                    put_iv_sum += row.iv;
                    put_n += 1;
                }
            }
            i += 1;
        }

        aggregates.push(StrikeAggregate {
            strike,
            call_oi,
            put_oi,
            call_iv: side_iv(call_iv_sum, call_n),
            put_iv: side_iv(put_iv_sum, put_n),
        });
    }

    aggregates
}

/// GEX per strike from pre-aggregated data. Dealers are assumed short
/// calls (negative GEX) and long puts (positive GEX).
pub fn gex_from_aggregates(
    aggregates: &[StrikeAggregate],
    spot: f64,
    time: f64,
    rate: f64,
) -> Vec<StrikeGex> {
    let notional = spot * spot * config::GEX_SCALE;
    let mut cumulative = 0.0;

    aggregates
        .iter()
        .map(|agg| {
            let call_gamma = greeks::gamma(spot, agg.strike, time, rate, agg.call_iv);
            let put_gamma = greeks::gamma(spot, agg.strike, time, rate, agg.put_iv);

            let call_gex = -call_gamma * agg.call_oi * notional;
            let put_gex = put_gamma * agg.put_oi * notional;
            let total_gex = call_gex + put_gex;
            cumulative += total_gex;

            StrikeGex {
                strike: agg.strike,
                call_oi: agg.call_oi,
                put_oi: agg.put_oi,
                call_gamma,
                put_gamma,
                call_gex,
                put_gex,
                total_gex,
                cumulative_gex: cumulative,
            }
        })
        .collect()
}

pub fn calculate_gex(rows: &[OptionQuote], spot: f64, time: f64, rate: f64) -> Vec<StrikeGex> {
    gex_from_aggregates(&aggregate_by_strike(rows), spot, time, rate)
}

/// Net GEX as if the underlying were trading at `spot`
pub fn net_gex_at(aggregates: &[StrikeAggregate], spot: f64, time: f64, rate: f64) -> f64 {
    let notional = spot * spot * config::GEX_SCALE;

    aggregates
        .iter()
        .map(|agg| {
            let call = greeks::gamma(spot, agg.strike, time, rate, agg.call_iv) * agg.call_oi;
            let put = greeks::gamma(spot, agg.strike, time, rate, agg.put_iv) * agg.put_oi;
            (put - call) * notional
        })
        .sum()
}

pub fn calculate_dex(rows: &[OptionQuote], spot: f64, time: f64, rate: f64) -> Vec<StrikeDex> {
    aggregate_by_strike(rows)
        .iter()
        .map(|agg| {
            let call_delta = greeks::call_delta(spot, agg.strike, time, rate, agg.call_iv);
            let put_delta = greeks::put_delta(spot, agg.strike, time, rate, agg.put_iv);

            let call_dex = -call_delta * agg.call_oi * spot;
            let put_dex = -put_delta * agg.put_oi * spot;

            StrikeDex {
                strike: agg.strike,
                call_delta,
                put_delta,
                call_dex,
                put_dex,
                total_dex: call_dex + put_dex,
            }
        })
        .collect()
}

/// Gamma flip, support and resistance levels from an ascending GEX profile
pub fn find_gamma_levels(gex: &[StrikeGex], spot: f64) -> GammaLevels {
    let mut gamma_flip = spot;
    let mut min_abs_cumulative = f64::INFINITY;
    let mut support: Option<(f64, f64)> = None;
    let mut resistance: Option<(f64, f64)> = None;

    for row in gex {
        if row.cumulative_gex.abs() < min_abs_cumulative {
            min_abs_cumulative = row.cumulative_gex.abs();
            gamma_flip = row.strike;
        }
        if support.is_none_or(|(_, best)| row.total_gex > best) {
            support = Some((row.strike, row.total_gex));
        }
        if resistance.is_none_or(|(_, worst)| row.total_gex < worst) {
            resistance = Some((row.strike, row.total_gex));
        }
    }

    GammaLevels {
        gamma_flip,
        support: support.map(|(strike, _)| strike),
        resistance: resistance.map(|(strike, _)| strike),
        total_gex: gex.iter().map(|r| r.total_gex).sum(),
        net_gex_above_spot: gex.iter().filter(|r| r.strike > spot).map(|r| r.total_gex).sum(),
        net_gex_below_spot: gex.iter().filter(|r| r.strike <= spot).map(|r| r.total_gex).sum(),
    }
}
