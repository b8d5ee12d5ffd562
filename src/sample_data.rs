//! Synthetic option chain centred on a spot price, for when NSE's chain is
//! unavailable or sample mode is requested.

use crate::config;
use crate::models::{Index, OptionQuote, OptionType};
use rand::Rng;

fn sample_quote<R: Rng + ?Sized>(
    rng: &mut R,
    strike: f64,
    expiry: &str,
    option_type: OptionType,
    oi: f64,
    ltp: f64,
) -> OptionQuote {
    OptionQuote {
        strike,
        expiry: expiry.to_string(),
        option_type,
        oi,
        oi_change: rng.gen_range(-5_000.0_f64..5_000.0).trunc(),
        volume: rng.gen_range(1_000.0_f64..50_000.0).trunc(),
        iv: rng.gen_range(12.0..18.0),
        ltp,
        change: rng.gen_range(-10.0..10.0),
        bid_qty: rng.gen_range(50.0_f64..500.0).trunc(),
        ask_qty: rng.gen_range(50.0_f64..500.0).trunc(),
    }
}

/// Strikes laid out on the index grid around `spot`
pub fn sample_strikes(index: Index, spot: f64) -> Vec<f64> {
    let interval = index.strike_interval();
    let half_span = config::SAMPLE_STRIKE_COUNT as f64 / 2.0 * interval;
    let start = ((spot - half_span) / interval).trunc() * interval;

    (0..config::SAMPLE_STRIKE_COUNT)
        .map(|i| start + i as f64 * interval)
        .collect()
}

/// Generate a call and a put row per strike. Open interest peaks at the
/// money and decays with distance from spot.
pub fn generate_sample_data<R: Rng + ?Sized>(
    index: Index,
    spot: f64,
    expiry: &str,
    rng: &mut R,
) -> Vec<OptionQuote> {
    let mut rows = Vec::with_capacity(config::SAMPLE_STRIKE_COUNT * 2);

    for strike in sample_strikes(index, spot) {
        let distance = (strike - spot).abs();
        let base_oi = (config::SAMPLE_BASE_OI - distance * config::SAMPLE_OI_DECAY_PER_POINT)
            .max(config::SAMPLE_MIN_OI);

        let call_oi = (base_oi * rng.gen_range(0.8..1.2)).trunc();
        let call_ltp = if spot > strike {
            (spot - strike) + rng.gen_range(5.0..50.0)
        } else {
            rng.gen_range(0.5..10.0)
        };
        rows.push(sample_quote(rng, strike, expiry, OptionType::Call, call_oi, call_ltp));

        let put_oi = (base_oi * rng.gen_range(0.8..1.2)).trunc();
        let put_ltp = if strike > spot {
            (strike - spot) + rng.gen_range(5.0..50.0)
        } else {
            rng.gen_range(0.5..10.0)
        };
        rows.push(sample_quote(rng, strike, expiry, OptionType::Put, put_oi, put_ltp));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_sample_strikes_grid() {
        let strikes = sample_strikes(Index::Nifty, 23_512.0);
        assert_eq!(strikes.len(), 40);
        assert_eq!(strikes[0], 22_500.0);
        assert_eq!(strikes[39], 24_450.0);

        let bank = sample_strikes(Index::BankNifty, 48_000.0);
        assert_eq!(bank[0], 46_000.0);
        assert_eq!(bank[1] - bank[0], 100.0);
    }

    #[test]
    fn test_sample_rows_within_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let rows = generate_sample_data(Index::Nifty, 23_512.0, "29-JAN-2026", &mut rng);
        assert_eq!(rows.len(), 80);

        for row in &rows {
            assert_eq!(row.expiry, "29-JAN-2026");
            assert!(row.oi >= 5_000.0 * 0.8 - 1.0);
            assert!(row.oi <= 100_000.0 * 1.2);
            assert!(row.iv >= 12.0 && row.iv < 18.0);
            assert!(row.volume >= 1_000.0 && row.volume < 50_000.0);
            assert!(row.ltp > 0.0);
        }

        // deep ITM call carries its intrinsic value
        let itm_call = rows
            .iter()
            .find(|r| r.option_type == OptionType::Call && r.strike == 22_500.0)
            .unwrap();
        assert!(itm_call.ltp >= 1_012.0 + 5.0);
    }

    #[test]
    fn test_sample_is_deterministic_under_seed() {
        let a = generate_sample_data(Index::BankNifty, 48_000.0, "X", &mut StdRng::seed_from_u64(42));
        let b = generate_sample_data(Index::BankNifty, 48_000.0, "X", &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
