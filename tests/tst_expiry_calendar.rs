use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use gex_analyzer::models::{ExpiryType, OptionQuote, OptionType};
use gex_analyzer::utils::{
    atm_strike, available_expiries, filter_strikes, format_expiry, format_inr, next_expiry,
    resolve_expiry, select_nearest_expiry, time_to_expiry,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    fn listed() -> Vec<String> {
        // NSE moved index expiries to Tuesdays
        ["06-Jan-2026", "13-Jan-2026", "20-Jan-2026", "27-Jan-2026"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_monthly_rolls_past_last_thursday() {
        assert_eq!(next_expiry(ExpiryType::Monthly, date(2026, 1, 10)), date(2026, 1, 29));
        assert_eq!(next_expiry(ExpiryType::Monthly, date(2026, 1, 29)), date(2026, 2, 26));
        assert_eq!(next_expiry(ExpiryType::Monthly, date(2025, 12, 26)), date(2026, 1, 29));
    }

    #[test]
    fn test_available_expiries_are_consecutive_thursdays() {
        let expiries = available_expiries(date(2026, 1, 2));
        assert_eq!(expiries.len(), 12);
        assert_eq!(expiries[0], "08-JAN-2026");
        assert_eq!(expiries[1], "15-JAN-2026");
        assert_eq!(expiries[11], format_expiry(date(2026, 3, 26)));
        assert_eq!(date(2026, 3, 26).weekday(), Weekday::Thu);
    }

    #[test]
    fn test_time_to_expiry_floors_days() {
        let t = time_to_expiry("08-JAN-2026", at(2026, 1, 2, 15, 0));
        assert!((t - 5.0 / 365.0).abs() < 1e-12);

        // expiry day itself and unparsable input both hit the floor
        assert_eq!(time_to_expiry("08-Jan-2026", at(2026, 1, 8, 9, 30)), 0.0027);
        assert_eq!(time_to_expiry("soon", at(2026, 1, 8, 9, 30)), 0.0027);
    }

    #[test]
    fn test_resolve_calendar_expiry_against_listing() {
        let now = at(2026, 1, 2, 10, 0);

        // a listed date is used as-is
        assert_eq!(resolve_expiry(date(2026, 1, 13), &listed(), now).unwrap(), "13-Jan-2026");
        // Thursday calendar expiry maps to the nearest listed Tuesday
        assert_eq!(resolve_expiry(date(2026, 1, 8), &listed(), now).unwrap(), "06-Jan-2026");
        assert_eq!(resolve_expiry(date(2026, 1, 29), &listed(), now).unwrap(), "27-Jan-2026");
    }

    #[test]
    fn test_resolve_tie_goes_to_earlier_expiry() {
        let listed: Vec<String> = vec!["06-Jan-2026".to_string(), "10-Jan-2026".to_string()];
        let now = at(2026, 1, 2, 10, 0);
        assert_eq!(resolve_expiry(date(2026, 1, 8), &listed, now).unwrap(), "06-Jan-2026");

        // listing order does not matter
        let reversed: Vec<String> = listed.iter().rev().cloned().collect();
        assert_eq!(resolve_expiry(date(2026, 1, 8), &reversed, now).unwrap(), "06-Jan-2026");
    }

    #[test]
    fn test_resolve_skips_expired_dates() {
        // 06-Jan after the 15:30 cutoff is no longer tradeable
        let now = at(2026, 1, 6, 16, 0);
        assert_eq!(resolve_expiry(date(2026, 1, 6), &listed(), now).unwrap(), "13-Jan-2026");
        assert_eq!(select_nearest_expiry(&listed(), now).unwrap(), "13-Jan-2026");

        // before the cutoff it still is
        let morning = at(2026, 1, 6, 11, 0);
        assert_eq!(select_nearest_expiry(&listed(), morning).unwrap(), "06-Jan-2026");

        assert!(select_nearest_expiry(&listed(), at(2026, 2, 1, 9, 0)).is_err());
        assert!(select_nearest_expiry(&[], morning).is_err());
    }

    #[test]
    fn test_atm_strike_per_index_grid() {
        assert_eq!(atm_strike(23_524.0, 50.0), 23_500.0);
        assert_eq!(atm_strike(23_526.0, 50.0), 23_550.0);
        // tie goes to the even multiple
        assert_eq!(atm_strike(23_525.0, 50.0), 23_500.0);
        assert_eq!(atm_strike(48_150.0, 100.0), 48_200.0);
    }

    #[test]
    fn test_filter_strikes_keeps_bounds() {
        let row = |strike: f64| OptionQuote {
            strike,
            expiry: "08-Jan-2026".to_string(),
            option_type: OptionType::Call,
            oi: 1.0,
            oi_change: 0.0,
            volume: 0.0,
            iv: 12.0,
            ltp: 0.0,
            change: 0.0,
            bid_qty: 0.0,
            ask_qty: 0.0,
        };
        let rows: Vec<OptionQuote> = [17_950.0, 18_000.0, 20_000.0, 22_000.0, 22_050.0]
            .into_iter()
            .map(row)
            .collect();

        let kept: Vec<f64> = filter_strikes(&rows, 20_000.0, 10.0)
            .iter()
            .map(|r| r.strike)
            .collect();
        assert_eq!(kept, vec![18_000.0, 20_000.0, 22_000.0]);
    }

    #[test]
    fn test_format_inr_units() {
        assert_eq!(format_inr(25_000_000.0), "₹2.50Cr");
        assert_eq!(format_inr(-350_000.0), "₹-3.50L");
        assert_eq!(format_inr(99_999.4), "₹99,999");
    }
}
