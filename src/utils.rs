use crate::config;
use crate::error::{GexError, GexResult};
use crate::models::{ExpiryType, OptionQuote};
use chrono::{Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

const EXPIRY_FORMAT: &str = "%d-%b-%Y";

// -----------------------------------------------
// EXPIRY CALENDAR
// -----------------------------------------------

/// Next Thursday strictly after `today`
fn next_weekly(today: NaiveDate) -> NaiveDate {
    let mut days_ahead = Weekday::Thu.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64;
    if days_ahead <= 0 {
        days_ahead += 7;
    }
    today + Duration::days(days_ahead)
}

/// Last Thursday of the month containing `date`
fn last_thursday_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let first = date.with_day(1)?;
    let last = first.checked_add_months(Months::new(1))? - Duration::days(1);
    let offset = (last.weekday().num_days_from_monday() as i64 - 3).rem_euclid(7);
    Some(last - Duration::days(offset))
}

fn next_monthly(today: NaiveDate) -> Option<NaiveDate> {
    let this_month = last_thursday_of_month(today)?;
    if this_month > today {
        return Some(this_month);
    }
    let next_month = today.with_day(1)?.checked_add_months(Months::new(1))?;
    last_thursday_of_month(next_month)
}

/// Next expiry date for the given cycle. On expiry day itself the
/// following expiry is returned.
pub fn next_expiry(expiry_type: ExpiryType, today: NaiveDate) -> NaiveDate {
    match expiry_type {
        ExpiryType::Weekly => next_weekly(today),
        ExpiryType::Monthly => next_monthly(today).unwrap_or_else(|| next_weekly(today)),
    }
}

pub fn next_expiry_today(expiry_type: ExpiryType) -> NaiveDate {
    next_expiry(expiry_type, Local::now().date_naive())
}

/// Next `AVAILABLE_EXPIRY_COUNT` weekly expiries
pub fn available_expiries(today: NaiveDate) -> Vec<String> {
    let mut expiries = Vec::with_capacity(config::AVAILABLE_EXPIRY_COUNT);
    let mut current = today;

    for _ in 0..config::AVAILABLE_EXPIRY_COUNT {
        let expiry = next_weekly(current);
        expiries.push(format_expiry(expiry));
        current = expiry + Duration::days(1);
    }

    expiries
}

/// "30-JAN-2026"
pub fn format_expiry(date: NaiveDate) -> String {
    date.format(EXPIRY_FORMAT).to_string().to_uppercase()
}

/// Parse "DD-Mon-YYYY" regardless of the month's letter case
pub fn parse_expiry(expiry: &str) -> GexResult<NaiveDate> {
    let parts: Vec<&str> = expiry.trim().split('-').collect();
    if parts.len() != 3 {
        return Err(GexError::InvalidExpiry(expiry.to_string()));
    }

    let month = parts[1].to_ascii_lowercase();
    let mut chars = month.chars();
    let month = match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => return Err(GexError::InvalidExpiry(expiry.to_string())),
    };

    let normalized = format!("{}-{}-{}", parts[0], month, parts[2]);
    NaiveDate::parse_from_str(&normalized, EXPIRY_FORMAT)
        .map_err(|_| GexError::InvalidExpiry(expiry.to_string()))
}

/// Time to expiry in years, floored at about one day
pub fn time_to_expiry(expiry: &str, now: NaiveDateTime) -> f64 {
    let Ok(date) = parse_expiry(expiry) else {
        return config::MIN_TIME_TO_EXPIRY;
    };

    let expiry_at = date.and_time(NaiveTime::MIN);
    let days = (expiry_at - now).num_seconds().div_euclid(86_400);

    (days as f64 / 365.0).max(config::MIN_TIME_TO_EXPIRY)
}

fn expiry_cutoff() -> NaiveTime {
    let (h, m) = config::EXPIRY_CUTOFF;
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

/// Past expiries are dead, today's expiry only until the trading cutoff
fn is_tradeable(date: NaiveDate, now: NaiveDateTime) -> bool {
    let today = now.date();
    date > today || (date == today && now.time() < expiry_cutoff())
}

fn tradeable_expiries<'a>(
    listed: &'a [String],
    now: NaiveDateTime,
) -> GexResult<Vec<(NaiveDate, &'a String)>> {
    if listed.is_empty() {
        return Err(GexError::NoData("no expiry dates listed".to_string()));
    }

    let mut parsed = Vec::with_capacity(listed.len());
    for s in listed {
        let date = parse_expiry(s)?;
        if is_tradeable(date, now) {
            parsed.push((date, s));
        }
    }

    if parsed.is_empty() {
        return Err(GexError::NoData(
            "no valid expiry found (all past or after cutoff)".to_string(),
        ));
    }

    parsed.sort_by_key(|(d, _)| *d);
    Ok(parsed)
}

/// Earliest listed expiry that is still tradeable
pub fn select_nearest_expiry(listed: &[String], now: NaiveDateTime) -> GexResult<String> {
    let parsed = tradeable_expiries(listed, now)?;
    Ok(parsed[0].1.clone())
}

/// Map a calendar expiry onto the exchange's listed expiries. An exact match
/// wins, otherwise the closest tradeable one (earlier on ties).
pub fn resolve_expiry(
    requested: NaiveDate,
    listed: &[String],
    now: NaiveDateTime,
) -> GexResult<String> {
    let parsed = tradeable_expiries(listed, now)?;

    if let Some((_, s)) = parsed.iter().find(|(d, _)| *d == requested) {
        return Ok((*s).clone());
    }

    parsed
        .iter()
        .min_by_key(|(d, _)| ((*d - requested).num_days().abs(), *d))
        .map(|(_, s)| (*s).clone())
        .ok_or_else(|| GexError::NoData("no expiry to resolve".to_string()))
}

// -----------------------------------------------
// STRIKES
// -----------------------------------------------

/// At-the-money strike on the index's strike grid (ties to even)
pub fn atm_strike(spot: f64, strike_interval: f64) -> f64 {
    if strike_interval <= 0.0 {
        return spot;
    }
    (spot / strike_interval).round_ties_even() * strike_interval
}

/// Keep rows whose strike lies within `range_pct` percent of spot
pub fn filter_strikes(rows: &[OptionQuote], spot: f64, range_pct: f64) -> Vec<OptionQuote> {
    let lower = spot * (1.0 - range_pct / 100.0);
    let upper = spot * (1.0 + range_pct / 100.0);

    rows.iter()
        .filter(|row| row.strike >= lower && row.strike <= upper)
        .cloned()
        .collect()
}

// -----------------------------------------------
// NUMBER FORMATTING
// -----------------------------------------------

/// Whole number with comma thousands separators: 1234567.4 -> "1,234,567"
pub fn group_thousands(num: f64) -> String {
    if !num.is_finite() {
        return num.to_string();
    }

    let digits = format!("{:.0}", num.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if num < 0.0 && digits.chars().any(|c| c != '0') {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Rupee amount in crore / lakh / plain units
pub fn format_inr(num: f64) -> String {
    if num.abs() >= 10_000_000.0 {
        format!("₹{:.2}Cr", num / 10_000_000.0)
    } else if num.abs() >= 100_000.0 {
        format!("₹{:.2}L", num / 100_000.0)
    } else {
        format!("₹{}", group_thousands(num))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_next_weekly_rolls_on_thursday() {
        // 2026-01-01 is a Thursday
        assert_eq!(next_expiry(ExpiryType::Weekly, date(2026, 1, 1)), date(2026, 1, 8));
        assert_eq!(next_expiry(ExpiryType::Weekly, date(2026, 1, 2)), date(2026, 1, 8));
        assert_eq!(next_expiry(ExpiryType::Weekly, date(2025, 12, 29)), date(2026, 1, 1));
    }

    #[test]
    fn test_last_thursday_of_month() {
        assert_eq!(last_thursday_of_month(date(2026, 1, 10)), Some(date(2026, 1, 29)));
        assert_eq!(last_thursday_of_month(date(2025, 12, 1)), Some(date(2025, 12, 25)));
    }

    #[test]
    fn test_parse_expiry_case_insensitive() {
        assert_eq!(parse_expiry("30-JAN-2026").unwrap(), date(2026, 1, 30));
        assert_eq!(parse_expiry("30-Jan-2026").unwrap(), date(2026, 1, 30));
        assert!(parse_expiry("2026-01-30").is_err());
        assert!(parse_expiry("31-FEB-2026").is_err());
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1_000.0), "1,000");
        assert_eq!(group_thousands(1_234_567.4), "1,234,567");
        assert_eq!(group_thousands(-98_765.0), "-98,765");
        assert_eq!(group_thousands(-0.2), "0");
    }
}
