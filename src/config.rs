use std::time::Duration;

// -----------------------------------------------
// NSE API ENDPOINTS
// -----------------------------------------------
pub const NSE_BASE_URL: &str = "https://www.nseindia.com";
pub const NSE_API_ALL_INDICES: &str = "https://www.nseindia.com/api/allIndices";
pub const NSE_API_MARKET_STATUS: &str = "https://www.nseindia.com/api/marketStatus";

pub fn nse_option_chain_url(symbol: &str) -> String {
    format!(
        "{}/api/option-chain-indices?symbol={}",
        NSE_BASE_URL,
        urlencoding::encode(symbol)
    )
}

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                               AppleWebKit/537.36 (KHTML, like Gecko) \
                               Chrome/131.0.0.0 Safari/537.36";

pub const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.8",
    "en-IN,en;q=0.9",
];

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

// -----------------------------------------------
// SESSION WARMUP
// -----------------------------------------------
pub const WARMUP_DELAY_MS: u64 = 200;

// -----------------------------------------------
// RETRY CONFIG
// -----------------------------------------------
pub const RETRY_BASE_DELAY_MS: u64 = 100;
pub const RETRY_FACTOR: u64 = 2;
pub const RETRY_MAX_DELAY_SECS: u64 = 3;
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// -----------------------------------------------
// HTTP HEADERS
// -----------------------------------------------
pub const HEADER_REFERER: &str = "https://www.nseindia.com/option-chain";
pub const HEADER_X_REQUESTED_WITH: &str = "XMLHttpRequest";
pub const HEADER_ACCEPT_HTML: &str = "text/html";

// -----------------------------------------------
// API CACHE
// -----------------------------------------------
pub const QUOTES_CACHE_DURATION: Duration = Duration::from_secs(30);
pub const MARKET_STATUS_SECTION: &str = "Capital Market";

// -----------------------------------------------
// EXPIRY RULES
// -----------------------------------------------
/// Trading cutoff on expiry day (HH, MM)
pub const EXPIRY_CUTOFF: (u32, u32) = (15, 30);
pub const AVAILABLE_EXPIRY_COUNT: usize = 12;
/// Floor for time to expiry, in years (about one day)
pub const MIN_TIME_TO_EXPIRY: f64 = 0.0027;

// -----------------------------------------------
// GEX MODEL DEFAULTS
// -----------------------------------------------
pub const DEFAULT_RISK_FREE_RATE_PCT: f64 = 7.0;
pub const MAX_RISK_FREE_RATE_PCT: f64 = 15.0;
pub const DEFAULT_IV: f64 = 0.15;
pub const GEX_SCALE: f64 = 0.01;

pub const DEFAULT_STRIKE_RANGE_PCT: f64 = 10.0;
pub const MIN_STRIKE_RANGE_PCT: f64 = 5.0;
pub const MAX_STRIKE_RANGE_PCT: f64 = 20.0;

pub const SPOT_SWEEP_RANGE: f64 = 500.0;
pub const SPOT_SWEEP_STEP: f64 = 10.0;

// -----------------------------------------------
// SAMPLE DATA
// -----------------------------------------------
pub const SAMPLE_STRIKE_COUNT: usize = 40;
pub const SAMPLE_BASE_OI: f64 = 100_000.0;
pub const SAMPLE_OI_DECAY_PER_POINT: f64 = 30.0;
pub const SAMPLE_MIN_OI: f64 = 5_000.0;

// -----------------------------------------------
// ALERT THRESHOLDS
// -----------------------------------------------
pub const FLIP_PROXIMITY_PCT: f64 = 0.5;
pub const WALL_PROXIMITY_PCT: f64 = 1.0;
pub const HIGH_PCR: f64 = 1.5;
pub const LOW_PCR: f64 = 0.5;

// -----------------------------------------------
// RUNTIME CONFIGURATION
// -----------------------------------------------

/// Get the execution mode from environment or default to snapshot
pub fn get_execution_mode() -> String {
    std::env::var("GEX_MODE").unwrap_or_else(|_| "snapshot".to_string())
}

pub fn get_symbol() -> String {
    std::env::var("GEX_SYMBOL").unwrap_or_else(|_| "NIFTY".to_string())
}

pub fn get_expiry_type() -> String {
    std::env::var("GEX_EXPIRY_TYPE").unwrap_or_else(|_| "weekly".to_string())
}

pub fn get_data_source() -> String {
    std::env::var("GEX_SOURCE").unwrap_or_else(|_| "live".to_string())
}

pub fn get_output_dir() -> String {
    std::env::var("GEX_OUTPUT_DIR").unwrap_or_else(|_| "gex_output".to_string())
}

pub fn get_log_dir() -> String {
    std::env::var("GEX_LOG_DIR").unwrap_or_else(|_| "./logs".to_string())
}

/// Strike range around spot in percent, clamped to the 5-20% window
pub fn get_strike_range_pct() -> f64 {
    std::env::var("GEX_STRIKE_RANGE")
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .map(clamp_strike_range)
        .unwrap_or(DEFAULT_STRIKE_RANGE_PCT)
}

/// Risk-free rate in percent, clamped to 0-15%
pub fn get_risk_free_rate_pct() -> f64 {
    std::env::var("GEX_RISK_FREE_RATE")
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .map(clamp_risk_free_rate)
        .unwrap_or(DEFAULT_RISK_FREE_RATE_PCT)
}

pub fn get_port() -> u16 {
    std::env::var("GEX_PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(3001)
}

pub fn clamp_strike_range(pct: f64) -> f64 {
    if pct.is_nan() {
        return DEFAULT_STRIKE_RANGE_PCT;
    }
    pct.clamp(MIN_STRIKE_RANGE_PCT, MAX_STRIKE_RANGE_PCT)
}

pub fn clamp_risk_free_rate(pct: f64) -> f64 {
    if pct.is_nan() {
        return DEFAULT_RISK_FREE_RATE_PCT;
    }
    pct.clamp(0.0, MAX_RISK_FREE_RATE_PCT)
}
