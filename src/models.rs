use crate::error::GexError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// -----------------------------------------------
// DOMAIN TYPES
// -----------------------------------------------

/// Index whose options can be analysed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Index {
    #[serde(rename = "NIFTY")]
    Nifty,
    #[serde(rename = "BANKNIFTY")]
    BankNifty,
}

impl Index {
    pub const ALL: [Index; 2] = [Index::Nifty, Index::BankNifty];

    pub fn symbol(&self) -> &'static str {
        match self {
            Index::Nifty => "NIFTY",
            Index::BankNifty => "BANKNIFTY",
        }
    }

    /// Name used by the NSE all-indices feed
    pub fn quote_name(&self) -> &'static str {
        match self {
            Index::Nifty => "NIFTY 50",
            Index::BankNifty => "NIFTY BANK",
        }
    }

    pub fn strike_interval(&self) -> f64 {
        match self {
            Index::Nifty => 50.0,
            Index::BankNifty => 100.0,
        }
    }

    /// Spot used when no live price can be fetched
    pub fn fallback_spot(&self) -> f64 {
        match self {
            Index::Nifty => 23_500.0,
            Index::BankNifty => 48_000.0,
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Index {
    type Err = GexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NIFTY" | "NIFTY 50" | "NIFTY50" => Ok(Index::Nifty),
            "BANKNIFTY" | "BANK NIFTY" | "NIFTY BANK" => Ok(Index::BankNifty),
            _ => Err(GexError::UnknownSymbol(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OptionType {
    #[serde(rename = "CE")]
    Call,
    #[serde(rename = "PE")]
    Put,
}

impl OptionType {
    pub fn code(&self) -> &'static str {
        match self {
            OptionType::Call => "CE",
            OptionType::Put => "PE",
        }
    }
}

/// A single contract row of an option chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionQuote {
    pub strike: f64,
    pub expiry: String,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub oi: f64,
    pub oi_change: f64,
    pub volume: f64,
    /// Implied volatility in percent, as published by NSE
    pub iv: f64,
    pub ltp: f64,
    pub change: f64,
    pub bid_qty: f64,
    pub ask_qty: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryType {
    Weekly,
    Monthly,
}

impl FromStr for ExpiryType {
    type Err = GexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" | "w" => Ok(ExpiryType::Weekly),
            "monthly" | "m" => Ok(ExpiryType::Monthly),
            other => Err(GexError::InvalidParameter(format!(
                "expiry type '{}' (expected weekly or monthly)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Sample,
}

impl FromStr for DataSource {
    type Err = GexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" | "nse" => Ok(DataSource::Live),
            "sample" => Ok(DataSource::Sample),
            other => Err(GexError::InvalidParameter(format!(
                "data source '{}' (expected live or sample)",
                other
            ))),
        }
    }
}

/// Which step of the ingest fallback chain produced a snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Live,
    SampleWithLiveSpot,
    SampleWithFallbackSpot,
}

/// Option rows plus the spot they were priced against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub index: Index,
    pub spot: f64,
    pub expiry: String,
    pub rows: Vec<OptionQuote>,
    pub origin: DataOrigin,
    pub fetched_at: DateTime<Local>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexQuote {
    pub index: Index,
    pub last: f64,
    /// Percent change on the day
    pub change: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub previous_close: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketStatus {
    pub market_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

impl MarketStatus {
    pub fn unknown(timestamp: String) -> Self {
        Self {
            market_state: "Unknown".to_string(),
            message: None,
            timestamp,
        }
    }

    pub fn is_open(&self) -> bool {
        self.market_state.eq_ignore_ascii_case("open")
            || self.market_state.eq_ignore_ascii_case("market open")
    }
}

// -----------------------------------------------
// NSE WIRE MODELS
// -----------------------------------------------

/// Response of /api/option-chain-indices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NseOptionChain {
    pub records: NseRecords,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NseRecords {
    #[serde(default)]
    pub timestamp: Option<String>,

    #[serde(rename = "underlyingValue", default)]
    pub underlying_value: Option<f64>,

    #[serde(default)]
    pub data: Vec<NseOptionData>,

    #[serde(rename = "expiryDates", default)]
    pub expiry_dates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NseOptionData {
    #[serde(rename = "strikePrice")]
    pub strike_price: f64,

    #[serde(rename = "expiryDate", alias = "expiryDates")]
    pub expiry_date: String,

    #[serde(rename = "CE", default)]
    pub call: Option<NseOptionDetail>,

    #[serde(rename = "PE", default)]
    pub put: Option<NseOptionDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NseOptionDetail {
    #[serde(rename = "openInterest", default)]
    pub open_interest: Option<f64>,

    #[serde(rename = "changeinOpenInterest", default)]
    pub change_in_oi: Option<f64>,

    #[serde(rename = "totalTradedVolume", default)]
    pub total_traded_volume: Option<f64>,

    #[serde(rename = "impliedVolatility", default)]
    pub implied_volatility: Option<f64>,

    #[serde(rename = "lastPrice", default)]
    pub last_price: Option<f64>,

    #[serde(default)]
    pub change: Option<f64>,

    #[serde(rename = "bidQty", default)]
    pub bid_qty: Option<f64>,

    #[serde(rename = "askQty", default)]
    pub ask_qty: Option<f64>,
}

impl NseOptionDetail {
    pub fn to_quote(&self, strike: f64, expiry: &str, option_type: OptionType) -> OptionQuote {
        OptionQuote {
            strike,
            expiry: expiry.to_string(),
            option_type,
            oi: self.open_interest.unwrap_or(0.0),
            oi_change: self.change_in_oi.unwrap_or(0.0),
            volume: self.total_traded_volume.unwrap_or(0.0),
            iv: self.implied_volatility.unwrap_or(0.0),
            ltp: self.last_price.unwrap_or(0.0),
            change: self.change.unwrap_or(0.0),
            bid_qty: self.bid_qty.unwrap_or(0.0),
            ask_qty: self.ask_qty.unwrap_or(0.0),
        }
    }
}

/// Response of /api/allIndices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NseAllIndices {
    #[serde(default)]
    pub data: Vec<NseIndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NseIndexEntry {
    pub index: String,
    #[serde(default)]
    pub last: Option<f64>,
    #[serde(rename = "percentChange", default)]
    pub percent_change: Option<f64>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(rename = "previousClose", default)]
    pub previous_close: Option<f64>,
}

/// Response of /api/marketStatus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NseMarketStatus {
    #[serde(rename = "marketState", default)]
    pub market_state: Vec<NseMarketState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NseMarketState {
    pub market: String,
    #[serde(rename = "marketStatus", default)]
    pub market_status: Option<String>,
    #[serde(rename = "marketStatusMessage", default)]
    pub message: Option<String>,
}
