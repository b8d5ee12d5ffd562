use crate::config;
use crate::error::{GexError, GexResult};
use crate::models::{
    Index, IndexQuote, MarketStatus, NseAllIndices, NseMarketStatus, NseOptionChain, OptionQuote,
    OptionType,
};
use crate::utils;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rand::{seq::SliceRandom, thread_rng};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{debug, info, warn};

/// Option chain narrowed to one expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChainSnapshot {
    pub index: Index,
    pub spot: f64,
    /// Listed expiry the rows belong to, when one was requested
    pub expiry: Option<String>,
    pub expiry_dates: Vec<String>,
    pub rows: Vec<OptionQuote>,
    pub timestamp: Option<String>,
}

// -----------------------------------------------
// RESPONSE PARSING
// -----------------------------------------------

/// Flatten an option-chain-indices body into rows. With `expiry` set, the
/// date is resolved against the listed expiries and other rows dropped.
pub fn parse_option_chain(
    text: &str,
    index: Index,
    expiry: Option<NaiveDate>,
    now: NaiveDateTime,
) -> GexResult<OptionChainSnapshot> {
    let chain: NseOptionChain = serde_json::from_str(text)?;
    let records = chain.records;

    let spot = records
        .underlying_value
        .ok_or_else(|| GexError::NoData(format!("{} chain has no underlying value", index)))?;

    let resolved = match expiry {
        Some(requested) => Some(utils::resolve_expiry(requested, &records.expiry_dates, now)?),
        None => None,
    };
    let resolved_date = resolved.as_deref().map(utils::parse_expiry).transpose()?;

    let mut rows = Vec::new();
    for item in &records.data {
        if let Some(target) = resolved_date {
            match utils::parse_expiry(&item.expiry_date) {
                Ok(date) if date == target => {}
                _ => continue,
            }
        }

        if let Some(ce) = &item.call {
            rows.push(ce.to_quote(item.strike_price, &item.expiry_date, OptionType::Call));
        }
        if let Some(pe) = &item.put {
            rows.push(pe.to_quote(item.strike_price, &item.expiry_date, OptionType::Put));
        }
    }

    Ok(OptionChainSnapshot {
        index,
        spot,
        expiry: resolved,
        expiry_dates: records.expiry_dates,
        rows,
        timestamp: records.timestamp,
    })
}

/// Pick the index's entry from an allIndices body
pub fn parse_index_quote(text: &str, index: Index) -> GexResult<Option<IndexQuote>> {
    let all: NseAllIndices = serde_json::from_str(text)?;

    Ok(all
        .data
        .into_iter()
        .find(|entry| entry.index == index.quote_name())
        .and_then(|entry| {
            Some(IndexQuote {
                index,
                last: entry.last?,
                change: entry.percent_change.unwrap_or(0.0),
                open: entry.open.unwrap_or(0.0),
                high: entry.high.unwrap_or(0.0),
                low: entry.low.unwrap_or(0.0),
                previous_close: entry.previous_close.unwrap_or(0.0),
            })
        }))
}

/// Read the capital market state from a marketStatus body
pub fn parse_market_status(text: &str, timestamp: String) -> GexResult<MarketStatus> {
    let status: NseMarketStatus = serde_json::from_str(text)?;

    let entry = status
        .market_state
        .into_iter()
        .find(|s| s.market.eq_ignore_ascii_case(config::MARKET_STATUS_SECTION));

    Ok(match entry {
        Some(s) => MarketStatus {
            market_state: s.market_status.unwrap_or_else(|| "Unknown".to_string()),
            message: s.message,
            timestamp,
        },
        None => MarketStatus::unknown(timestamp),
    })
}

/// Reject HTML block pages and other bodies that are not JSON
pub fn ensure_json(text: &str) -> GexResult<()> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(());
    }
    let preview: String = text.chars().take(200).collect();
    Err(GexError::NonJsonResponse(preview))
}

fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// -----------------------------------------------
// CLIENT WRAPPER WITH SESSION STATE
// -----------------------------------------------
pub struct NSEClient {
    client: Client,
    warmed_up: RwLock<bool>,
}

impl NSEClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            warmed_up: RwLock::new(false),
        })
    }

    /// Warmup NSE session (only once per client) so the API calls carry cookies
    async fn warmup_if_needed(&self) -> Result<()> {
        if *self.warmed_up.read().await {
            return Ok(());
        }

        let mut warmed = self.warmed_up.write().await;
        if !*warmed {
            debug!("warming up NSE session");
            self.client
                .get(config::NSE_BASE_URL)
                .header("Accept", config::HEADER_ACCEPT_HTML)
                .send()
                .await
                .context("Failed to warm up NSE session")?;

            tokio::time::sleep(Duration::from_millis(config::WARMUP_DELAY_MS)).await;
            *warmed = true;
        }

        Ok(())
    }

    async fn fetch_json(&self, url: &str) -> Result<String> {
        self.warmup_if_needed().await?;
        get_json(&self.client, url).await
    }

    // -----------------------------------------------
    // OPTION CHAIN
    // -----------------------------------------------
    pub async fn fetch_option_chain(
        &self,
        index: Index,
        expiry: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot> {
        let url = config::nse_option_chain_url(index.symbol());
        let text = self.fetch_json(&url).await?;

        let chain = parse_option_chain(&text, index, expiry, Local::now().naive_local())
            .with_context(|| format!("Failed to parse {} option chain", index))?;

        info!(
            symbol = index.symbol(),
            spot = chain.spot,
            expiry = chain.expiry.as_deref().unwrap_or("all"),
            rows = chain.rows.len(),
            "fetched option chain"
        );

        Ok(chain)
    }

    // -----------------------------------------------
    // INDEX QUOTES
    // -----------------------------------------------
    pub async fn get_index_quote(&self, index: Index) -> Result<Option<IndexQuote>> {
        let text = self.fetch_json(config::NSE_API_ALL_INDICES).await?;
        let quote = parse_index_quote(&text, index).context("Failed to parse all indices")?;
        Ok(quote)
    }

    /// Quotes for every supported index from a single allIndices call
    pub async fn get_index_quotes(&self) -> Result<Vec<IndexQuote>> {
        let text = self.fetch_json(config::NSE_API_ALL_INDICES).await?;

        let mut quotes = Vec::with_capacity(Index::ALL.len());
        for index in Index::ALL {
            if let Some(q) = parse_index_quote(&text, index).context("Failed to parse all indices")? {
                quotes.push(q);
            }
        }
        Ok(quotes)
    }

    pub async fn get_live_spot_price(&self, index: Index) -> Result<Option<f64>> {
        Ok(self.get_index_quote(index).await?.map(|q| q.last))
    }

    // -----------------------------------------------
    // MARKET STATUS
    // -----------------------------------------------

    /// Never fails: any error is reported as an "Unknown" market state
    pub async fn get_market_status(&self) -> MarketStatus {
        let timestamp = now_timestamp();

        match self.fetch_json(config::NSE_API_MARKET_STATUS).await {
            Ok(text) => parse_market_status(&text, timestamp.clone()).unwrap_or_else(|e| {
                warn!(error = %e, "failed to parse market status");
                MarketStatus::unknown(timestamp)
            }),
            Err(e) => {
                warn!(error = %e, "failed to fetch market status");
                MarketStatus::unknown(timestamp)
            }
        }
    }
}

// -----------------------------------------------
// JSON FETCH WITH RETRY
// -----------------------------------------------

/// Only throttling and server errors are worth another attempt
fn is_retryable(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<GexError>(), Some(GexError::RetryableStatus(_)))
}

async fn get_json_once(client: &Client, url: &str) -> Result<String> {
    let res = client
        .get(url)
        .header("Referer", config::HEADER_REFERER)
        .header("X-Requested-With", config::HEADER_X_REQUESTED_WITH)
        .send()
        .await
        .context("Request send failed")?;

    let status = res.status();
    debug!(url, status = status.as_u16(), "NSE response");

    if status.is_success() {
        let text = res.text().await.context("Failed to read body")?;
        if let Err(e) = ensure_json(&text) {
            warn!(url, "non-JSON response from NSE");
            return Err(e.into());
        }
        Ok(text)
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        warn!(url, status = status.as_u16(), "retryable NSE error");
        Err(GexError::RetryableStatus(status.as_u16()).into())
    } else {
        let body = res.text().await.unwrap_or_default();
        let preview: String = body.chars().take(200).collect();
        anyhow::bail!("Client error {}: {}", status, preview)
    }
}

/// GET a JSON endpoint, retrying 429 and 5xx with exponential backoff
async fn get_json(client: &Client, url: &str) -> Result<String> {
    let backoff = ExponentialBackoff::from_millis(config::RETRY_BASE_DELAY_MS)
        .factor(config::RETRY_FACTOR)
        .max_delay(Duration::from_secs(config::RETRY_MAX_DELAY_SECS))
        .take(config::RETRY_MAX_ATTEMPTS);

    RetryIf::spawn(backoff, || get_json_once(client, url), is_retryable).await
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client() -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    let lang = config::ACCEPT_LANGUAGES
        .choose(&mut thread_rng())
        .copied()
        .unwrap_or("en-US,en;q=0.9");
    headers.insert(header::ACCEPT_LANGUAGE, header::HeaderValue::from_str(lang)?);
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));

    Client::builder()
        .default_headers(headers)
        .cookie_store(true)
        .gzip(true)
        .user_agent(config::USER_AGENT)
        .timeout(config::HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}
