use crate::models::{DataOrigin, DataSource, ExpiryType, Index, IndexQuote, MarketStatus, Snapshot};
use crate::nse_client::{NSEClient, OptionChainSnapshot};
use crate::sample_data;
use crate::utils;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::future::Future;
use tracing::{info, warn};

/// Where option chains and spot prices come from
pub trait MarketDataSource {
    fn option_chain(
        &self,
        index: Index,
        expiry: NaiveDate,
    ) -> impl Future<Output = Result<OptionChainSnapshot>> + Send;

    fn live_spot(&self, index: Index) -> impl Future<Output = Result<Option<f64>>> + Send;

    /// Quotes for every supported index
    fn index_quotes(&self) -> impl Future<Output = Result<Vec<IndexQuote>>> + Send;

    /// Never fails; unknown state is reported as such
    fn market_status(&self) -> impl Future<Output = MarketStatus> + Send;
}

impl MarketDataSource for NSEClient {
    async fn option_chain(&self, index: Index, expiry: NaiveDate) -> Result<OptionChainSnapshot> {
        self.fetch_option_chain(index, Some(expiry)).await
    }

    async fn live_spot(&self, index: Index) -> Result<Option<f64>> {
        self.get_live_spot_price(index).await
    }

    async fn index_quotes(&self) -> Result<Vec<IndexQuote>> {
        self.get_index_quotes().await
    }

    async fn market_status(&self) -> MarketStatus {
        self.get_market_status().await
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    pub index: Index,
    pub expiry_type: ExpiryType,
    pub source: DataSource,
    /// Seed for sample data; entropy when absent
    pub seed: Option<u64>,
}

impl SnapshotRequest {
    pub fn new(index: Index, expiry_type: ExpiryType, source: DataSource) -> Self {
        Self {
            index,
            expiry_type,
            source,
            seed: None,
        }
    }
}

/// Load a snapshot, falling back from the live chain to sample data around
/// the live spot, and from there to the index's fallback spot.
pub async fn load_snapshot<S: MarketDataSource>(
    source: &S,
    request: &SnapshotRequest,
) -> Result<Snapshot> {
    let index = request.index;
    let expiry_date = utils::next_expiry_today(request.expiry_type);

    if request.source == DataSource::Live {
        match source.option_chain(index, expiry_date).await {
            Ok(chain) if !chain.rows.is_empty() && chain.spot > 0.0 => {
                let expiry = chain
                    .expiry
                    .clone()
                    .unwrap_or_else(|| utils::format_expiry(expiry_date));
                info!(symbol = index.symbol(), spot = chain.spot, %expiry, "using live option chain");
                return Ok(Snapshot {
                    index,
                    spot: chain.spot,
                    expiry,
                    rows: chain.rows,
                    origin: DataOrigin::Live,
                    fetched_at: Local::now(),
                });
            }
            Ok(_) => warn!(symbol = index.symbol(), "live option chain empty, falling back to sample data"),
            Err(e) => warn!(symbol = index.symbol(), error = %e, "live option chain unavailable, falling back to sample data"),
        }
    }

    let live_spot = match source.live_spot(index).await {
        Ok(Some(spot)) if spot > 0.0 => Some(spot),
        Ok(_) => {
            warn!(symbol = index.symbol(), "no live spot in index feed");
            None
        }
        Err(e) => {
            warn!(symbol = index.symbol(), error = %e, "live spot unavailable");
            None
        }
    };

    let (spot, origin) = match live_spot {
        Some(spot) => (spot, DataOrigin::SampleWithLiveSpot),
        None => {
            warn!(symbol = index.symbol(), spot = index.fallback_spot(), "using fallback spot");
            (index.fallback_spot(), DataOrigin::SampleWithFallbackSpot)
        }
    };

    let expiry = utils::format_expiry(expiry_date);
    let mut rng = match request.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let rows = sample_data::generate_sample_data(index, spot, &expiry, &mut rng);

    info!(symbol = index.symbol(), spot, ?origin, rows = rows.len(), "generated sample chain");

    Ok(Snapshot {
        index,
        spot,
        expiry,
        rows,
        origin,
        fetched_at: Local::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OptionQuote, OptionType};
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        chain: Option<OptionChainSnapshot>,
        spot: Option<f64>,
        chain_calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(chain: Option<OptionChainSnapshot>, spot: Option<f64>) -> Self {
            Self {
                chain,
                spot,
                chain_calls: AtomicUsize::new(0),
            }
        }
    }

    impl MarketDataSource for FakeSource {
        async fn option_chain(&self, _index: Index, _expiry: NaiveDate) -> Result<OptionChainSnapshot> {
            self.chain_calls.fetch_add(1, Ordering::SeqCst);
            self.chain.clone().ok_or_else(|| anyhow!("connection refused"))
        }

        async fn live_spot(&self, _index: Index) -> Result<Option<f64>> {
            match self.spot {
                Some(s) => Ok(Some(s)),
                None => Err(anyhow!("timeout")),
            }
        }

        async fn index_quotes(&self) -> Result<Vec<IndexQuote>> {
            Ok(Vec::new())
        }

        async fn market_status(&self) -> MarketStatus {
            MarketStatus::unknown("t".to_string())
        }
    }

    fn live_chain(rows: Vec<OptionQuote>) -> OptionChainSnapshot {
        OptionChainSnapshot {
            index: Index::Nifty,
            spot: 23_480.0,
            expiry: Some("08-Jan-2026".to_string()),
            expiry_dates: vec!["08-Jan-2026".to_string()],
            rows,
            timestamp: None,
        }
    }

    fn row() -> OptionQuote {
        OptionQuote {
            strike: 23_500.0,
            expiry: "08-Jan-2026".to_string(),
            option_type: OptionType::Call,
            oi: 100.0,
            oi_change: 0.0,
            volume: 0.0,
            iv: 12.0,
            ltp: 50.0,
            change: 0.0,
            bid_qty: 0.0,
            ask_qty: 0.0,
        }
    }

    fn request(source: DataSource) -> SnapshotRequest {
        SnapshotRequest {
            seed: Some(1),
            ..SnapshotRequest::new(Index::Nifty, ExpiryType::Weekly, source)
        }
    }

    #[tokio::test]
    async fn test_live_chain_used_when_available() {
        let source = FakeSource::new(Some(live_chain(vec![row()])), Some(1.0));
        let snap = load_snapshot(&source, &request(DataSource::Live)).await.unwrap();
        assert_eq!(snap.origin, DataOrigin::Live);
        assert_eq!(snap.spot, 23_480.0);
        assert_eq!(snap.expiry, "08-Jan-2026");
        assert_eq!(snap.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_chain_falls_back_to_live_spot() {
        let source = FakeSource::new(Some(live_chain(vec![])), Some(23_611.0));
        let snap = load_snapshot(&source, &request(DataSource::Live)).await.unwrap();
        assert_eq!(snap.origin, DataOrigin::SampleWithLiveSpot);
        assert_eq!(snap.spot, 23_611.0);
        assert_eq!(snap.rows.len(), 80);
    }

    #[tokio::test]
    async fn test_everything_down_uses_fallback_spot() {
        let source = FakeSource::new(None, None);
        let snap = load_snapshot(&source, &request(DataSource::Live)).await.unwrap();
        assert_eq!(snap.origin, DataOrigin::SampleWithFallbackSpot);
        assert_eq!(snap.spot, 23_500.0);
    }

    #[tokio::test]
    async fn test_sample_mode_skips_option_chain() {
        let source = FakeSource::new(Some(live_chain(vec![row()])), Some(23_700.0));
        let snap = load_snapshot(&source, &request(DataSource::Sample)).await.unwrap();
        assert_eq!(source.chain_calls.load(Ordering::SeqCst), 0);
        assert_eq!(snap.origin, DataOrigin::SampleWithLiveSpot);
        assert_eq!(snap.expiry, snap.rows[0].expiry);
    }
}
