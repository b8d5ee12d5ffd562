pub mod alerts;
pub mod analysis;
pub mod api_server_axum;
pub mod app_config;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod gex;
pub mod greeks;
pub mod loader;
pub mod logging;
pub mod models;
pub mod nse_client;
pub mod sample_data;
pub mod utils;

// Re-exports for convenience
pub use analysis::{AnalysisParams, AnalysisReport, analyze};
pub use error::{GexError, GexResult};
pub use loader::{MarketDataSource, SnapshotRequest, load_snapshot};
pub use models::{DataOrigin, DataSource, ExpiryType, Index, OptionQuote, OptionType, Snapshot};
pub use nse_client::NSEClient;
