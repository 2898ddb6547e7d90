//! Data sources: curated files, live listings, price history

pub mod circuit_breaker;
pub mod curated;
mod http;
pub mod krx;
pub mod provider;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use curated::{decode_text, CuratedColumns, CuratedLoader, SourceEncoding};
pub use http::RetryPolicy;
pub use krx::{KrxListingProvider, DEFAULT_KRX_URL};
pub use provider::{ClosingPrices, DataError, ListingProvider, PriceProvider};
pub use yahoo::{YahooPriceProvider, DEFAULT_SPARK_URL};
