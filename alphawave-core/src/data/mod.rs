//! Market data: providers, retry/backoff, the file contract and table IO.

pub mod binance;
pub mod circuit_breaker;
pub mod provider;
pub mod retry;
pub mod schema;
pub mod table;
pub mod universe;
pub mod yahoo;

pub use binance::{ApiKey, BinanceProvider};
pub use circuit_breaker::CircuitBreaker;
pub use provider::{
    DataError, DataProvider, DataSource, DownloadProgress, ExchangeProvider, FetchResult, RawBar,
    SilentProgress, StdoutProgress,
};
pub use retry::RetryPolicy;
pub use schema::{SchemaError, TableSchema, SCHEMA_VERSION};
pub use table::{read_meta, read_table, write_table, TableError, TableMeta, TableRead};
pub use universe::MarketUniverse;
pub use yahoo::YahooProvider;
