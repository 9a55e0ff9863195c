//! Data acquisition and storage: providers, backfill, and the CSV store.

pub mod backfill;
pub mod provider;
pub mod rate_limit;
pub mod stooq;
pub mod store;
pub mod theta;

pub use backfill::{run_backfill, BackfillError, BackfillOptions, BackfillSummary};
pub use provider::{PriceProvider, ProviderError};
pub use rate_limit::RateLimiter;
pub use stooq::{StooqOptions, StooqProvider};
pub use store::{BarStore, StoreError, SymbolDays, MIN_DAY_BARS};
pub use theta::{ThetaOptions, ThetaProvider};
