pub mod endpoint;
pub mod fetcher;

pub use endpoint::{BalanceEndpoint, SolanaEndpoint};
pub use fetcher::{BalanceFetcher, BalanceReading};
