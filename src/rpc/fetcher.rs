use super::endpoint::{BalanceEndpoint, SolanaEndpoint};
use crate::error::{Result, RpcEndpointError, StatusError};
use crate::models::lamports_to_sol;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReading {
    pub lamports: u64,
    pub balance: Decimal,
    pub endpoint: String,
}

/// Non-retrying failover across endpoints in priority order.
///
/// Each endpoint gets exactly one attempt per call, bounded by `timeout`.
/// The first answer wins; later endpoints are never contacted.
pub struct BalanceFetcher {
    endpoints: Vec<Box<dyn BalanceEndpoint>>,
    timeout: Duration,
}

impl BalanceFetcher {
    pub fn new(endpoints: Vec<Box<dyn BalanceEndpoint>>, timeout: Duration) -> Self {
        Self { endpoints, timeout }
    }

    /// Builds one JSON-RPC client per URL, keeping the given order.
    pub fn solana(urls: &[String], user_agent: &str, timeout: Duration) -> Result<Self> {
        let endpoints = urls
            .iter()
            .map(|url| {
                SolanaEndpoint::new(url, user_agent, timeout)
                    .map(|e| Box::new(e) as Box<dyn BalanceEndpoint>)
                    .map_err(|e| {
                        StatusError::validation(format!("Invalid RPC endpoint {url}: {e}"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(endpoints, timeout))
    }

    pub async fn fetch_balance(&self, address: &str) -> Result<BalanceReading> {
        let pubkey = Pubkey::from_str(address).map_err(|e| {
            StatusError::validation(format!("Invalid wallet address {address}: {e}"))
        })?;

        for endpoint in &self.endpoints {
            match self.attempt(endpoint.as_ref(), &pubkey).await {
                Ok(lamports) => {
                    debug!(endpoint = endpoint.url(), lamports, "Fetched balance");
                    return Ok(BalanceReading {
                        lamports,
                        balance: lamports_to_sol(lamports),
                        endpoint: endpoint.url().to_string(),
                    });
                }
                Err(e) => {
                    warn!(
                        endpoint = endpoint.url(),
                        error = %e,
                        "RPC endpoint failed, trying next"
                    );
                }
            }
        }

        Err(StatusError::BalanceUnavailable {
            address: address.to_string(),
            attempts: self.endpoints.len(),
        })
    }

    async fn attempt(
        &self,
        endpoint: &dyn BalanceEndpoint,
        pubkey: &Pubkey,
    ) -> std::result::Result<u64, RpcEndpointError> {
        match tokio::time::timeout(self.timeout, endpoint.get_balance(pubkey)).await {
            Ok(result) => result,
            Err(_) => Err(RpcEndpointError::Timeout(self.timeout)),
        }
    }
}
