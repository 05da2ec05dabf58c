use crate::error::RpcEndpointError;
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::RpcClientConfig;
use solana_commitment_config::CommitmentConfig;
use solana_rpc_client::http_sender::HttpSender;
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "TradingBot/1.0";

/// One redundant source of native balances.
#[async_trait]
pub trait BalanceEndpoint: Send + Sync {
    /// Label reported back when this endpoint answers.
    fn url(&self) -> &str;

    /// Balance in lamports.
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcEndpointError>;
}

/// JSON-RPC endpoint queried at `confirmed` commitment with a fixed User-Agent.
pub struct SolanaEndpoint {
    url: String,
    client: RpcClient,
}

impl SolanaEndpoint {
    pub fn new(url: &str, user_agent: &str, timeout: Duration) -> Result<Self, RpcEndpointError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(timeout)
            .build()
            .map_err(|e| RpcEndpointError::Unavailable(format!("{url}: {e}")))?;

        let client = RpcClient::new_sender(
            HttpSender::new_with_client(url, http),
            RpcClientConfig::with_commitment(CommitmentConfig::confirmed()),
        );

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl BalanceEndpoint for SolanaEndpoint {
    fn url(&self) -> &str {
        &self.url
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcEndpointError> {
        self.client
            .get_balance(address)
            .await
            .map_err(|e| RpcEndpointError::Client(Box::new(e)))
    }
}
