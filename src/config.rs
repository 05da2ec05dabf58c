use crate::rpc::endpoint::DEFAULT_USER_AGENT;
use anyhow::{Context, Result, bail};
use std::env;
use std::time::Duration;
use url::Url;

pub const DEFAULT_RPC_ENDPOINTS: &[&str] = &[
    "https://api.mainnet-beta.solana.com",
    "https://rpc.ankr.com/solana",
    "https://solana-api.projectserum.com",
];

pub const DEFAULT_BOT_WALLET: &str = "DGPrryYStTsmKkMhkJrTzapbCYKvN3srHJvSHqZCWYP6";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Ordered by priority.
    pub rpc_endpoints: Vec<String>,
    pub rpc_timeout: Duration,
    pub rpc_user_agent: String,
    pub bot_wallet_address: String,
    /// Only used by the HTTP layer that fronts the service.
    pub port: u16,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set in .env")?;

        let rpc_endpoints = match env::var("RPC_ENDPOINTS") {
            Ok(raw) => parse_endpoints(&raw)?,
            Err(_) => DEFAULT_RPC_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            database_url,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            rpc_endpoints,
            rpc_timeout: Duration::from_secs(parse_var("RPC_TIMEOUT_SECS", 10)?),
            rpc_user_agent: env::var("RPC_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            bot_wallet_address: env::var("BOT_WALLET_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BOT_WALLET.to_string()),
            port: parse_var("PORT", 3001)?,
        })
    }
}

/// Comma separated list of http(s) URLs; order is kept, blanks are skipped.
pub fn parse_endpoints(raw: &str) -> Result<Vec<String>> {
    let mut endpoints = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let url = Url::parse(part).with_context(|| format!("Invalid RPC endpoint: {part}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("RPC endpoint must be http or https: {part}");
        }
        endpoints.push(part.to_string());
    }

    if endpoints.is_empty() {
        bail!("RPC_ENDPOINTS is set but contains no endpoints");
    }
    Ok(endpoints)
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoints_keeps_order() {
        let endpoints =
            parse_endpoints(" https://a.example.com , http://b.example.com:8899,,https://c.example.com")
                .unwrap();
        assert_eq!(
            endpoints,
            [
                "https://a.example.com",
                "http://b.example.com:8899",
                "https://c.example.com"
            ]
        );
    }

    #[test]
    fn test_parse_endpoints_rejects_bad_input() {
        assert!(parse_endpoints("").is_err());
        assert!(parse_endpoints(" , ").is_err());
        assert!(parse_endpoints("not a url").is_err());
        assert!(parse_endpoints("wss://a.example.com").is_err());
    }

    #[test]
    fn test_default_endpoints_parse() {
        let joined = DEFAULT_RPC_ENDPOINTS.join(",");
        assert_eq!(parse_endpoints(&joined).unwrap().len(), 3);
    }
}
