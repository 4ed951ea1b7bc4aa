use crate::api::coingecko::DEFAULT_BASE_URL;
use crate::api::fetch::RetryPolicy;
use clap::Args;
use std::net::SocketAddr;
use std::time::Duration;

/// Runtime settings, read from flags with `MARKET_PROXY_*` environment fallbacks.
#[derive(Args, Debug, Clone)]
pub struct Config {
    #[arg(long, env = "MARKET_PROXY_BIND", default_value = "0.0.0.0:3000", help = "Address the proxy listens on.")]
    pub bind: SocketAddr,

    #[arg(long, env = "MARKET_PROXY_UPSTREAM_URL", default_value = DEFAULT_BASE_URL, help = "Base URL of the market-data API.")]
    pub upstream_url: String,

    #[arg(long, env = "MARKET_PROXY_MAX_RETRIES", default_value_t = 3, help = "Retries for 429/5xx upstream responses.")]
    pub max_retries: u32,

    #[arg(long, env = "MARKET_PROXY_RETRY_BASE_MS", default_value_t = 500, help = "First backoff delay in milliseconds; doubles per retry.")]
    pub retry_base_ms: u64,

    #[arg(long, env = "MARKET_PROXY_CACHE_TTL_MS", default_value_t = 30_000, help = "Lifetime of cached upstream responses in milliseconds.")]
    pub cache_ttl_ms: u64,

    #[arg(long, env = "MARKET_PROXY_REQUEST_TIMEOUT_SECS", help = "Overall timeout for each upstream request.")]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, env = "MARKET_PROXY_LOG_LEVEL", default_value = "info", help = "Log filter used when RUST_LOG is unset.")]
    pub log_level: String,
}

impl Config {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_ms),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn defaults_match_the_documented_policy() {
        let config = TestCli::parse_from(["market_proxy"]).config;
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.cache_ttl(), Duration::from_secs(30));
        assert_eq!(config.upstream_url, DEFAULT_BASE_URL);
        assert_eq!(config.bind.port(), 3000);
    }

    #[test]
    fn flags_override_defaults() {
        let config = TestCli::parse_from([
            "market_proxy",
            "--max-retries",
            "1",
            "--retry-base-ms",
            "10",
            "--cache-ttl-ms",
            "5000",
        ])
        .config;
        assert_eq!(config.retry_policy().max_retries, 1);
        assert_eq!(config.retry_policy().base_delay, Duration::from_millis(10));
        assert_eq!(config.cache_ttl(), Duration::from_secs(5));
    }
}
