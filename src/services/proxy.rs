use crate::api::coingecko::CoingeckoApi;
use crate::api::fetch::FetchError;
use crate::models::cache::ResponseCache;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Query parameters sent to `/coins/markets` unless the caller overrides them.
const MARKETS_DEFAULTS: &[(&str, &str)] = &[
    ("vs_currency", "usd"),
    ("order", "market_cap_desc"),
    ("per_page", "100"),
    ("page", "1"),
    ("sparkline", "false"),
    ("price_change_percentage", "24h"),
];

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Cached front for the upstream endpoints the dashboard reads.
///
/// One cache slot per endpoint; only markets is keyed (by raw query string).
pub struct ProxyService {
    api: CoingeckoApi,
    markets: ResponseCache,
    categories: ResponseCache,
    trending: ResponseCache,
    coins_list: ResponseCache,
}

impl ProxyService {
    pub fn new(api: CoingeckoApi, ttl: Duration) -> Self {
        Self {
            api,
            markets: ResponseCache::new("markets", ttl),
            categories: ResponseCache::new("categories", ttl),
            trending: ResponseCache::new("trending", ttl),
            coins_list: ResponseCache::new("coins_list", ttl),
        }
    }

    /// `raw_query` is the inbound query string verbatim and doubles as the cache key.
    pub async fn markets(&self, raw_query: &str, params: &[(String, String)]) -> Result<Value, ProxyError> {
        if let Some(hit) = self.markets.get(Some(raw_query)) {
            return Ok(hit);
        }

        let upstream = with_market_defaults(params);
        info!(query = raw_query, "Fetching markets from upstream");
        let json = self.api.markets(&upstream).await?;
        self.markets.put(Some(raw_query.to_string()), json.clone());
        Ok(json)
    }

    pub async fn categories(&self) -> Result<Value, ProxyError> {
        if let Some(hit) = self.categories.get(None) {
            return Ok(hit);
        }

        info!("Fetching categories from upstream");
        let json = self.api.categories().await?;
        self.categories.put(None, json.clone());
        Ok(json)
    }

    pub async fn trending(&self) -> Result<Value, ProxyError> {
        if let Some(hit) = self.trending.get(None) {
            return Ok(hit);
        }

        let json = self.api.trending().await?;
        self.trending.put(None, json.clone());
        Ok(json)
    }

    pub async fn coins_list(&self) -> Result<Value, ProxyError> {
        if let Some(hit) = self.coins_list.get(None) {
            return Ok(hit);
        }

        let json = self.api.coins_list().await?;
        self.coins_list.put(None, json.clone());
        Ok(json)
    }

    /// Uncached one-day volume series for a coin.
    pub async fn coin_chart(&self, id: &str) -> Result<Value, ProxyError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ProxyError::Validation("Missing coin id".to_string()));
        }
        if !is_coin_id(id) {
            return Err(ProxyError::Validation(format!("Invalid coin id: {}", id)));
        }

        debug!(coin = id, "Fetching market chart");
        let chart = self.api.market_chart(id).await?;
        let total_volumes = chart
            .get("total_volumes")
            .cloned()
            .unwrap_or_else(|| json!([]));
        Ok(json!({ "total_volumes": total_volumes }))
    }
}

/// Coin ids are slugs like `bitcoin` or `usd-coin`; anything else could
/// rewrite the upstream path or query.
fn is_coin_id(id: &str) -> bool {
    id.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn with_market_defaults(params: &[(String, String)]) -> Vec<(String, String)> {
    let mut merged = params.to_vec();
    for (key, value) in MARKETS_DEFAULTS {
        if !params.iter().any(|(k, _)| k == key) {
            merged.push((key.to_string(), value.to_string()));
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fetch::{FetchClient, RetryPolicy};

    fn unreachable_service() -> ProxyService {
        let fetch = FetchClient::new(reqwest::Client::new(), "http://127.0.0.1:9", RetryPolicy::default());
        ProxyService::new(CoingeckoApi::new(fetch), Duration::from_secs(30))
    }

    #[test]
    fn defaults_fill_only_missing_params() {
        let params = vec![
            ("vs_currency".to_string(), "eur".to_string()),
            ("ids".to_string(), "bitcoin,ethereum".to_string()),
        ];
        let merged = with_market_defaults(&params);

        assert_eq!(merged.iter().filter(|(k, _)| k == "vs_currency").count(), 1);
        assert!(merged.contains(&("vs_currency".to_string(), "eur".to_string())));
        assert!(merged.contains(&("price_change_percentage".to_string(), "24h".to_string())));
        assert_eq!(merged.len(), 2 + MARKETS_DEFAULTS.len() - 1);
    }

    #[tokio::test]
    async fn blank_chart_id_is_rejected_before_fetching() {
        let service = unreachable_service();
        for id in ["", "   "] {
            match service.coin_chart(id).await {
                Err(ProxyError::Validation(msg)) => assert_eq!(msg, "Missing coin id"),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn chart_id_must_be_a_single_slug() {
        let service = unreachable_service();
        for id in ["list?", "../list?", "bitcoin/tickers", "a b", "bit.coin"] {
            match service.coin_chart(id).await {
                Err(ProxyError::Validation(msg)) => assert!(msg.starts_with("Invalid coin id"), "{msg}"),
                other => panic!("expected validation error for {id:?}, got {other:?}"),
            }
        }
        assert!(is_coin_id("usd-coin"));
        assert!(is_coin_id("wrapped_steth"));
    }

    #[tokio::test]
    async fn cached_markets_skip_the_upstream() {
        let service = unreachable_service();
        service.markets.put(Some("page=2".into()), json!([{"id": "bitcoin"}]));

        let json = service.markets("page=2", &[]).await.unwrap();
        assert_eq!(json, json!([{"id": "bitcoin"}]));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_existing_entry() {
        let service = unreachable_service();
        service.markets.put(Some("page=1".into()), json!(["old"]));

        assert!(service.markets("page=2", &[]).await.is_err());
        assert_eq!(service.markets.get(Some("page=1")), Some(json!(["old"])));
    }
}
