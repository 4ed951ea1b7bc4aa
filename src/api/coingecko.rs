use crate::api::fetch::{FetchClient, FetchError};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Named CoinGecko endpoints on top of the retrying client.
#[derive(Debug, Clone)]
pub struct CoingeckoApi {
    fetch: FetchClient,
}

impl CoingeckoApi {
    pub fn new(fetch: FetchClient) -> Self {
        Self { fetch }
    }

    pub async fn markets(&self, params: &[(String, String)]) -> Result<Value, FetchError> {
        self.fetch.get_json("/coins/markets", params).await
    }

    pub async fn categories(&self) -> Result<Value, FetchError> {
        self.fetch.get_json("/coins/categories", &[]).await
    }

    /// One day of price, market cap and volume series for a single coin.
    pub async fn market_chart(&self, id: &str) -> Result<Value, FetchError> {
        let params = [
            ("vs_currency".to_string(), "usd".to_string()),
            ("days".to_string(), "1".to_string()),
        ];
        self.fetch
            .get_json(&format!("/coins/{}/market_chart", id), &params)
            .await
    }

    pub async fn trending(&self) -> Result<Value, FetchError> {
        self.fetch.get_json("/search/trending", &[]).await
    }

    pub async fn coins_list(&self) -> Result<Value, FetchError> {
        self.fetch.get_json("/coins/list", &[]).await
    }

    /// Groups coin ids by upper-cased ticker symbol.
    pub async fn fetch_supported_coins(&self) -> Result<HashMap<String, Vec<String>>, FetchError> {
        let json = self.coins_list().await?;
        Ok(supported_coins_from(&json))
    }
}

/// Builds the symbol map from a `/coins/list` payload, skipping malformed rows.
pub fn supported_coins_from(json: &Value) -> HashMap<String, Vec<String>> {
    let mut coin_map: HashMap<String, Vec<String>> = HashMap::new();
    let Some(coins) = json.as_array() else {
        debug!("Coin list payload is not an array");
        return coin_map;
    };

    debug!("Parsed {} coins from response", coins.len());
    for coin in coins {
        if let (Some(symbol), Some(id)) = (
            coin.get("symbol").and_then(|s| s.as_str()),
            coin.get("id").and_then(|i| i.as_str()),
        ) {
            coin_map
                .entry(symbol.to_uppercase())
                .or_default()
                .push(id.to_string());
        }
    }
    debug!("Created map with {} entries", coin_map.len());
    coin_map
}
