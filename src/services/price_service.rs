use crate::api::coingecko::supported_coins_from;
use crate::models::market::{trending_coins, CategoryRow, MarketRow};
use crate::services::proxy::{ProxyError, ProxyService};
use crate::utils::display::DisplayFormatter;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

const CONSOLE_PAGE_SIZE: u32 = 20;
const MAX_IDS_PER_SYMBOL: usize = 5;

/// Terminal views over the cached proxy endpoints.
pub struct PriceService {
    proxy: Arc<ProxyService>,
    display: DisplayFormatter,
}

impl PriceService {
    pub fn new(proxy: Arc<ProxyService>) -> Self {
        Self {
            proxy,
            display: DisplayFormatter::new(),
        }
    }

    pub async fn markets_page(&self, page: u32) -> Result<String, ProxyError> {
        let params = vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), CONSOLE_PAGE_SIZE.to_string()),
        ];
        let raw = encode_query(&params);
        let json = self.proxy.markets(&raw, &params).await?;
        let rows = MarketRow::list(&json);

        Ok(format!(
            "{}\n{}",
            self.display.format_header(&format!("Markets (page {})", page)),
            self.display.format_markets_table(&rows)
        ))
    }

    pub async fn categories(&self) -> Result<String, ProxyError> {
        let json = self.proxy.categories().await?;
        let mut rows = CategoryRow::list(&json);
        rows.sort_by(|a, b| b.market_cap.total_cmp(&a.market_cap));
        rows.truncate(CONSOLE_PAGE_SIZE as usize);

        Ok(format!(
            "{}\n{}",
            self.display.format_header("Top Categories"),
            self.display.format_categories_table(&rows)
        ))
    }

    pub async fn trending(&self) -> Result<String, ProxyError> {
        let json = self.proxy.trending().await?;
        let mut output = vec![self.display.format_header("Trending")];
        for (name, symbol, rank) in trending_coins(&json) {
            let rank = rank.map_or_else(|| "-".to_string(), |r| format!("#{}", r));
            output.push(format!("{:<6} {:<8} {}", rank, symbol, name));
        }
        Ok(output.join("\n"))
    }

    pub async fn supported_coins(&self) -> Result<HashMap<String, Vec<String>>, ProxyError> {
        let json = self.proxy.coins_list().await?;
        Ok(supported_coins_from(&json))
    }

    /// Market rows for the coins trading under `symbol`, skipping wrapped and bridged variants.
    pub async fn symbol_summary(&self, symbol: &str) -> Result<String, ProxyError> {
        info!("Fetching prices for symbol: {}", symbol);
        let coins = self.supported_coins().await?;
        let ids = market_ids_for(symbol, &coins)?;

        let params = vec![("ids".to_string(), ids)];
        let raw = encode_query(&params);
        let json = self.proxy.markets(&raw, &params).await?;
        let rows = MarketRow::list(&json);

        Ok(format!(
            "{}\n{}",
            self.display.format_header(&symbol.to_uppercase()),
            self.display.format_markets_table(&rows)
        ))
    }
}

/// Comma-joined ids to query for `symbol`, excluding derivative listings.
fn market_ids_for(symbol: &str, coins: &HashMap<String, Vec<String>>) -> Result<String, ProxyError> {
    let ids = coins
        .get(&symbol.to_uppercase())
        .ok_or_else(|| ProxyError::Validation(format!("Unsupported coin symbol: {}", symbol)))?;

    let filtered: Vec<&str> = ids
        .iter()
        .map(String::as_str)
        .filter(|id| !is_derivative_listing(id))
        .take(MAX_IDS_PER_SYMBOL)
        .collect();

    if filtered.is_empty() {
        return Err(ProxyError::Validation(format!(
            "No native listings for symbol: {}",
            symbol
        )));
    }
    Ok(filtered.join(","))
}

fn is_derivative_listing(id: &str) -> bool {
    ["wrapped", "bridged", "starkgate", "wormhole"]
        .iter()
        .any(|marker| id.contains(marker))
}

/// `k=v&k=v` form used as the markets cache key for console queries.
fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v.replace(',', "%2C")))
        .collect::<Vec<_>>()
        .join("&")
}
