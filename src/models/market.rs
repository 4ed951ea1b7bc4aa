//! Read-only views over upstream market payloads.
//!
//! The upstream schema is consumed as-is; missing or null numbers read as
//! `0.0` and missing strings as `""`.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct MarketRow {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
    pub price_change_24h: f64,
}

impl MarketRow {
    pub fn from_value(json: &Value) -> Self {
        Self {
            id: text(json, "id"),
            symbol: text(json, "symbol").to_uppercase(),
            name: text(json, "name"),
            current_price: number(json, "current_price"),
            market_cap: number(json, "market_cap"),
            total_volume: number(json, "total_volume"),
            price_change_24h: json
                .get("price_change_percentage_24h_in_currency")
                .and_then(Value::as_f64)
                .unwrap_or_else(|| number(json, "price_change_percentage_24h")),
        }
    }

    pub fn list(json: &Value) -> Vec<Self> {
        json.as_array()
            .map(|rows| rows.iter().map(Self::from_value).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub name: String,
    pub market_cap: f64,
    pub market_cap_change_24h: f64,
    pub volume_24h: f64,
}

impl CategoryRow {
    pub fn from_value(json: &Value) -> Self {
        Self {
            name: text(json, "name"),
            market_cap: number(json, "market_cap"),
            market_cap_change_24h: number(json, "market_cap_change_24h"),
            volume_24h: number(json, "volume_24h"),
        }
    }

    pub fn list(json: &Value) -> Vec<Self> {
        json.as_array()
            .map(|rows| rows.iter().map(Self::from_value).collect())
            .unwrap_or_default()
    }
}

/// `(name, symbol, market_cap_rank)` for each coin in a `/search/trending` payload.
pub fn trending_coins(json: &Value) -> Vec<(String, String, Option<u64>)> {
    json.get("coins")
        .and_then(Value::as_array)
        .map(|coins| {
            coins
                .iter()
                .filter_map(|c| c.get("item"))
                .map(|item| {
                    (
                        text(item, "name"),
                        text(item, "symbol").to_uppercase(),
                        item.get("market_cap_rank").and_then(Value::as_u64),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

fn number(json: &Value, field: &str) -> f64 {
    json.get(field).and_then(Value::as_f64).unwrap_or(0.0)
}

fn text(json: &Value, field: &str) -> String {
    json.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn market_row_reads_fields() {
        let row = MarketRow::from_value(&json!({
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 64000.5,
            "market_cap": 1.2e12,
            "total_volume": 3.4e10,
            "price_change_percentage_24h": -1.25
        }));
        assert_eq!(row.symbol, "BTC");
        assert_eq!(row.current_price, 64000.5);
        assert_eq!(row.price_change_24h, -1.25);
    }

    #[test]
    fn market_row_prefers_requested_change_field() {
        let row = MarketRow::from_value(&json!({
            "price_change_percentage_24h": 1.0,
            "price_change_percentage_24h_in_currency": 2.0
        }));
        assert_eq!(row.price_change_24h, 2.0);
    }

    #[test]
    fn nulls_and_gaps_fall_back() {
        let row = MarketRow::from_value(&json!({
            "id": "new-coin",
            "current_price": null,
            "market_cap": "not a number"
        }));
        assert_eq!(row.name, "");
        assert_eq!(row.current_price, 0.0);
        assert_eq!(row.market_cap, 0.0);
        assert_eq!(row.price_change_24h, 0.0);
    }

    #[test]
    fn category_list_ignores_non_arrays() {
        assert!(CategoryRow::list(&json!({"status": "error"})).is_empty());
        let rows = CategoryRow::list(&json!([{"name": "Layer 1", "market_cap": 10.0}]));
        assert_eq!(rows[0].name, "Layer 1");
        assert_eq!(rows[0].volume_24h, 0.0);
    }

    #[test]
    fn trending_extracts_items() {
        let payload = json!({"coins": [
            {"item": {"name": "Pepe", "symbol": "pepe", "market_cap_rank": 40}},
            {"item": {"name": "Fresh", "symbol": "frsh"}}
        ]});
        let coins = trending_coins(&payload);
        assert_eq!(coins[0], ("Pepe".to_string(), "PEPE".to_string(), Some(40)));
        assert_eq!(coins[1].2, None);
    }
}
