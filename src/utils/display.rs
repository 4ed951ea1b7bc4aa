use crate::models::market::{CategoryRow, MarketRow};
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};

#[derive(Default)]
pub struct DisplayFormatter;

impl DisplayFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_header(&self, text: &str) -> String {
        format!("\n=== {} ===", text.bright_white().bold())
    }

    fn table(&self, headers: &[&str], rows: &[Vec<String>]) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.set_titles(Row::new(
            headers.iter().map(|h| Cell::new(h).style_spec("b")).collect(),
        ));
        for row in rows {
            table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
        }
        table.to_string()
    }

    pub fn format_markets_table(&self, rows: &[MarketRow]) -> String {
        let body: Vec<Vec<String>> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                vec![
                    (i + 1).to_string(),
                    format!("{} ({})", row.name, row.symbol),
                    self.format_currency(row.current_price),
                    self.format_colored_change(row.price_change_24h),
                    self.format_compact(row.market_cap),
                    self.format_compact(row.total_volume),
                ]
            })
            .collect();
        self.table(
            &["#", "Coin", "Price", "24h", "Market Cap", "Volume"],
            &body,
        )
    }

    pub fn format_categories_table(&self, rows: &[CategoryRow]) -> String {
        let body: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                vec![
                    row.name.clone(),
                    self.format_compact(row.market_cap),
                    self.format_colored_change(row.market_cap_change_24h),
                    self.format_compact(row.volume_24h),
                ]
            })
            .collect();
        self.table(&["Category", "Market Cap", "24h", "Volume"], &body)
    }

    pub fn format_colored_change(&self, change: f64) -> String {
        if change >= 0.0 {
            format!("+{:.2}%", change).green().to_string()
        } else {
            format!("{:.2}%", change).red().to_string()
        }
    }

    pub fn format_currency(&self, amount: f64) -> String {
        if amount >= 1.0 {
            format!("${:.2}", amount)
        } else {
            format!("${:.6}", amount)
        }
    }

    /// Dollar amount with a T/B/M/K suffix.
    pub fn format_compact(&self, amount: f64) -> String {
        const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
        for (scale, suffix) in UNITS {
            if amount.abs() >= scale {
                return format!("${:.2}{}", amount / scale, suffix);
            }
        }
        format!("${:.2}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_precision_depends_on_magnitude() {
        let d = DisplayFormatter::new();
        assert_eq!(d.format_currency(64000.456), "$64000.46");
        assert_eq!(d.format_currency(0.00001234), "$0.000012");
    }

    #[test]
    fn compact_suffixes() {
        let d = DisplayFormatter::new();
        assert_eq!(d.format_compact(1.25e12), "$1.25T");
        assert_eq!(d.format_compact(3.4e9), "$3.40B");
        assert_eq!(d.format_compact(999.0), "$999.00");
    }

    #[test]
    fn change_sign_is_explicit() {
        colored::control::set_override(false);
        let d = DisplayFormatter::new();
        assert_eq!(d.format_colored_change(1.234), "+1.23%");
        assert_eq!(d.format_colored_change(-0.5), "-0.50%");
    }

    #[test]
    fn markets_table_lists_each_row() {
        let d = DisplayFormatter::new();
        let rows = vec![MarketRow {
            id: "bitcoin".into(),
            symbol: "BTC".into(),
            name: "Bitcoin".into(),
            current_price: 64000.0,
            market_cap: 1.2e12,
            total_volume: 3.0e10,
            price_change_24h: 2.0,
        }];
        let table = d.format_markets_table(&rows);
        assert!(table.contains("Bitcoin (BTC)"));
        assert!(table.contains("$1.20T"));
    }
}
