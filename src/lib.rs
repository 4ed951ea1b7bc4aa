pub mod api;
pub mod config;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;

// Re-export commonly used items
pub use api::coingecko::CoingeckoApi;
pub use api::fetch::{FetchClient, FetchError, RetryPolicy};
pub use config::Config;
pub use models::cache::ResponseCache;
pub use services::price_service::PriceService;
pub use services::proxy::{ProxyError, ProxyService};
