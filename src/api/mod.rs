pub mod coingecko;
pub mod fetch;
