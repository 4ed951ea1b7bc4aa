pub mod price_service;
pub mod proxy;
