//! Concrete [`MarketDataSource`](crate::MarketDataSource) implementations.

pub mod fixture;
pub mod yahoo;

pub use fixture::FixtureSource;
pub use yahoo::YahooSource;
