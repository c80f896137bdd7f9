// External API clients

pub mod kraken_api;

// Re-export client types
pub use kraken_api::{KrakenCredentials, KrakenRestClient, KRAKEN_REST_URL};
