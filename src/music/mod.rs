pub mod catalog;
pub mod profile;
pub mod recommend;
pub mod token;

pub use catalog::{CatalogClient, SpotifyClient, TokenExchange};
pub use recommend::RecommendationEngine;
pub use token::TokenCache;
