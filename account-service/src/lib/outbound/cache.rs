pub mod refresh_tokens;

pub use refresh_tokens::InMemoryRefreshTokenStore;
