pub mod api;
pub mod auth;

pub use api::SpotifyApi;
pub use auth::{AccountsClient, SpotifySession};

pub const PROVIDER_NAME: &str = "spotify";
