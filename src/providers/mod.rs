use anyhow::Result;
use async_trait::async_trait;

use crate::models::TrackMatch;

pub mod spotify;

/// A fresh application token from an OAuth client-credentials grant.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: u64, // seconds
}

/// Identity provider capable of the client-credentials flow.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn client_credentials_grant(&self) -> Result<TokenGrant>;
}

/// Track search on the secondary provider, results in provider ranking order.
#[async_trait]
pub trait TrackSearch: Send + Sync {
    async fn search_tracks(&self, query: &str) -> Result<Vec<TrackMatch>>;
}
