use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const LYRICS_API_URL: &str = "https://spotify-lyrics-api.fly.dev/";

/// Raw lyric payloads keyed by the resolved Spotify track id.
///
/// The upstream endpoint answers HTTP 200 with an in-body `error` flag when
/// it has nothing. Implementations fold that into a clean signal: `Ok(None)`
/// for a confirmed "no lyrics", `Err` for transport-level trouble,
/// `Ok(Some(payload))` otherwise.
#[async_trait]
pub trait LyricsSource: Send + Sync {
    async fn fetch(&self, track_id: &str) -> Result<Option<Value>>;
}

#[derive(Clone)]
pub struct LyricsApiClient {
    client: reqwest::Client,
}

impl Default for LyricsApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LyricsApiClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("trackbridge/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        Self { client }
    }
}

#[async_trait]
impl LyricsSource for LyricsApiClient {
    async fn fetch(&self, track_id: &str) -> Result<Option<Value>> {
        let response = self
            .client
            .get(format!("{LYRICS_API_URL}?trackid={track_id}"))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("Lyrics fetch failed: {} - {}", status, error_text));
        }

        let payload: Value = response.json().await?;
        if payload
            .get("error")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            return Ok(None);
        }

        Ok(Some(payload))
    }
}
