use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::auth::SpotifySession;
use crate::models::TrackMatch;
use crate::providers::TrackSearch;

const API_BASE_URL: &str = "https://api.spotify.com/v1";
const SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TracksPage>,
}

#[derive(Debug, Deserialize)]
struct TracksPage {
    items: Vec<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    id: String,
    name: String,
    duration_ms: u64,
    artists: Vec<ApiArtist>,
    album: Option<ApiAlbum>,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    images: Vec<ApiImage>,
}

#[derive(Debug, Deserialize)]
struct ApiImage {
    url: String,
}

impl ApiTrack {
    fn into_match(self) -> TrackMatch {
        TrackMatch {
            id: self.id,
            title: self.name,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
            // Spotify lists album images largest first
            artwork_url: self
                .album
                .and_then(|album| album.images.into_iter().next())
                .map(|image| image.url),
            duration_ms: self.duration_ms,
        }
    }
}

pub struct SpotifyApi {
    client: reqwest::Client,
    session: Arc<SpotifySession>,
}

impl SpotifyApi {
    pub fn new(session: Arc<SpotifySession>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("trackbridge/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        Self { client, session }
    }
}

#[async_trait]
impl TrackSearch for SpotifyApi {
    async fn search_tracks(&self, query: &str) -> Result<Vec<TrackMatch>> {
        let token = self
            .session
            .token()
            .ok_or_else(|| anyhow!("no Spotify access token available"))?;

        let encoded_query = urlencoding::encode(query);
        let response = self
            .client
            .get(format!(
                "{API_BASE_URL}/search?type=track&q={encoded_query}&limit={SEARCH_LIMIT}"
            ))
            .bearer_auth(&token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("Search failed: {} - {}", status, error_text));
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed
            .tracks
            .map(|page| page.items.into_iter().map(ApiTrack::into_match).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_search_response() {
        let body = json!({
            "tracks": {
                "items": [
                    {
                        "id": "3k2jqVq4uD1eUmbhMCHfIo",
                        "name": "Kaleidoscopic Waves",
                        "duration_ms": 252293,
                        "artists": [{"id": "abc", "name": "Fallujah"}],
                        "album": {
                            "name": "Xenotaph",
                            "images": [
                                {"url": "https://i.scdn.co/image/640.jpg", "width": 640},
                                {"url": "https://i.scdn.co/image/300.jpg", "width": 300}
                            ]
                        }
                    },
                    {
                        "id": "5E30LdtzQTGqRvNd7l6kG5",
                        "name": "Kaleidoscopic Waves (Live)",
                        "duration_ms": 260000,
                        "artists": [
                            {"name": "Fallujah"},
                            {"name": "Guest"}
                        ]
                    }
                ]
            }
        });

        let parsed: SearchResponse = serde_json::from_value(body).unwrap();
        let matches: Vec<TrackMatch> = parsed
            .tracks
            .unwrap()
            .items
            .into_iter()
            .map(ApiTrack::into_match)
            .collect();

        // Provider order is preserved
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "3k2jqVq4uD1eUmbhMCHfIo");
        assert_eq!(matches[0].title, "Kaleidoscopic Waves");
        assert_eq!(matches[0].duration_ms, 252293);
        assert_eq!(matches[0].artists, vec!["Fallujah".to_string()]);
        assert_eq!(
            matches[0].artwork_url.as_deref(),
            Some("https://i.scdn.co/image/640.jpg")
        );

        // Missing album means no artwork, not a decode failure
        assert_eq!(matches[1].artists.len(), 2);
        assert!(matches[1].artwork_url.is_none());
    }

    #[test]
    fn test_decode_empty_search_response() {
        let parsed: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.tracks.is_none());

        let parsed: SearchResponse =
            serde_json::from_value(json!({"tracks": {"items": []}})).unwrap();
        assert!(parsed.tracks.unwrap().items.is_empty());
    }
}
