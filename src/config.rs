use std::time::Duration;

const DEFAULT_TRACK_CACHE_MINUTES: u64 = 30;
const DEFAULT_LYRICS_CACHE_MINUTES: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub track_cache_minutes: u64,
    pub lyrics_cache_minutes: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let spotify_client_id = std::env::var("SPOTIFY_CLIENT_ID").ok();
        let spotify_client_secret = std::env::var("SPOTIFY_CLIENT_SECRET").ok();

        Self {
            spotify_client_id,
            spotify_client_secret,
            track_cache_minutes: minutes_var("TRACK_CACHE_MINUTES", DEFAULT_TRACK_CACHE_MINUTES),
            lyrics_cache_minutes: minutes_var("LYRICS_CACHE_MINUTES", DEFAULT_LYRICS_CACHE_MINUTES),
        }
    }

    pub fn has_spotify_credentials(&self) -> bool {
        self.spotify_client_id.is_some() && self.spotify_client_secret.is_some()
    }

    pub fn track_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.track_cache_minutes * 60)
    }

    pub fn lyrics_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.lyrics_cache_minutes * 60)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spotify_client_id: None,
            spotify_client_secret: None,
            track_cache_minutes: DEFAULT_TRACK_CACHE_MINUTES,
            lyrics_cache_minutes: DEFAULT_LYRICS_CACHE_MINUTES,
        }
    }
}

fn minutes_var(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
