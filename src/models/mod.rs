use serde::{Deserialize, Serialize};

/// A canonical track as supplied by the player side of the bridge.
///
/// Immutable after construction; the resolver only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub duration: u32, // seconds
    pub artwork_url: Option<String>,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artists: Vec<String>,
        duration: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artists,
            duration,
            artwork_url: None,
        }
    }

    /// Get all artist names joined
    pub fn all_artists(&self) -> String {
        if self.artists.is_empty() {
            "Unknown Artist".to_string()
        } else {
            self.artists.join(", ")
        }
    }

    /// Search string sent to the secondary provider
    pub fn search_query(&self) -> String {
        format!("{} - {}", self.title, self.all_artists())
    }

    /// Format duration in seconds as MM:SS or H:MM:SS
    pub fn format_duration(seconds: u32) -> String {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        let secs = seconds % 60;

        if hours > 0 {
            format!("{hours}:{minutes:02}:{secs:02}")
        } else {
            format!("{minutes}:{secs:02}")
        }
    }
}

/// A track as Spotify returned it from search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMatch {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub duration_ms: u64,
    pub artwork_url: Option<String>,
}

impl TrackMatch {
    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }

    pub fn all_artists(&self) -> String {
        if self.artists.is_empty() {
            "Unknown Artist".to_string()
        } else {
            self.artists.join(", ")
        }
    }
}
