pub mod api;
pub mod parser;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use self::api::LyricsSource;
use crate::cache::TtlCache;
use crate::error::Error;
use crate::models::Track;
use crate::providers::spotify::PROVIDER_NAME;
use crate::resolver::TrackResolver;

#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    pub time: Option<f64>, // seconds, synced lyrics only
    pub text: String,
}

/// Normalized lyrics for one track.
///
/// An empty `lines` doubles as the cached "looked, found nothing" marker, so
/// a cached empty result and a payload that parsed to zero usable lines are
/// indistinguishable on purpose.
#[derive(Debug, Clone)]
pub struct Lyrics {
    pub synced: bool,
    pub provider: &'static str,
    pub lines: Vec<LyricLine>,
}

impl Lyrics {
    fn empty() -> Self {
        Self {
            synced: false,
            provider: PROVIDER_NAME,
            lines: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Fetches and normalizes lyrics for canonical tracks.
///
/// The track is first resolved to its Spotify counterpart, then lyrics are
/// looked up by that id. Misses are cached as empty results so a track
/// without lyrics costs one upstream call per TTL window, not one per play.
pub struct LyricsService {
    resolver: Arc<TrackResolver>,
    source: Arc<dyn LyricsSource>,
    cache: TtlCache<Lyrics>,
    cache_ttl: Duration,
}

impl LyricsService {
    pub fn new(
        resolver: Arc<TrackResolver>,
        source: Arc<dyn LyricsSource>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            resolver,
            source,
            cache: TtlCache::new(),
            cache_ttl,
        }
    }

    pub async fn get_lyrics(&self, track: &Track) -> Result<Arc<Lyrics>, Error> {
        let matched = self.resolver.resolve_track(track).await?.ok_or_else(|| {
            Error::not_found(format!("spotify match for \"{}\"", track.search_query()))
        })?;

        if let Some(entry) = self.cache.get(&matched.id) {
            return match entry {
                Some(lyrics) if !lyrics.is_empty() => Ok(lyrics),
                // Remembered miss, or a payload that parsed to nothing
                _ => Err(self.not_found(track)),
            };
        }

        let payload = match self.source.fetch(&matched.id).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return Err(self.cache_negative(&matched.id, track)),
            Err(e) => {
                // Lyrics being unavailable is routine for this provider, so a
                // failed fetch is remembered as a miss rather than surfaced
                debug!("Lyrics fetch failed for {}: {e:#}", matched.id);
                return Err(self.cache_negative(&matched.id, track));
            }
        };

        match parser::parse_payload(&payload) {
            Ok(lyrics) => {
                let lyrics = Arc::new(lyrics);
                self.cache.insert(
                    matched.id.clone(),
                    Some(Arc::clone(&lyrics)),
                    self.cache_ttl,
                );
                Ok(lyrics)
            }
            Err(e) => {
                error!(payload = %payload, "Failed to parse lyrics payload: {e:#}");
                self.cache.insert(
                    matched.id.clone(),
                    Some(Arc::new(Lyrics::empty())),
                    self.cache_ttl,
                );
                Err(Error::upstream(
                    format!("failed to get lyrics for \"{}\"", track.search_query()),
                    e,
                ))
            }
        }
    }

    fn cache_negative(&self, track_id: &str, track: &Track) -> Error {
        self.cache.insert(
            track_id.to_string(),
            Some(Arc::new(Lyrics::empty())),
            self.cache_ttl,
        );
        self.not_found(track)
    }

    fn not_found(&self, track: &Track) -> Error {
        Error::not_found(format!("lyrics for \"{}\"", track.search_query()))
    }
}

/// A named lyrics backend, for the playback side to pick by name.
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn get_lyrics(&self, track: &Track) -> Result<Arc<Lyrics>, Error>;
}

#[async_trait]
impl LyricsProvider for LyricsService {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn get_lyrics(&self, track: &Track) -> Result<Arc<Lyrics>, Error> {
        LyricsService::get_lyrics(self, track).await
    }
}

/// Lyrics backends by name, handed to whatever orchestrates playback.
#[derive(Default)]
pub struct LyricsRegistry {
    providers: HashMap<&'static str, Arc<dyn LyricsProvider>>,
}

impl LyricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn LyricsProvider>) {
        self.providers.insert(provider.name(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LyricsProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.keys().copied().collect()
    }
}
