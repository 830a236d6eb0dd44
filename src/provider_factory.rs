use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::lyrics::api::LyricsApiClient;
use crate::lyrics::{LyricsRegistry, LyricsService};
use crate::providers::spotify::{SpotifyApi, SpotifySession};
use crate::resolver::TrackResolver;

/// The Spotify side of the bridge, wired together once at startup and handed
/// around by reference.
pub struct SpotifyStack {
    pub session: Arc<SpotifySession>,
    pub resolver: Arc<TrackResolver>,
    pub lyrics: Arc<LyricsService>,
    pub registry: LyricsRegistry,
}

pub fn create_spotify_stack(config: &Config) -> SpotifyStack {
    let session = match (&config.spotify_client_id, &config.spotify_client_secret) {
        (Some(id), Some(secret)) => Arc::new(SpotifySession::new(id.clone(), secret.clone())),
        _ => {
            warn!("Spotify credentials not configured, track resolution disabled");
            Arc::new(SpotifySession::unconfigured())
        }
    };

    let search = Arc::new(SpotifyApi::new(Arc::clone(&session)));
    let resolver = Arc::new(TrackResolver::new(
        Arc::clone(&session),
        search,
        config.track_cache_ttl(),
    ));
    let lyrics = Arc::new(LyricsService::new(
        Arc::clone(&resolver),
        Arc::new(LyricsApiClient::new()),
        config.lyrics_cache_ttl(),
    ));

    let mut registry = LyricsRegistry::new();
    registry.register(lyrics.clone());

    SpotifyStack {
        session,
        resolver,
        lyrics,
        registry,
    }
}
