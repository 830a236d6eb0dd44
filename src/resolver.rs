use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::cache::TtlCache;
use crate::error::Error;
use crate::matcher;
use crate::models::{Track, TrackMatch};
use crate::providers::spotify::SpotifySession;
use crate::providers::TrackSearch;

/// What the caller wants resolved: a canonical track, matched by duration,
/// or a bare query string where the provider's top result has to do.
pub enum ResolveRequest<'a> {
    Track(&'a Track),
    Query(&'a str),
}

impl ResolveRequest<'_> {
    fn cache_key(&self) -> &str {
        match self {
            Self::Track(track) => &track.id,
            Self::Query(query) => query,
        }
    }

    fn search_text(&self) -> String {
        match self {
            Self::Track(track) => track.search_query(),
            Self::Query(query) => (*query).to_string(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Track(track) => format!("track \"{}\"", track.search_query()),
            Self::Query(query) => format!("query \"{query}\""),
        }
    }
}

/// Finds the Spotify counterpart of a canonical track.
///
/// Outcomes are remembered either way: a hit keeps the matched track for the
/// conversion TTL, a miss keeps an explicit negative so known-unmatchable
/// tracks don't hammer the search endpoint.
pub struct TrackResolver {
    session: Arc<SpotifySession>,
    search: Arc<dyn TrackSearch>,
    cache: TtlCache<TrackMatch>,
    cache_ttl: Duration,
}

impl TrackResolver {
    pub fn new(
        session: Arc<SpotifySession>,
        search: Arc<dyn TrackSearch>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            session,
            search,
            cache: TtlCache::new(),
            cache_ttl,
        }
    }

    pub async fn resolve_track(&self, track: &Track) -> Result<Option<Arc<TrackMatch>>, Error> {
        self.resolve(ResolveRequest::Track(track)).await
    }

    pub async fn resolve_query(&self, query: &str) -> Result<Option<Arc<TrackMatch>>, Error> {
        self.resolve(ResolveRequest::Query(query)).await
    }

    pub async fn resolve(
        &self,
        request: ResolveRequest<'_>,
    ) -> Result<Option<Arc<TrackMatch>>, Error> {
        if let Some(entry) = self.cache.get(request.cache_key()) {
            debug!(
                key = request.cache_key(),
                matched = entry.is_some(),
                "Conversion cache hit"
            );
            return Ok(entry);
        }

        // Credentials gate sits in front of every network call
        self.session.ensure_ready().await?;

        let candidates = self
            .search
            .search_tracks(&request.search_text())
            .await
            .map_err(|e| {
                Error::upstream(format!("search failed for {}", request.describe()), e)
            })?;

        let matched = match &request {
            ResolveRequest::Track(track) => {
                matcher::find_duration_match(track, &candidates).cloned()
            }
            ResolveRequest::Query(_) => candidates.into_iter().next(),
        };

        if matched.is_none() {
            debug!("No match for {}", request.describe());
        }

        let matched = matched.map(Arc::new);
        self.cache
            .insert(request.cache_key(), matched.clone(), self.cache_ttl);
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::providers::{TokenGrant, TokenSource};

    struct FakeTokens;

    #[async_trait]
    impl TokenSource for FakeTokens {
        async fn client_credentials_grant(&self) -> Result<TokenGrant> {
            Ok(TokenGrant {
                access_token: "token".to_string(),
                expires_in: 3600,
            })
        }
    }

    struct FakeSearch {
        calls: AtomicUsize,
        results: Vec<TrackMatch>,
        fail: bool,
    }

    impl FakeSearch {
        fn returning(results: Vec<TrackMatch>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                results,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                results: Vec::new(),
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TrackSearch for FakeSearch {
        async fn search_tracks(&self, _query: &str) -> Result<Vec<TrackMatch>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("socket closed"));
            }
            Ok(self.results.clone())
        }
    }

    fn canonical() -> Track {
        Track::new("canonical-1", "Song", vec!["Artist".to_string()], 200)
    }

    fn candidate(id: &str, duration_ms: u64) -> TrackMatch {
        TrackMatch {
            id: id.to_string(),
            title: "Song".to_string(),
            artists: vec!["Artist".to_string()],
            duration_ms,
            artwork_url: None,
        }
    }

    async fn ready_session() -> Arc<SpotifySession> {
        let session = Arc::new(SpotifySession::with_source(Arc::new(FakeTokens)));
        session.refresh().await.unwrap();
        session
    }

    fn resolver(session: Arc<SpotifySession>, search: Arc<FakeSearch>) -> TrackResolver {
        TrackResolver::new(session, search, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_unconfigured_fails_before_search() {
        let search = FakeSearch::returning(vec![candidate("a", 200_000)]);
        let resolver = resolver(Arc::new(SpotifySession::unconfigured()), search.clone());

        let err = resolver.resolve_track(&canonical()).await.unwrap_err();
        assert!(matches!(err, Error::Unconfigured("spotify")));
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_match_is_cached_and_identical() {
        let search = FakeSearch::returning(vec![candidate("a", 200_500)]);
        let resolver = resolver(ready_session().await, search.clone());
        let track = canonical();

        let first = resolver.resolve_track(&track).await.unwrap().unwrap();
        assert_eq!(first.id, "a");
        assert_eq!(search.calls(), 1);

        // Second call inside the TTL: same object, no second search
        let second = resolver.resolve_track(&track).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(search.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_result_is_cached_until_ttl() {
        let search = FakeSearch::returning(vec![candidate("a", 260_000)]);
        let resolver = resolver(ready_session().await, search.clone());
        let track = canonical();

        assert!(resolver.resolve_track(&track).await.unwrap().is_none());
        assert_eq!(search.calls(), 1);

        assert!(resolver.resolve_track(&track).await.unwrap().is_none());
        assert_eq!(search.calls(), 1);

        // Past the TTL the search is attempted again
        tokio::time::advance(Duration::from_secs(61)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert!(resolver.resolve_track(&track).await.unwrap().is_none());
        assert_eq!(search.calls(), 2);
    }

    #[tokio::test]
    async fn test_search_failure_is_wrapped_with_track_context() {
        let search = FakeSearch::failing();
        let resolver = resolver(ready_session().await, search);

        let err = resolver.resolve_track(&canonical()).await.unwrap_err();
        match err {
            Error::Upstream { context, .. } => {
                assert_eq!(context, "search failed for track \"Song - Artist\"");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_failure_is_wrapped_with_query_context() {
        let search = FakeSearch::failing();
        let resolver = resolver(ready_session().await, search);

        let err = resolver.resolve_query("some song").await.unwrap_err();
        match err {
            Error::Upstream { context, .. } => {
                assert_eq!(context, "search failed for query \"some song\"");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_raw_query_takes_top_result() {
        let search = FakeSearch::returning(vec![
            candidate("top", 111_000),
            candidate("second", 222_000),
        ]);
        let resolver = resolver(ready_session().await, search);

        let matched = resolver.resolve_query("anything").await.unwrap().unwrap();
        assert_eq!(matched.id, "top");
    }

    #[tokio::test]
    async fn test_first_candidate_within_tolerance_wins() {
        let search = FakeSearch::returning(vec![
            candidate("too-long", 260_000),
            candidate("close-enough", 201_500),
            candidate("exact", 200_000),
        ]);
        let resolver = resolver(ready_session().await, search);

        let matched = resolver.resolve_track(&canonical()).await.unwrap().unwrap();
        assert_eq!(matched.id, "close-enough");
    }
}
