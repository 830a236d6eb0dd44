use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::PROVIDER_NAME;
use crate::error::Error;
use crate::providers::{TokenGrant, TokenSource};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Refresh this many seconds before the token would expire.
const REFRESH_MARGIN_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// reqwest-backed identity provider client.
pub struct AccountsClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl AccountsClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("trackbridge/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        Self {
            client,
            client_id,
            client_secret,
        }
    }
}

#[async_trait]
impl TokenSource for AccountsClient {
    async fn client_credentials_grant(&self) -> Result<TokenGrant> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ];

        let response = self.client.post(TOKEN_URL).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "Failed to get access token: {} - {}",
                status,
                error_text
            ));
        }

        let token: TokenResponse = response.json().await?;
        Ok(TokenGrant {
            access_token: token.access_token,
            expires_in: token.expires_in,
        })
    }
}

/// Process-wide Spotify credential session.
///
/// Holds the current bearer token and keeps itself fresh: every successful
/// grant schedules the next one shortly before the token expires. Waiters
/// suspend on a watch channel that flips exactly once, on the first
/// successful grant.
pub struct SpotifySession {
    source: Option<Arc<dyn TokenSource>>,
    token: RwLock<Option<String>>,
    authenticated: AtomicBool,
    ready: watch::Sender<bool>,
}

impl SpotifySession {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self::with_source(Arc::new(AccountsClient::new(client_id, client_secret)))
    }

    pub fn with_source(source: Arc<dyn TokenSource>) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            source: Some(source),
            token: RwLock::new(None),
            authenticated: AtomicBool::new(false),
            ready,
        }
    }

    /// A session with no credentials. `ensure_ready` rejects immediately and
    /// nothing is ever fetched.
    pub fn unconfigured() -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            source: None,
            token: RwLock::new(None),
            authenticated: AtomicBool::new(false),
            ready,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    /// Current bearer token, once a grant has succeeded.
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Suspend until a token exists, or fail right away when the session was
    /// built without credentials.
    pub async fn ensure_ready(&self) -> Result<(), Error> {
        if self.source.is_none() {
            return Err(Error::Unconfigured(PROVIDER_NAME));
        }

        let mut rx = self.ready.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                // The sender lives in self, so this only happens mid-teardown
                return Err(Error::upstream(
                    "spotify session closed",
                    anyhow!("readiness channel dropped"),
                ));
            }
        }
        Ok(())
    }

    /// Run one client-credentials grant and store the result. Returns the
    /// token lifetime so the refresh loop can schedule the next cycle.
    ///
    /// A failed grant leaves the previous token in place; readiness keeps
    /// passing until the provider actually rejects it.
    pub async fn refresh(&self) -> Result<u64> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| anyhow!("spotify credentials are not configured"))?;

        let first_grant = !self.authenticated.load(Ordering::SeqCst);
        if first_grant {
            info!("Connecting to Spotify");
        }

        let grant = source.client_credentials_grant().await?;

        *self.token.write() = Some(grant.access_token);
        self.authenticated.store(true, Ordering::SeqCst);
        self.ready.send_replace(true);

        if first_grant {
            info!("Connected to Spotify");
        } else {
            debug!(expires_in = grant.expires_in, "Refreshed Spotify token");
        }

        Ok(grant.expires_in)
    }

    /// Keep the token fresh until a grant fails or the process exits. Each
    /// cycle schedules exactly the next one; a non-positive margin refreshes
    /// again immediately.
    pub async fn run(&self) -> Result<()> {
        loop {
            let expires_in = self.refresh().await?;
            let delay = refresh_delay(expires_in);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Spawn the refresh loop in the background. A failed grant ends the
    /// loop with a log line; the session keeps serving its last token.
    /// No-op for an unconfigured session.
    pub fn spawn_refresh(self: &Arc<Self>) {
        if !self.is_configured() {
            return;
        }
        let session = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = session.run().await {
                error!("Spotify token refresh stopped: {e:#}");
            }
        });
    }
}

/// How long after a grant the next refresh fires; zero means refresh now.
pub fn refresh_delay(expires_in: u64) -> Duration {
    Duration::from_secs(expires_in.saturating_sub(REFRESH_MARGIN_SECS))
}
