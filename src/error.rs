use thiserror::Error;

/// Errors surfaced by the resolution and lyrics layers.
///
/// `Unconfigured` and `NotFound` are terminal conditions the caller should not
/// retry; `Upstream` means the provider misbehaved and a later attempt may
/// succeed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} is not configured")]
    Unconfigured(&'static str),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{context}")]
    Upstream {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn upstream(context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Upstream {
            context: context.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
