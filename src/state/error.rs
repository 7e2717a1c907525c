use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to initialize {backend} backend: {source}")]
    Backend {
        backend: &'static str,
        #[source]
        source: anyhow::Error,
    },
}
