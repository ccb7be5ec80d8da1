use thiserror::Error;

/// Errors that can occur when talking to the remote catalog and playback API
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request failed for {url}: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Unexpected response from {url}: {source}")]
    DecodeFailed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Episode '{episode_id}' has no playable asset")]
    NotPlayable { episode_id: String },
}

/// Errors that can occur in the episode record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database {path}: {source}")]
    ConnectionFailed {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database migration failed: {0}")]
    MigrationFailed(#[source] sqlx::Error),

    #[error("Failed to {operation}: {source}")]
    QueryFailed {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Show '{0}' is not registered")]
    ShowNotFound(String),
}

/// Errors that abort a per-show synchronization
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to parse date '{date_str}' of episode '{episode_id}': {source}")]
    InvalidDate {
        episode_id: String,
        date_str: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Failed to resolve media for episode '{episode_id}': {source}")]
    Media {
        episode_id: String,
        #[source]
        source: CatalogError,
    },
}

/// Errors surfaced by the HTTP front door
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}
