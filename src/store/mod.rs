//! Episode record store
//!
//! Shows and their episodes are persisted through the [`EpisodeStore`] trait.
//! [`Database`] is the SQLite implementation used by the binary and tests.

mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;

pub use sqlite::Database;

/// A registered show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Show {
    /// Stable identifier assigned by the remote catalog
    pub id: String,
    pub title: String,
    /// Empty when the catalog has no subtitle
    pub subtitle: String,
    pub image: String,
}

/// A stored episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    pub title: String,
    /// Empty when the catalog has no subtitle for the episode
    pub description: String,
    /// Resolved playable media URL
    pub link: String,
    pub image: String,
    /// Publish time in seconds since the Unix epoch (UTC)
    pub published: i64,
    pub show_id: String,
}

/// Persistent storage of shows and episodes.
///
/// Every call is an independent unit of work; no multi-record transaction
/// spans calls.
#[async_trait]
pub trait EpisodeStore: Send + Sync {
    /// Get a show by id, failing with [`StoreError::ShowNotFound`] when absent
    async fn show(&self, id: &str) -> Result<Show, StoreError>;

    /// List all registered shows, in no particular order
    async fn shows(&self) -> Result<Vec<Show>, StoreError>;

    /// List the episodes of a show, in no particular order
    async fn episodes(&self, show_id: &str) -> Result<Vec<Episode>, StoreError>;

    /// Publish time of the newest stored episode, 0 when there is none
    async fn latest_episode_timestamp(&self, show_id: &str) -> Result<i64, StoreError>;

    async fn create_show(&self, show: &Show) -> Result<(), StoreError>;

    async fn create_episode(&self, episode: &Episode) -> Result<(), StoreError>;
}
