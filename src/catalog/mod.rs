mod client;
mod model;

use async_trait::async_trait;

use crate::error::CatalogError;

pub use client::{DEFAULT_API_BASE, PsapiClient};

/// Show metadata as reported by the remote catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowMetadata {
    pub title: String,
    pub subtitle: Option<String>,
    pub poster_image_url: Option<String>,
}

/// The remote catalog's view of an episode, before it is stored locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeDescriptor {
    /// Remote episode identifier, also used for media resolution
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    /// Image URLs, the first one is the primary image
    pub images: Vec<String>,
    /// Publish date-time as provided by the source (RFC 3339)
    pub published: String,
}

/// One page of an episode listing
#[derive(Debug, Clone, Default)]
pub struct EpisodePage {
    /// Descriptors, newest first as far as the remote API can be trusted
    pub descriptors: Vec<EpisodeDescriptor>,
    /// Whether the remote API announced a following page, if it said anything at all
    pub has_next: Option<bool>,
}

/// Paginated access to the remote show catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up title, subtitle and poster image of a show
    async fn show_metadata(&self, show_id: &str) -> Result<ShowMetadata, CatalogError>;

    /// Fetch one page (1-based) of a show's episodes
    async fn episodes_page(
        &self,
        show_id: &str,
        page: u32,
        page_size: usize,
    ) -> Result<EpisodePage, CatalogError>;
}

/// Resolves an episode to its playable asset URL
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn playable_url(&self, episode_id: &str) -> Result<String, CatalogError>;
}
