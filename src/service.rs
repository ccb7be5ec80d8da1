use std::sync::Arc;

use tracing::info;

use crate::catalog::Catalog;
use crate::error::ServiceError;
use crate::feed::{build_feed, sort_newest_first};
use crate::store::{EpisodeStore, Show};

/// Operations behind the HTTP front door
pub struct Service {
    store: Arc<dyn EpisodeStore>,
    catalog: Arc<dyn Catalog>,
}

impl Service {
    pub fn new(store: Arc<dyn EpisodeStore>, catalog: Arc<dyn Catalog>) -> Self {
        Self { store, catalog }
    }

    /// Render the RSS feed of a registered show, newest episode first
    pub async fn feed(&self, show_id: &str) -> Result<String, ServiceError> {
        let show = self.store.show(show_id).await?;
        let mut episodes = self.store.episodes(show_id).await?;
        sort_newest_first(&mut episodes);

        Ok(build_feed(&show, &episodes))
    }

    /// Look a show up in the remote catalog and register it.
    ///
    /// Episodes are picked up by the next sweep.
    pub async fn register_show(&self, show_id: &str) -> Result<Show, ServiceError> {
        let metadata = self.catalog.show_metadata(show_id).await?;

        let show = Show {
            id: show_id.to_string(),
            title: metadata.title,
            subtitle: metadata.subtitle.unwrap_or_default(),
            image: metadata.poster_image_url.unwrap_or_default(),
        };
        self.store.create_show(&show).await?;

        info!(show_id = %show.id, title = %show.title, "Registered show");
        Ok(show)
    }
}
