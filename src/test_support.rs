//! Mock collaborators shared by the unit tests

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::DateTime;
use tokio_util::sync::CancellationToken;

use crate::catalog::{Catalog, EpisodeDescriptor, EpisodePage, MediaResolver, ShowMetadata};
use crate::error::{CatalogError, StoreError};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::store::{Database, Episode, EpisodeStore, Show};

/// Build a descriptor published at `published` seconds since the epoch
pub fn descriptor(id: &str, published: i64) -> EpisodeDescriptor {
    EpisodeDescriptor {
        id: id.to_string(),
        title: format!("Episode {id}"),
        subtitle: None,
        images: vec![format!("https://img.example.com/{id}.jpg")],
        published: DateTime::from_timestamp(published, 0).unwrap().to_rfc3339(),
    }
}

/// Build descriptors with ids `ep-<timestamp>`, in the given order
pub fn descriptors(timestamps: &[i64]) -> Vec<EpisodeDescriptor> {
    timestamps
        .iter()
        .map(|ts| descriptor(&format!("ep-{ts}"), *ts))
        .collect()
}

enum Listing {
    /// One flat list, cut into pages of the requested size
    Flat {
        descriptors: Vec<EpisodeDescriptor>,
        announce_next: bool,
    },
    /// Explicit pages, empty beyond the last one
    Pages(Vec<EpisodePage>),
}

/// In-memory catalog recording every page request
#[derive(Default)]
pub struct MockCatalog {
    shows: Mutex<HashMap<String, ShowMetadata>>,
    listings: Mutex<HashMap<String, Listing>>,
    failing: Mutex<HashSet<String>>,
    page_requests: Mutex<Vec<(String, u32)>>,
    cancel_on_page: Mutex<Option<(u32, CancellationToken)>>,
}

impl MockCatalog {
    pub fn set_show(&self, show_id: &str, metadata: ShowMetadata) {
        self.shows
            .lock()
            .unwrap()
            .insert(show_id.to_string(), metadata);
    }

    /// Serve `descriptors` without saying whether more pages follow
    pub fn set_listing(&self, show_id: &str, descriptors: Vec<EpisodeDescriptor>) {
        self.listings.lock().unwrap().insert(
            show_id.to_string(),
            Listing::Flat {
                descriptors,
                announce_next: false,
            },
        );
    }

    /// Serve `descriptors` and announce on every page whether another follows
    pub fn set_listing_with_hint(&self, show_id: &str, descriptors: Vec<EpisodeDescriptor>) {
        self.listings.lock().unwrap().insert(
            show_id.to_string(),
            Listing::Flat {
                descriptors,
                announce_next: true,
            },
        );
    }

    pub fn set_pages(&self, show_id: &str, pages: Vec<EpisodePage>) {
        self.listings
            .lock()
            .unwrap()
            .insert(show_id.to_string(), Listing::Pages(pages));
    }

    /// Make every request concerning `show_id` fail with a 503
    pub fn fail_for(&self, show_id: &str) {
        self.failing.lock().unwrap().insert(show_id.to_string());
    }

    /// Cancel `token` while serving the given page
    pub fn cancel_on_page(&self, page: u32, token: CancellationToken) {
        *self.cancel_on_page.lock().unwrap() = Some((page, token));
    }

    /// Pages requested for `show_id`, in request order
    pub fn page_requests(&self, show_id: &str) -> Vec<u32> {
        self.page_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == show_id)
            .map(|(_, page)| *page)
            .collect()
    }

    fn check_failing(&self, show_id: &str) -> Result<(), CatalogError> {
        if self.failing.lock().unwrap().contains(show_id) {
            return Err(CatalogError::HttpStatus {
                url: format!("mock://catalog/{show_id}"),
                status: 503,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn show_metadata(&self, show_id: &str) -> Result<ShowMetadata, CatalogError> {
        self.check_failing(show_id)?;
        self.shows
            .lock()
            .unwrap()
            .get(show_id)
            .cloned()
            .ok_or_else(|| CatalogError::HttpStatus {
                url: format!("mock://catalog/{show_id}"),
                status: 404,
            })
    }

    async fn episodes_page(
        &self,
        show_id: &str,
        page: u32,
        page_size: usize,
    ) -> Result<EpisodePage, CatalogError> {
        self.page_requests
            .lock()
            .unwrap()
            .push((show_id.to_string(), page));
        if let Some((cancel_page, token)) = &*self.cancel_on_page.lock().unwrap() {
            if *cancel_page == page {
                token.cancel();
            }
        }
        self.check_failing(show_id)?;

        let listings = self.listings.lock().unwrap();
        let index = page as usize - 1;

        let page = match listings.get(show_id) {
            None => EpisodePage::default(),
            Some(Listing::Pages(pages)) => pages.get(index).cloned().unwrap_or_default(),
            Some(Listing::Flat {
                descriptors,
                announce_next,
            }) => {
                let start = (index * page_size).min(descriptors.len());
                let end = (start + page_size).min(descriptors.len());
                EpisodePage {
                    descriptors: descriptors[start..end].to_vec(),
                    has_next: announce_next.then_some(end < descriptors.len()),
                }
            }
        };

        Ok(page)
    }
}

/// Resolves every episode to `https://media.example.com/<id>.mp3`
#[derive(Default)]
pub struct MockResolver {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    cancel_on_call: Mutex<Option<CancellationToken>>,
}

impl MockResolver {
    pub fn fail_for(&self, episode_id: &str) {
        self.failing.lock().unwrap().insert(episode_id.to_string());
    }

    pub fn heal(&self, episode_id: &str) {
        self.failing.lock().unwrap().remove(episode_id);
    }

    /// Cancel `token` while resolving the next episode
    pub fn cancel_on_next_call(&self, token: CancellationToken) {
        *self.cancel_on_call.lock().unwrap() = Some(token);
    }

    /// Episode ids resolved so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaResolver for MockResolver {
    async fn playable_url(&self, episode_id: &str) -> Result<String, CatalogError> {
        self.calls.lock().unwrap().push(episode_id.to_string());
        if let Some(token) = self.cancel_on_call.lock().unwrap().take() {
            token.cancel();
        }

        if self.failing.lock().unwrap().contains(episode_id) {
            return Err(CatalogError::NotPlayable {
                episode_id: episode_id.to_string(),
            });
        }

        Ok(format!("https://media.example.com/{episode_id}.mp3"))
    }
}

/// Store that fails the Nth `create_episode` call (1-based) and delegates
/// everything else to a real database
pub struct FailingStore {
    inner: Arc<Database>,
    fail_on_call: usize,
    create_calls: Mutex<usize>,
}

impl FailingStore {
    pub fn new(inner: Arc<Database>, fail_on_call: usize) -> Self {
        Self {
            inner,
            fail_on_call,
            create_calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl EpisodeStore for FailingStore {
    async fn show(&self, id: &str) -> Result<Show, StoreError> {
        self.inner.show(id).await
    }

    async fn shows(&self) -> Result<Vec<Show>, StoreError> {
        self.inner.shows().await
    }

    async fn episodes(&self, show_id: &str) -> Result<Vec<Episode>, StoreError> {
        self.inner.episodes(show_id).await
    }

    async fn latest_episode_timestamp(&self, show_id: &str) -> Result<i64, StoreError> {
        self.inner.latest_episode_timestamp(show_id).await
    }

    async fn create_show(&self, show: &Show) -> Result<(), StoreError> {
        self.inner.create_show(show).await
    }

    async fn create_episode(&self, episode: &Episode) -> Result<(), StoreError> {
        let call = {
            let mut calls = self.create_calls.lock().unwrap();
            *calls += 1;
            *calls
        };

        if call == self.fail_on_call {
            return Err(StoreError::QueryFailed {
                operation: "create episode",
                source: sqlx::Error::PoolClosed,
            });
        }

        self.inner.create_episode(episode).await
    }
}

/// Keeps every reported event for later inspection
#[derive(Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingReporter {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressReporter for CollectingReporter {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
