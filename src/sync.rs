// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::DateTime;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::catalog::{Catalog, EpisodeDescriptor, MediaResolver};
use crate::error::SyncError;
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::store::{Episode, EpisodeStore};

/// Number of episodes requested per listing page
pub const PAGE_SIZE: usize = 10;

/// Options for a sweep over all shows
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Keep syncing the remaining shows when one of them fails.
    ///
    /// Off by default: the first failing show aborts the sweep.
    pub continue_on_error: bool,
}

/// Result of a per-show sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    /// Number of new episodes stored
    pub stored: usize,
    /// Number of listing pages requested from the catalog
    pub pages_fetched: u32,
    /// Newest stored publish time after the sync
    pub watermark: i64,
    /// Whether shutdown stopped the sync before every new episode was stored
    pub interrupted: bool,
}

/// Result of a sweep over all registered shows
#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    /// Number of shows synced successfully
    pub synced: usize,
    /// Number of shows whose sync failed
    pub failed: usize,
    /// Number of new episodes stored across all shows
    pub stored: usize,
    /// Details of failed shows (show id, error message)
    pub failures: Vec<(String, String)>,
    /// Whether shutdown stopped the sweep before all shows were fully synced
    pub interrupted: bool,
}

/// A descriptor newer than the watermark, waiting to be ingested
#[derive(Debug)]
struct PendingEpisode {
    published: i64,
    descriptor: EpisodeDescriptor,
}

/// Outcome of walking the remote listing
struct Scan {
    pending: Vec<PendingEpisode>,
    pages_fetched: u32,
    /// False when shutdown stopped the walk before its last page
    complete: bool,
}

/// Incremental synchronization of remote catalog episodes into the store.
///
/// The engine owns long-lived handles to its collaborators and is shared
/// between the background poller and anything else that wants to trigger
/// a sync.
pub struct SyncEngine {
    store: Arc<dyn EpisodeStore>,
    catalog: Arc<dyn Catalog>,
    resolver: Arc<dyn MediaResolver>,
    reporter: SharedProgressReporter,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn EpisodeStore>,
        catalog: Arc<dyn Catalog>,
        resolver: Arc<dyn MediaResolver>,
        reporter: SharedProgressReporter,
    ) -> Self {
        Self {
            store,
            catalog,
            resolver,
            reporter,
        }
    }

    /// Synchronize one show.
    ///
    /// This is the core of the mirror. It:
    /// 1. Reads the show's watermark (newest stored publish time, 0 if none)
    /// 2. Walks the remote listing page by page until it reaches an episode
    ///    at or below the watermark, a short page, or the announced last page
    /// 3. Resolves media and stores the new episodes, oldest first
    ///
    /// Any error aborts the sync. Episodes stored before the error stay
    /// stored, and because they are written oldest first the next sync
    /// picks up exactly where this one stopped.
    ///
    /// `shutdown` is checked before every page fetch and before every
    /// episode. The page or episode in flight is finished, nothing further
    /// is started, and the result is marked as interrupted.
    pub async fn sync_show(
        &self,
        show_id: &str,
        shutdown: &CancellationToken,
    ) -> Result<SyncResult, SyncError> {
        let result = self.run_sync(show_id, shutdown).await;

        if let Err(e) = &result {
            self.reporter.report(ProgressEvent::SyncFailed {
                show_id: show_id.to_string(),
                error: e.to_string(),
            });
        }

        result
    }

    async fn run_sync(
        &self,
        show_id: &str,
        shutdown: &CancellationToken,
    ) -> Result<SyncResult, SyncError> {
        let watermark = self.store.latest_episode_timestamp(show_id).await?;

        self.reporter.report(ProgressEvent::SyncStarted {
            show_id: show_id.to_string(),
            watermark,
        });

        let Scan {
            mut pending,
            pages_fetched,
            complete,
        } = self.collect_new_episodes(show_id, watermark, shutdown).await?;

        // An unfinished walk only saw the newest episodes. Storing them would
        // lift the watermark above older episodes on pages never fetched.
        if !complete {
            return Ok(self.interrupted(show_id, 0, pages_fetched, watermark));
        }

        // Oldest first keeps every insert at or above the watermark of the
        // moment, so the watermark never skips over an unstored episode.
        pending.sort_by_key(|episode| episode.published);

        let mut current = watermark;
        let mut stored = 0;

        for PendingEpisode {
            published,
            descriptor,
        } in pending
        {
            if shutdown.is_cancelled() {
                return Ok(self.interrupted(show_id, stored, pages_fetched, current));
            }

            let link = self
                .resolver
                .playable_url(&descriptor.id)
                .await
                .map_err(|e| SyncError::Media {
                    episode_id: descriptor.id.clone(),
                    source: e,
                })?;

            let episode = Episode {
                title: descriptor.title,
                description: descriptor.subtitle.unwrap_or_default(),
                link,
                image: descriptor.images.into_iter().next().unwrap_or_default(),
                published,
                show_id: show_id.to_string(),
            };

            self.store.create_episode(&episode).await?;

            current = current.max(published);
            stored += 1;

            self.reporter.report(ProgressEvent::EpisodeStored {
                show_id: show_id.to_string(),
                episode_title: episode.title,
                published,
            });
        }

        self.reporter.report(ProgressEvent::SyncCompleted {
            show_id: show_id.to_string(),
            stored_count: stored,
            pages_fetched,
            watermark: current,
        });

        Ok(SyncResult {
            stored,
            pages_fetched,
            watermark: current,
            interrupted: false,
        })
    }

    fn interrupted(
        &self,
        show_id: &str,
        stored: usize,
        pages_fetched: u32,
        watermark: i64,
    ) -> SyncResult {
        self.reporter.report(ProgressEvent::SyncInterrupted {
            show_id: show_id.to_string(),
            stored_count: stored,
            watermark,
        });

        SyncResult {
            stored,
            pages_fetched,
            watermark,
            interrupted: true,
        }
    }

    /// Walk the listing and collect every descriptor strictly newer than
    /// `watermark`.
    async fn collect_new_episodes(
        &self,
        show_id: &str,
        watermark: i64,
        shutdown: &CancellationToken,
    ) -> Result<Scan, SyncError> {
        let mut pending = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut page = 1;

        loop {
            if shutdown.is_cancelled() {
                return Ok(Scan {
                    pending,
                    pages_fetched: page - 1,
                    complete: false,
                });
            }

            let listing = self.catalog.episodes_page(show_id, page, PAGE_SIZE).await?;
            let descriptor_count = listing.descriptors.len();

            self.reporter.report(ProgressEvent::PageFetched {
                show_id: show_id.to_string(),
                page,
                descriptor_count,
            });

            let mut dated = date_page(listing.descriptors, watermark)?;

            // The API lists newest first, but nothing guarantees it. The
            // watermark break below is only correct on a descending page.
            dated.sort_by(|a, b| b.published.cmp(&a.published));

            let mut reached_watermark = false;
            for episode in dated {
                if episode.published <= watermark {
                    reached_watermark = true;
                    break;
                }
                // Listings shift while we page through them, so the same
                // episode may show up on two consecutive pages.
                if seen_ids.insert(episode.descriptor.id.clone()) {
                    pending.push(episode);
                }
            }

            let last_page = reached_watermark
                || descriptor_count < PAGE_SIZE
                || listing.has_next == Some(false);

            if last_page {
                return Ok(Scan {
                    pending,
                    pages_fetched: page,
                    complete: true,
                });
            }

            page += 1;
        }
    }

    /// Run the per-show sync for every registered show, sequentially.
    ///
    /// Shutdown stops the sweep at the next page or episode boundary; no
    /// further show is started.
    pub async fn sweep(
        &self,
        options: &SyncOptions,
        shutdown: &CancellationToken,
    ) -> Result<SweepResult, SyncError> {
        let shows = self.store.shows().await?;

        self.reporter.report(ProgressEvent::SweepStarted {
            show_count: shows.len(),
        });

        let mut result = SweepResult::default();

        for (index, show) in shows.iter().enumerate() {
            if shutdown.is_cancelled() {
                self.reporter.report(ProgressEvent::SweepInterrupted {
                    remaining_shows: shows.len() - index,
                });
                result.interrupted = true;
                return Ok(result);
            }

            match self.sync_show(&show.id, shutdown).await {
                Ok(show_result) if show_result.interrupted => {
                    result.stored += show_result.stored;
                    self.reporter.report(ProgressEvent::SweepInterrupted {
                        remaining_shows: shows.len() - index,
                    });
                    result.interrupted = true;
                    return Ok(result);
                }
                Ok(show_result) => {
                    result.synced += 1;
                    result.stored += show_result.stored;
                }
                Err(e) if options.continue_on_error => {
                    result.failed += 1;
                    result.failures.push((show.id.clone(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        self.reporter.report(ProgressEvent::SweepCompleted {
            synced_count: result.synced,
            failed_count: result.failed,
            stored_count: result.stored,
        });

        Ok(result)
    }
}

/// Parse the publish times of one page.
///
/// A malformed date only fails the sync when it comes, in listing order,
/// before the first episode at or below the watermark. Anything past that
/// episode counts as already seen and is dropped.
fn date_page(
    descriptors: Vec<EpisodeDescriptor>,
    watermark: i64,
) -> Result<Vec<PendingEpisode>, SyncError> {
    let parsed: Vec<_> = descriptors
        .into_iter()
        .map(|descriptor| (parse_published(&descriptor), descriptor))
        .collect();

    let seen_from = parsed
        .iter()
        .position(|(published, _)| matches!(published, Ok(ts) if *ts <= watermark))
        .unwrap_or(parsed.len());

    let mut dated = Vec::with_capacity(parsed.len());
    for (index, (published, descriptor)) in parsed.into_iter().enumerate() {
        match published {
            Ok(published) => dated.push(PendingEpisode {
                published,
                descriptor,
            }),
            Err(e) if index < seen_from => return Err(e),
            Err(e) => debug!(error = %e, "Ignoring malformed date of an already seen episode"),
        }
    }

    Ok(dated)
}

/// Parse a descriptor's RFC 3339 publish time into Unix seconds
fn parse_published(descriptor: &EpisodeDescriptor) -> Result<i64, SyncError> {
    DateTime::parse_from_rfc3339(&descriptor.published)
        .map(|dt| dt.timestamp())
        .map_err(|e| SyncError::InvalidDate {
            episode_id: descriptor.id.clone(),
            date_str: descriptor.published.clone(),
            source: e,
        })
}
