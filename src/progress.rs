use std::sync::Arc;

use tracing::{debug, info, warn};

/// Events emitted during show synchronization for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A sweep over all registered shows is starting
    SweepStarted { show_count: usize },

    /// A per-show sync is starting from the given watermark
    SyncStarted { show_id: String, watermark: i64 },

    /// A page of the remote episode listing has been fetched
    PageFetched {
        show_id: String,
        /// 1-based page number
        page: u32,
        descriptor_count: usize,
    },

    /// A new episode has been persisted
    EpisodeStored {
        show_id: String,
        episode_title: String,
        published: i64,
    },

    /// A per-show sync finished successfully
    SyncCompleted {
        show_id: String,
        stored_count: usize,
        pages_fetched: u32,
        /// Watermark after the sync
        watermark: i64,
    },

    /// A per-show sync was aborted by an error
    SyncFailed { show_id: String, error: String },

    /// A per-show sync stopped early because shutdown was requested
    SyncInterrupted {
        show_id: String,
        stored_count: usize,
        watermark: i64,
    },

    /// The sweep stopped early because shutdown was requested
    SweepInterrupted { remaining_shows: usize },

    /// A sweep finished, either fully or by skipping failed shows
    SweepCompleted {
        synced_count: usize,
        failed_count: usize,
        stored_count: usize,
    },
}

/// Trait for reporting progress events during synchronization.
///
/// Implementations can use this to log messages, collect statistics
/// or feed a status page.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

/// Renders progress events as structured log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl TracingReporter {
    /// Create a new TracingReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

impl ProgressReporter for TracingReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::SweepStarted { show_count } => {
                info!(show_count, "Sweep started");
            }
            ProgressEvent::SyncStarted { show_id, watermark } => {
                info!(show_id = %show_id, watermark, "Syncing show");
            }
            ProgressEvent::PageFetched {
                show_id,
                page,
                descriptor_count,
            } => {
                debug!(show_id = %show_id, page, descriptor_count, "Fetched episode page");
            }
            ProgressEvent::EpisodeStored {
                show_id,
                episode_title,
                published,
            } => {
                info!(show_id = %show_id, title = %episode_title, published, "Stored new episode");
            }
            ProgressEvent::SyncCompleted {
                show_id,
                stored_count,
                pages_fetched,
                watermark,
            } => {
                info!(
                    show_id = %show_id,
                    stored_count,
                    pages_fetched,
                    watermark,
                    "Show synced"
                );
            }
            ProgressEvent::SyncFailed { show_id, error } => {
                warn!(show_id = %show_id, error = %error, "Show sync failed");
            }
            ProgressEvent::SyncInterrupted {
                show_id,
                stored_count,
                watermark,
            } => {
                info!(
                    show_id = %show_id,
                    stored_count,
                    watermark,
                    "Show sync interrupted by shutdown"
                );
            }
            ProgressEvent::SweepInterrupted { remaining_shows } => {
                info!(remaining_shows, "Sweep interrupted by shutdown");
            }
            ProgressEvent::SweepCompleted {
                synced_count,
                failed_count,
                stored_count,
            } => {
                info!(synced_count, failed_count, stored_count, "Sweep completed");
            }
        }
    }
}
