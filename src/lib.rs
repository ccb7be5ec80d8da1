pub mod catalog;
pub mod error;
pub mod feed;
pub mod http;
pub mod poller;
pub mod progress;
pub mod server;
pub mod service;
pub mod store;
pub mod sync;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use catalog::{
    Catalog, DEFAULT_API_BASE, EpisodeDescriptor, EpisodePage, MediaResolver, PsapiClient,
    ShowMetadata,
};
pub use error::{CatalogError, ServiceError, StoreError, SyncError};
pub use feed::{build_feed, sort_newest_first};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use poller::{Poller, PollerHandle, SWEEP_INTERVAL};
pub use progress::{
    NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter, TracingReporter,
};
pub use server::create_router;
pub use service::Service;
pub use store::{Database, Episode, EpisodeStore, Show};
pub use sync::{PAGE_SIZE, SweepResult, SyncEngine, SyncOptions, SyncResult};
