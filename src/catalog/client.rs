// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::CatalogError;
use crate::http::HttpClient;

use super::model::{EpisodesResponse, PlaybackManifest, PodcastResponse};
use super::{Catalog, EpisodePage, MediaResolver, ShowMetadata};

/// Base URL of the public programme API
pub const DEFAULT_API_BASE: &str = "https://psapi.nrk.no/";

/// Catalog and media resolver backed by the programme API.
///
/// A single instance is meant to live for the whole process and be shared
/// between the sync engine and the front door.
#[derive(Clone)]
pub struct PsapiClient<C> {
    client: C,
    base: Url,
}

impl<C: HttpClient> PsapiClient<C> {
    /// Create a client talking to the API rooted at `base`
    pub fn new(client: C, base: &str) -> Result<Self, CatalogError> {
        let base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        Ok(Self { client, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`, a base URL always has path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let url = url.to_string();
        debug!(url = %url, "Requesting catalog resource");

        let response = self
            .client
            .get(&url)
            .await
            .map_err(|e| CatalogError::RequestFailed {
                url: url.clone(),
                source: e,
            })?;

        if response.status != 200 {
            return Err(CatalogError::HttpStatus {
                url,
                status: response.status,
            });
        }

        serde_json::from_slice(&response.body)
            .map_err(|e| CatalogError::DecodeFailed { url, source: e })
    }
}

#[async_trait]
impl<C: HttpClient> Catalog for PsapiClient<C> {
    async fn show_metadata(&self, show_id: &str) -> Result<ShowMetadata, CatalogError> {
        let url = self.endpoint(&["radio", "catalog", "podcast", show_id]);
        let response: PodcastResponse = self.fetch_json(url).await?;
        Ok(response.into())
    }

    async fn episodes_page(
        &self,
        show_id: &str,
        page: u32,
        page_size: usize,
    ) -> Result<EpisodePage, CatalogError> {
        let mut url = self.endpoint(&["radio", "catalog", "podcast", show_id, "episodes"]);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("pageSize", &page_size.to_string());

        let response: EpisodesResponse = self.fetch_json(url).await?;
        Ok(response.into())
    }
}

#[async_trait]
impl<C: HttpClient> MediaResolver for PsapiClient<C> {
    async fn playable_url(&self, episode_id: &str) -> Result<String, CatalogError> {
        let url = self.endpoint(&["playback", "manifest", "podcast", episode_id]);
        let manifest: PlaybackManifest = self.fetch_json(url).await?;

        manifest
            .first_asset_url()
            .ok_or_else(|| CatalogError::NotPlayable {
                episode_id: episode_id.to_string(),
            })
    }
}
