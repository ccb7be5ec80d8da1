//! Wire shapes of the programme API responses.
//!
//! Only the fields this crate consumes are modelled; everything else in the
//! payloads is ignored by serde.

use serde::Deserialize;

use super::{EpisodeDescriptor, EpisodePage, ShowMetadata};

#[derive(Debug, Deserialize)]
pub(super) struct Titles {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Image {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct PodcastResponse {
    pub series: Series,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Series {
    pub titles: Titles,
    #[serde(default)]
    pub poster_image: Vec<Image>,
}

impl From<PodcastResponse> for ShowMetadata {
    fn from(response: PodcastResponse) -> Self {
        let series = response.series;
        Self {
            title: series.titles.title,
            subtitle: series.titles.subtitle,
            poster_image_url: series.poster_image.into_iter().next().map(|img| img.url),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct EpisodesResponse {
    #[serde(rename = "_links", default)]
    pub links: Option<Links>,
    #[serde(rename = "_embedded", default)]
    pub embedded: Embedded,
}

#[derive(Debug, Deserialize)]
pub(super) struct Links {
    #[serde(default)]
    pub next: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Embedded {
    #[serde(default)]
    pub episodes: Vec<EpisodeItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EpisodeItem {
    pub episode_id: String,
    pub titles: Titles,
    #[serde(default)]
    pub image: Vec<Image>,
    pub date: String,
}

impl From<EpisodesResponse> for EpisodePage {
    fn from(response: EpisodesResponse) -> Self {
        let has_next = response.links.map(|links| links.next.is_some());
        let descriptors = response
            .embedded
            .episodes
            .into_iter()
            .map(|item| EpisodeDescriptor {
                id: item.episode_id,
                title: item.titles.title,
                subtitle: item.titles.subtitle,
                images: item.image.into_iter().map(|img| img.url).collect(),
                published: item.date,
            })
            .collect();

        Self {
            descriptors,
            has_next,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PlaybackManifest {
    #[serde(default)]
    pub playable: Option<Playable>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Playable {
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Asset {
    pub url: String,
}

impl PlaybackManifest {
    /// URL of the first playable asset, if the manifest is playable at all
    pub fn first_asset_url(self) -> Option<String> {
        self.playable?.assets.into_iter().next().map(|asset| asset.url)
    }
}
