// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;

use chrono::DateTime;
use rss::extension::itunes::{self, ITunesChannelExtension, ITunesItemExtension};
use rss::{Channel, Guid, Image, Item};

use crate::store::{Episode, Show};

/// Sort episodes for display, newest first.
///
/// The store hands out episodes in no particular order; callers of
/// [`build_feed`] are expected to sort with this first.
pub fn sort_newest_first(episodes: &mut [Episode]) {
    episodes.sort_by(|a, b| b.published.cmp(&a.published));
}

/// Render a show and its episodes as an RSS 2.0 document.
///
/// Items appear in the order of `episodes`. The output depends only on the
/// inputs.
pub fn build_feed(show: &Show, episodes: &[Episode]) -> String {
    let mut channel = Channel::default();
    channel.set_title(show.title.as_str());
    channel.set_description(show.subtitle.as_str());

    let mut namespaces = BTreeMap::new();
    namespaces.insert("itunes".to_string(), itunes::NAMESPACE.to_string());
    channel.set_namespaces(namespaces);

    if !show.image.is_empty() {
        let mut image = Image::default();
        image.set_url(show.image.as_str());
        image.set_title(show.title.as_str());
        channel.set_image(image);
    }

    let mut itunes_ext = ITunesChannelExtension::default();
    itunes_ext.set_image(non_empty(&show.image));
    itunes_ext.set_subtitle(non_empty(&show.subtitle));
    channel.set_itunes_ext(itunes_ext);

    channel.set_items(episodes.iter().map(build_item).collect::<Vec<_>>());

    channel.to_string()
}

fn build_item(episode: &Episode) -> Item {
    let mut item = Item::default();
    item.set_title(episode.title.clone());
    item.set_link(episode.link.clone());
    item.set_description(episode.description.clone());
    item.set_pub_date(DateTime::from_timestamp(episode.published, 0).map(|dt| dt.to_rfc2822()));

    let mut guid = Guid::default();
    guid.set_value(episode.link.as_str());
    guid.set_permalink(false);
    item.set_guid(guid);

    if !episode.image.is_empty() {
        let mut itunes_ext = ITunesItemExtension::default();
        itunes_ext.set_image(episode.image.clone());
        item.set_itunes_ext(itunes_ext);
    }

    item
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|s| !s.is_empty())
}
