//! Whether cached artifacts must be recomputed.
//!
//! Decided once per build against the previous build's start time. Link
//! staleness looks one hop out only: a page is not refreshed because a page
//! it links to links to something that changed.

use crate::model::Entry;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Staleness {
    last_build: Option<DateTime<Utc>>,
}

impl Staleness {
    /// `None` means there was no previous build and everything is stale.
    pub fn new(last_build: Option<DateTime<Utc>>) -> Self {
        Self { last_build }
    }

    pub fn last_build(&self) -> Option<DateTime<Utc>> {
        self.last_build
    }

    pub fn is_stale(&self, last_edited: DateTime<Utc>) -> bool {
        match self.last_build {
            None => true,
            Some(last_build) => last_edited > last_build,
        }
    }

    pub fn is_entry_stale(&self, entry: &Entry) -> bool {
        self.is_stale(entry.last_updated_time)
    }

    /// Stale if the entry itself or any entry it links to is stale.
    pub fn is_stale_with_links<'e, I>(&self, entry: &Entry, linked: I) -> bool
    where
        I: IntoIterator<Item = &'e Entry>,
    {
        self.is_entry_stale(entry) || linked.into_iter().any(|e| self.is_entry_stale(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageId;
    use chrono::TimeZone;

    fn entry(edited: DateTime<Utc>) -> Entry {
        Entry {
            page_id: PageId::from_raw("p"),
            title: "t".into(),
            slug: "t".into(),
            collection: String::new(),
            last_updated_time: edited,
            publish_date: None,
            last_updated_date: None,
            tags: vec![],
            rank: None,
            excerpt: String::new(),
            featured_image: None,
            icon: None,
            cover: None,
            pinned: false,
            bluesky_post_link: None,
        }
    }

    #[test]
    fn no_previous_build_means_everything_is_stale() {
        let oracle = Staleness::new(None);
        assert!(oracle.is_stale(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn edits_at_or_before_the_build_are_fresh() {
        let build = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let oracle = Staleness::new(Some(build));
        assert!(!oracle.is_stale(build));
        assert!(!oracle.is_stale(build - chrono::Duration::seconds(1)));
        assert!(oracle.is_stale(build + chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn link_staleness_is_one_hop() {
        let build = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let oracle = Staleness::new(Some(build));
        let fresh = entry(build - chrono::Duration::days(1));
        let changed = entry(build + chrono::Duration::days(1));

        assert!(!oracle.is_stale_with_links(&fresh, [&fresh]));
        assert!(oracle.is_stale_with_links(&fresh, [&changed]));
        assert!(oracle.is_stale_with_links(&changed, std::iter::empty()));
    }
}
