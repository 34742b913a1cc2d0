//! Data model for one ePaper issue run.
//!
//! This module defines the structures flowing through the pipeline:
//! - [`Edition`]: the currently processed issue (id plus cache-buster token)
//! - [`StoryMeta`]: per-story metadata from the content index
//! - [`ContentIndex`] / [`SectionIndex`]: the two per-issue index structures
//! - [`Article`]: a fully transformed story
//! - [`ArticleSet`]: the title-keyed article collection with its documented
//!   overwrite semantics
//!
//! It also hosts the two small pure functions the rest of the pipeline is
//! built around: [`normalize_title`] and [`fetch_page`].

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// The edition selected for this run: the container id used in every content
/// URL plus the portal-issued `sysDate` cache-busting token.
#[derive(Debug, Clone)]
pub struct Edition {
    /// The issue container id (path segment of all content URLs).
    pub id: String,
    /// Cache-busting token appended as `?t=` to every content fetch.
    pub sys_date: String,
}

/// Per-story metadata from the content index.
///
/// Only entries with `type == "S"` are stories; other types (images, ads)
/// are ignored by the crawl.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryMeta {
    /// The portal's type flag; `"S"` marks a story.
    #[serde(rename = "type", default)]
    pub story_type: String,
    /// The raw story title as listed in the index.
    #[serde(default)]
    pub title: String,
    /// Human-readable publication date string from the index.
    #[serde(rename = "formattedDate", default)]
    pub formatted_date: Option<String>,
}

/// Content index of the issue: page-key -> story-id -> [`StoryMeta`].
///
/// Page keys arrive as strings in the portal JSON; the crawl orders them
/// numerically. Story ids within a page are processed in map order.
pub type ContentIndex = BTreeMap<String, BTreeMap<String, StoryMeta>>;

/// Ordered page-index -> section-name mapping for the issue.
///
/// The order is display order; page-index is 0-based while content-index
/// page keys are 1-based, hence [`SectionIndex::name_for_page`].
#[derive(Debug, Clone, Default)]
pub struct SectionIndex(pub Vec<String>);

impl SectionIndex {
    /// Look up the section name for a 1-based content-index page number.
    pub fn name_for_page(&self, page_no: u32) -> Option<&str> {
        let idx = (page_no as usize).checked_sub(1)?;
        self.0.get(idx).map(String::as_str)
    }
}

/// A transformed story ready for feed synthesis.
#[derive(Debug, Clone)]
pub struct Article {
    /// The portal's story id; also the output page filename and feed guid.
    pub story_id: String,
    /// Normalized title (trimmed, whitespace runs collapsed).
    pub title: String,
    /// Rewritten HTML body.
    pub html: String,
    /// Rendered plain text of the rewritten body.
    pub text: String,
    /// Display date string carried over from the content index.
    pub formatted_date: Option<String>,
    /// Section name the story was grouped under.
    pub section: String,
}

/// Insertion-ordered article collection keyed by normalized title.
///
/// A later article with an identical normalized title overwrites the earlier
/// one while keeping its original position. This is dedup-by-title, not by
/// id: downstream feed identity depends on title-based collapsing, so the
/// behavior is deliberate and must not be "fixed" into id-keying.
#[derive(Debug, Default)]
pub struct ArticleSet {
    order: Vec<Article>,
    index: HashMap<String, usize>,
}

impl ArticleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert an article under its normalized title (last writer wins).
    pub fn insert(&mut self, article: Article) {
        match self.index.get(&article.title) {
            Some(&i) => self.order[i] = article,
            None => {
                self.index.insert(article.title.clone(), self.order.len());
                self.order.push(article);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Normalize a story title: trim and collapse whitespace runs to one space.
pub fn normalize_title(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map a 1-based content-index page number to the physical fetch page.
///
/// Page 1 is the unpaired cover; every later page sits on a double-page
/// spread, so page n (n > 1) lives on spread n/2 + 1.
pub fn fetch_page(page_no: u32) -> u32 {
    if page_no <= 1 {
        1
    } else {
        page_no / 2 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, story_id: &str) -> Article {
        Article {
            story_id: story_id.to_string(),
            title: title.to_string(),
            html: "<p>body</p>".to_string(),
            text: "body".to_string(),
            formatted_date: None,
            section: "Lokales".to_string(),
        }
    }

    #[test]
    fn test_fetch_page_pairing() {
        assert_eq!(fetch_page(1), 1);
        assert_eq!(fetch_page(2), 2);
        assert_eq!(fetch_page(3), 2);
        assert_eq!(fetch_page(4), 3);
        assert_eq!(fetch_page(5), 3);
        assert_eq!(fetch_page(6), 4);
        assert_eq!(fetch_page(7), 4);
        assert_eq!(fetch_page(32), 17);
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Ein   Titel \n mit\tLuft  "), "Ein Titel mit Luft");
        assert_eq!(normalize_title("Schon normal"), "Schon normal");
        assert_eq!(normalize_title("   "), "");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn test_article_set_dedup_last_writer_wins() {
        let mut set = ArticleSet::new();
        set.insert(article("Gleicher Titel", "100"));
        set.insert(article("Anderer Titel", "200"));
        set.insert(article("Gleicher Titel", "300"));

        assert_eq!(set.len(), 2);
        let ids: Vec<&str> = set.iter().map(|a| a.story_id.as_str()).collect();
        // overwrite keeps the first-insertion position
        assert_eq!(ids, vec!["300", "200"]);
    }

    #[test]
    fn test_article_set_preserves_insertion_order() {
        let mut set = ArticleSet::new();
        for (t, id) in [("a", "1"), ("b", "2"), ("c", "3")] {
            set.insert(article(t, id));
        }
        let titles: Vec<&str> = set.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_section_index_lookup() {
        let index = SectionIndex(vec!["Titel".into(), "Lokales".into(), "Sport".into()]);
        assert_eq!(index.name_for_page(1), Some("Titel"));
        assert_eq!(index.name_for_page(3), Some("Sport"));
        assert_eq!(index.name_for_page(4), None);
        assert_eq!(index.name_for_page(0), None);
    }

    #[test]
    fn test_story_meta_deserializes_portal_entry() {
        let json = r#"{"type":"S","title":"Ein Artikel","formattedDate":"12. September 2016","extra":1}"#;
        let meta: StoryMeta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.story_type, "S");
        assert_eq!(meta.title, "Ein Artikel");
        assert_eq!(meta.formatted_date.as_deref(), Some("12. September 2016"));
    }

    #[test]
    fn test_story_meta_defaults_missing_fields() {
        let meta: StoryMeta = serde_json::from_str("{}").unwrap();
        assert_eq!(meta.story_type, "");
        assert_eq!(meta.title, "");
        assert!(meta.formatted_date.is_none());
    }
}
