//! The crawl: pages in order, stories with bounded concurrency.
//!
//! Pages are processed strictly sequentially in ascending page-key order;
//! within one page at most [`STORY_CONCURRENCY`] stories are fetched and
//! transformed at a time. Both bounds are a politeness ceiling against the
//! source site, not a tuning knob. Lead-image downloads happen inline inside
//! a story's transform and therefore count against that story's slot.
//!
//! Every story produces exactly one completion, including candidates the
//! filters drop, so the per-page join can never stall on skipped stories.
//! The first fatal error cancels the page and aborts the run; there is no
//! partial-issue continuation.

use crate::error::Error;
use crate::models::{
    fetch_page, normalize_title, Article, ArticleSet, ContentIndex, Edition, SectionIndex,
    StoryMeta,
};
use crate::portal::{session::Session, story};
use crate::transform::{self, Rewritten};
use futures::stream::{self, TryStreamExt};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Stories fetched and transformed concurrently within one page.
const STORY_CONCURRENCY: usize = 2;

/// Crawl every page of the issue and aggregate the accepted articles.
#[instrument(level = "info", skip_all, fields(issue = %edition.id))]
pub async fn crawl(
    session: &Session,
    edition: &Edition,
    contents: &ContentIndex,
    sections: &SectionIndex,
    issue_dir: &Path,
    base_url: &str,
) -> Result<ArticleSet, Error> {
    let mut pages: Vec<(u32, &std::collections::BTreeMap<String, StoryMeta>)> = contents
        .iter()
        .filter_map(|(key, stories)| match key.parse::<u32>() {
            Ok(page_no) => Some((page_no, stories)),
            Err(_) => {
                warn!(key = %key, "non-numeric page key in content index; skipping");
                None
            }
        })
        .collect();
    pages.sort_by_key(|(page_no, _)| *page_no);

    let total = pages.len();
    info!(pages = total, "Parsing articles");

    let mut articles = ArticleSet::new();
    for (done, (page_no, stories)) in pages.into_iter().enumerate() {
        let results: Vec<Option<Article>> = stream::iter(stories.iter().map(|(story_id, meta)| {
            Ok::<_, Error>(process_story(
                session, edition, page_no, story_id, meta, sections, issue_dir, base_url,
            ))
        }))
        .try_buffered(STORY_CONCURRENCY)
        .try_collect()
        .await?;

        for article in results.into_iter().flatten() {
            articles.insert(article);
        }
        info!(
            page = page_no,
            done = done + 1,
            total,
            articles = articles.len(),
            "Page complete"
        );
    }

    Ok(articles)
}

/// Fetch and transform one candidate story.
///
/// Always resolves exactly once: `Ok(None)` for filtered candidates,
/// `Ok(Some(_))` for accepted articles, `Err(_)` for fatal fetch failures.
#[allow(clippy::too_many_arguments)]
async fn process_story(
    session: &Session,
    edition: &Edition,
    page_no: u32,
    story_id: &str,
    meta: &StoryMeta,
    sections: &SectionIndex,
    issue_dir: &Path,
    base_url: &str,
) -> Result<Option<Article>, Error> {
    if !is_candidate(meta) {
        debug!(story = story_id, kind = %meta.story_type, "Not a candidate story; skipping");
        return Ok(None);
    }

    let page = fetch_page(page_no);
    let raw = story::fetch_article(session, edition, page, story_id).await?;
    let rewritten =
        transform::transform(session, edition, page, story_id, &raw, issue_dir, base_url).await?;

    Ok(accept(page_no, story_id, meta, rewritten, sections))
}

/// Candidate filter applied before fetching: only typed stories with a
/// title. Untitled stories cannot survive the post-transform filter, so
/// their fetches are skipped up front.
fn is_candidate(meta: &StoryMeta) -> bool {
    meta.story_type == "S" && !meta.title.trim().is_empty()
}

/// Aggregator acceptance: non-empty normalized title, non-empty rewritten
/// text, section resolved from the logical page number.
fn accept(
    page_no: u32,
    story_id: &str,
    meta: &StoryMeta,
    rewritten: Rewritten,
    sections: &SectionIndex,
) -> Option<Article> {
    let title = normalize_title(&meta.title);
    if title.is_empty() || rewritten.text.trim().is_empty() {
        debug!(story = story_id, "Empty title or body after rewrite; dropping");
        return None;
    }
    let section = sections.name_for_page(page_no).unwrap_or_default().to_string();
    debug!(
        story = story_id,
        %title,
        %section,
        date = meta.formatted_date.as_deref().unwrap_or(""),
        "Accepted article"
    );
    Some(Article {
        story_id: story_id.to_string(),
        title,
        html: rewritten.html.trim().to_string(),
        text: rewritten.text,
        formatted_date: meta.formatted_date.clone(),
        section,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(story_type: &str, title: &str) -> StoryMeta {
        StoryMeta {
            story_type: story_type.to_string(),
            title: title.to_string(),
            formatted_date: Some("12.09.2016".to_string()),
        }
    }

    fn rewritten(text: &str) -> Rewritten {
        Rewritten {
            html: format!("<p>{text}</p>"),
            text: text.to_string(),
        }
    }

    fn sections() -> SectionIndex {
        SectionIndex(vec!["Titel".into(), "Lokales".into(), "Sport".into()])
    }

    #[test]
    fn test_candidate_filter_requires_story_type() {
        assert!(is_candidate(&meta("S", "Titel")));
        assert!(!is_candidate(&meta("I", "Titel")));
        assert!(!is_candidate(&meta("A", "Anzeige")));
        assert!(!is_candidate(&meta("S", "   ")));
    }

    #[test]
    fn test_accept_builds_article() {
        let article = accept(2, "s1", &meta("S", "  Ein  Titel "), rewritten("Text"), &sections())
            .expect("accepted");
        assert_eq!(article.title, "Ein Titel");
        assert_eq!(article.section, "Lokales");
        assert_eq!(article.html, "<p>Text</p>");
        assert_eq!(article.formatted_date.as_deref(), Some("12.09.2016"));
    }

    #[test]
    fn test_accept_drops_empty_rewritten_text() {
        // non-empty title is not enough once the rewrite leaves no text
        assert!(accept(1, "s1", &meta("S", "Titel"), rewritten("   "), &sections()).is_none());
        assert!(accept(
            1,
            "s1",
            &meta("S", "Titel"),
            Rewritten::default(),
            &sections()
        )
        .is_none());
    }

    #[test]
    fn test_accept_drops_whitespace_only_title() {
        assert!(accept(1, "s1", &meta("S", "  \n "), rewritten("Text"), &sections()).is_none());
    }

    #[test]
    fn test_accept_out_of_range_page_gets_empty_section() {
        let article = accept(9, "s1", &meta("S", "Titel"), rewritten("Text"), &sections()).unwrap();
        assert_eq!(article.section, "");
    }

    #[test]
    fn test_section_uses_logical_page_not_spread() {
        // page 3 sits on spread 2, but the section lookup uses the logical
        // page index
        let article = accept(3, "s1", &meta("S", "Titel"), rewritten("Text"), &sections()).unwrap();
        assert_eq!(article.section, "Sport");
    }
}
