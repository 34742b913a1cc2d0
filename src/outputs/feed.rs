//! Feed synthesis: per-section RSS, the aggregate feed, and the manifest.
//!
//! Section handling follows the paper's display order. The first (cover)
//! section is always published as "Titelseite", but articles are still
//! matched against the original first-section label. Sections without any
//! accepted article are omitted from both the emitted files and the
//! manifest.
//!
//! All writes here are fail-soft: a failed feed or article page is logged
//! and skipped without aborting the remaining sections, and the run still
//! reports completion.

use crate::models::{Article, ArticleSet, SectionIndex};
use crate::outputs::pages;
use chrono::Utc;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

const SITE_URL: &str = "http://www.nwzonline.de";
const CHANNEL_TITLE: &str = "NWZ";
const COVER_SECTION: &str = "Titelseite";

/// Everything the synthesizer needs to know about the run.
pub struct FeedContext<'a> {
    pub issue_dir: &'a Path,
    pub issue_id: &'a str,
    pub base_url: &'a str,
    /// Archived issues link into `{base}/{issueId}/`, ephemeral runs into
    /// `{base}/today/`.
    pub archive: bool,
}

/// One emitted feed: display name, cover flag, matching articles.
struct FeedSlot<'a> {
    display: String,
    cover: bool,
    articles: Vec<&'a Article>,
}

/// Build all feeds and the manifest; returns the emitted section names in
/// display order.
#[instrument(level = "info", skip_all, fields(issue = %ctx.issue_id))]
pub async fn build_feeds(
    ctx: &FeedContext<'_>,
    articles: &ArticleSet,
    sections: &SectionIndex,
) -> Vec<String> {
    info!(articles = articles.len(), "Generating feeds");
    let slots = section_slots(articles, sections);
    let mut manifest = Vec::with_capacity(slots.len());

    for slot in &slots {
        manifest.push(slot.display.clone());
        let title = if slot.cover {
            CHANNEL_TITLE.to_string()
        } else {
            format!("{CHANNEL_TITLE} - {}", slot.display)
        };
        let filename = format!("feed-{}.xml", slot.display);
        emit_feed(ctx, &title, &filename, &slot.articles).await;
    }

    // aggregate feed over every accepted article, regardless of section
    let all: Vec<&Article> = articles.iter().collect();
    emit_feed(ctx, CHANNEL_TITLE, "feed.xml", &all).await;

    write_manifest(ctx, &manifest).await;
    info!(sections = manifest.len(), "Feeds generated");
    manifest
}

/// Partition articles into non-empty section slots in display order, with
/// the cover slot relabeled.
fn section_slots<'a>(articles: &'a ArticleSet, sections: &SectionIndex) -> Vec<FeedSlot<'a>> {
    let mut unique: Vec<String> = Vec::new();
    for name in &sections.0 {
        if !unique.contains(name) {
            unique.push(name.clone());
        }
    }
    let Some(first) = unique.first_mut() else {
        return Vec::new();
    };
    // relabel position 0 only; the original label still routes articles here
    let original_first = std::mem::replace(first, COVER_SECTION.to_string());

    unique
        .into_iter()
        .enumerate()
        .filter_map(|(i, display)| {
            let matched: Vec<&Article> = articles
                .iter()
                .filter(|a| a.section == display || (i == 0 && a.section == original_first))
                .collect();
            if matched.is_empty() {
                None
            } else {
                Some(FeedSlot {
                    display,
                    cover: i == 0,
                    articles: matched,
                })
            }
        })
        .collect()
}

/// Serialize one feed and persist it together with its article pages.
async fn emit_feed(ctx: &FeedContext<'_>, title: &str, filename: &str, articles: &[&Article]) {
    for article in articles {
        if let Err(e) = pages::write_article_page(ctx.issue_dir, article).await {
            error!(error = %e, story = %article.story_id, "Failed writing article page; skipping");
        }
    }

    let xml = match rss_document(ctx, title, articles) {
        Ok(xml) => xml,
        Err(e) => {
            error!(error = %e, feed = filename, "Failed serializing feed; skipping");
            return;
        }
    };
    let path = ctx.issue_dir.join(filename);
    if let Err(e) = fs::write(&path, xml).await {
        error!(error = %e, path = %path.display(), "Failed writing feed; skipping");
    } else {
        info!(path = %path.display(), items = articles.len(), "Wrote feed");
    }
}

/// Render one RSS 2.0 document.
fn rss_document(
    ctx: &FeedContext<'_>,
    title: &str,
    articles: &[&Article],
) -> std::io::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;
    text_element(&mut writer, "title", title)?;
    text_element(&mut writer, "link", SITE_URL)?;
    text_element(&mut writer, "description", title)?;
    text_element(&mut writer, "lastBuildDate", &Utc::now().to_rfc2822())?;

    for article in articles {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", &article.title)?;
        text_element(&mut writer, "link", &item_link(ctx, article))?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        writer.write_event(Event::Start(guid))?;
        writer.write_event(Event::Text(BytesText::new(&article.story_id)))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;

        text_element(&mut writer, "description", &article.html)?;
        text_element(&mut writer, "category", &article.section)?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;
    Ok(writer.into_inner())
}

fn item_link(ctx: &FeedContext<'_>, article: &Article) -> String {
    if ctx.archive {
        format!("{}/{}/{}.html", ctx.base_url, ctx.issue_id, article.story_id)
    } else {
        format!("{}/today/{}.html", ctx.base_url, article.story_id)
    }
}

fn text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> std::io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Persist `sections.json`: the emitted section names in display order.
async fn write_manifest(ctx: &FeedContext<'_>, manifest: &[String]) {
    let path = ctx.issue_dir.join("sections.json");
    let json = match serde_json::to_vec(manifest) {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "Failed serializing section manifest");
            return;
        }
    };
    if let Err(e) = fs::write(&path, json).await {
        error!(error = %e, path = %path.display(), "Failed writing section manifest");
    }
}
