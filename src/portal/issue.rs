//! Section-index and content-index fetchers for one issue.
//!
//! Each resolves with a single authenticated fetch of a JSON endpoint,
//! parameterized by issue id and the `sysDate` cache-buster:
//!
//! - `editions/P/edition.json` -> [`SectionIndex`] (display-ordered section
//!   name per page, read from `sections[n].screens[0].pages[0].sectionName`)
//! - `editions/P/contents.json` -> [`ContentIndex`] (page -> story -> meta)

use crate::error::Error;
use crate::models::{ContentIndex, Edition, SectionIndex};
use crate::portal::{issue_url, session::Session};
use serde::Deserialize;
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
struct EditionPayload {
    sections: Vec<SectionEntry>,
}

#[derive(Debug, Deserialize)]
struct SectionEntry {
    #[serde(default)]
    screens: Vec<Screen>,
}

#[derive(Debug, Deserialize)]
struct Screen {
    #[serde(default)]
    pages: Vec<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "sectionName", default)]
    section_name: Option<String>,
}

/// Fetch and decode the issue's section index.
#[instrument(level = "info", skip_all, fields(issue = %edition.id))]
pub async fn fetch_sections(session: &Session, edition: &Edition) -> Result<SectionIndex, Error> {
    info!("Loading sections");
    let url = issue_url(edition, "editions/P/edition.json");
    let body = session.get_text(&url).await?;
    let index = parse_sections(&body)?;
    info!(count = index.0.len(), "Resolved section index");
    Ok(index)
}

/// Decode the `edition.json` payload into a [`SectionIndex`].
pub fn parse_sections(body: &str) -> Result<SectionIndex, Error> {
    let payload: EditionPayload = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("malformed edition.json: {e}")))?;
    let mut names = Vec::with_capacity(payload.sections.len());
    for (i, entry) in payload.sections.iter().enumerate() {
        let name = entry
            .screens
            .first()
            .and_then(|s| s.pages.first())
            .and_then(|p| p.section_name.clone())
            .ok_or_else(|| {
                Error::Parse(format!("no sectionName at sections[{i}].screens[0].pages[0]"))
            })?;
        names.push(name);
    }
    Ok(SectionIndex(names))
}

/// Fetch and decode the issue's content index.
#[instrument(level = "info", skip_all, fields(issue = %edition.id))]
pub async fn fetch_contents(session: &Session, edition: &Edition) -> Result<ContentIndex, Error> {
    info!("Loading content");
    let url = issue_url(edition, "editions/P/contents.json");
    let body = session.get_text(&url).await?;
    let index: ContentIndex = serde_json::from_str(&body)
        .map_err(|e| Error::Parse(format!("malformed contents.json: {e}")))?;
    info!(pages = index.len(), "Resolved content index");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_keeps_display_order() {
        let body = r#"{"sections":[
            {"screens":[{"pages":[{"sectionName":"Titel"}]}]},
            {"screens":[{"pages":[{"sectionName":"Lokales"}]}]},
            {"screens":[{"pages":[{"sectionName":"Sport"}]}]}
        ]}"#;
        let index = parse_sections(body).unwrap();
        assert_eq!(index.0, vec!["Titel", "Lokales", "Sport"]);
    }

    #[test]
    fn test_parse_sections_missing_name_is_parse_error() {
        let body = r#"{"sections":[{"screens":[]}]}"#;
        let err = parse_sections(body).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_parse_sections_rejects_non_json() {
        let err = parse_sections("<html>session expired</html>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_content_index_shape() {
        let body = r#"{
            "1": {"s100": {"type":"S","title":"Aufmacher","formattedDate":"12.09.2016"}},
            "2": {"s200": {"type":"I","title":""}, "s201": {"type":"S","title":"Zweiter"}}
        }"#;
        let index: ContentIndex = serde_json::from_str(body).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index["1"]["s100"].story_type, "S");
        assert_eq!(index["2"]["s200"].story_type, "I");
        assert_eq!(index["2"]["s201"].title, "Zweiter");
    }
}
