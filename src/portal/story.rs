//! Per-story fetchers: raw article markup and lead images.
//!
//! Both endpoints are addressed by the physical fetch page (double-page
//! spread, see [`crate::models::fetch_page`]) rather than the logical
//! content-index page, and both carry the usual `sysDate` cache-buster.

use crate::error::Error;
use crate::models::Edition;
use crate::portal::{issue_url, session::Session};
use tracing::{debug, instrument};

/// Fetch the raw markup of one story.
#[instrument(level = "debug", skip(session, edition), fields(issue = %edition.id))]
pub async fn fetch_article(
    session: &Session,
    edition: &Edition,
    fetch_page: u32,
    story_id: &str,
) -> Result<String, Error> {
    let url = issue_url(edition, &format!("{fetch_page}/contents/{story_id}/S.xml"));
    let body = session.get_text(&url).await?;
    debug!(bytes = body.len(), "Fetched story markup");
    Ok(body)
}

/// Fetch the full-resolution lead image of one story.
#[instrument(level = "debug", skip(session, edition), fields(issue = %edition.id))]
pub async fn fetch_image(
    session: &Session,
    edition: &Edition,
    fetch_page: u32,
    story_id: &str,
    image_id: &str,
) -> Result<Vec<u8>, Error> {
    let url = issue_url(
        edition,
        &format!("{fetch_page}/contents/{story_id}/contents/{image_id}/H.jpg"),
    );
    let bytes = session.get_bytes(&url).await?;
    debug!(bytes = bytes.len(), "Fetched story image");
    Ok(bytes)
}
