//! Article page shells and the bundled masthead image.

use crate::error::Error;
use crate::models::Article;
use crate::transform::escape_text;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

const MASTHEAD_GIF: &[u8] = include_bytes!("../../assets/masthead.gif");

/// Write one article's full HTML page into the issue directory.
///
/// The page is a minimal document shell: charset meta, the story title, and
/// the rewritten body.
#[instrument(level = "debug", skip_all, fields(story = %article.story_id))]
pub async fn write_article_page(issue_dir: &Path, article: &Article) -> Result<(), Error> {
    let path = issue_dir.join(format!("{}.html", article.story_id));
    let page = format!(
        "<html><head><meta charset='utf-8'><title>{}</title></head><body>{}</body></html>",
        escape_text(&article.title),
        article.html
    );
    fs::write(&path, page)
        .await
        .map_err(|e| Error::write(&path, e))?;
    debug!(path = %path.display(), "Wrote article page");
    Ok(())
}

/// Copy the bundled masthead image to the output root.
#[instrument(level = "debug", skip_all)]
pub async fn write_masthead(output_root: &Path) -> Result<(), Error> {
    let path = output_root.join("masthead.gif");
    fs::write(&path, MASTHEAD_GIF)
        .await
        .map_err(|e| Error::write(&path, e))
}
