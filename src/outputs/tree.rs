//! Issue directory lifecycle and the `today/` alias.
//!
//! Retention policy: every run rebuilds `{root}/{issueId}` from scratch and
//! mirrors it onto `{root}/today`. In archive mode the per-issue directory
//! stays; otherwise it is removed afterwards so only the alias survives.

use crate::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Path of one issue's output directory.
pub fn issue_dir(output_root: &Path, issue_id: &str) -> PathBuf {
    output_root.join(issue_id)
}

/// Idempotently (re)create the issue directory and its `images/` subfolder.
///
/// Any pre-existing tree at the path is removed first, so two consecutive
/// calls leave the same empty skeleton as one.
#[instrument(level = "info", skip_all, fields(issue = %issue_id))]
pub async fn prepare_issue_dir(output_root: &Path, issue_id: &str) -> Result<PathBuf, Error> {
    let dir = issue_dir(output_root, issue_id);
    if fs::metadata(&dir).await.is_ok() {
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| Error::write(&dir, e))?;
    }
    let images = dir.join("images");
    fs::create_dir_all(&images)
        .await
        .map_err(|e| Error::write(&images, e))?;
    info!(path = %dir.display(), "Prepared issue directory");
    Ok(dir)
}

/// Mirror the issue tree onto the `today/` alias.
///
/// The alias is replaced wholesale. When `archive` is false the per-issue
/// directory is deleted afterwards.
#[instrument(level = "info", skip_all, fields(issue = %issue_id, archive))]
pub async fn finalize_today(output_root: &Path, issue_id: &str, archive: bool) -> Result<(), Error> {
    info!("Copying newest issue to today");
    let dir = issue_dir(output_root, issue_id);
    let today = output_root.join("today");
    if fs::metadata(&today).await.is_ok() {
        fs::remove_dir_all(&today)
            .await
            .map_err(|e| Error::write(&today, e))?;
    }
    copy_dir_recursive(&dir, &today)
        .await
        .map_err(|e| Error::write(&today, e))?;
    if !archive {
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| Error::write(&dir, e))?;
    }
    Ok(())
}

/// Worklist-based recursive copy (async fns cannot recurse directly).
async fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    let mut stack = vec![(src.to_path_buf(), dst.to_path_buf())];
    while let Some((from, to)) = stack.pop() {
        fs::create_dir_all(&to).await?;
        let mut entries = fs::read_dir(&from).await?;
        while let Some(entry) = entries.next_entry().await? {
            let target = to.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                stack.push((entry.path(), target));
            } else {
                fs::copy(entry.path(), target).await?;
            }
        }
    }
    Ok(())
}
