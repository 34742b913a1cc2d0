//! # epaper2rss
//!
//! Converts the current NWZ ePaper issue into RSS feeds: one feed per
//! newspaper section, an aggregate feed over every story, and a stable
//! `today/` snapshot of the latest issue.
//!
//! ## Architecture
//!
//! The application is a straight pipeline:
//! 1. **Authenticate**: establish the cookie-bearing portal session
//! 2. **Discover**: parse the kiosk page for the current edition and its
//!    `sysDate` cache-buster
//! 3. **Index**: resolve the section index and the per-page content index
//! 4. **Crawl**: fetch and rewrite every story (pages sequential, two
//!    stories per page in flight)
//! 5. **Publish**: per-section and aggregate feeds, article pages, the
//!    section manifest, and the `today/` alias
//!
//! Auth, parse and fetch failures abort the run; only feed and article
//! persistence is fail-soft.

use clap::Parser;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod error;
mod models;
mod outputs;
mod pipeline;
mod portal;
mod transform;

use cli::Cli;
use error::Error;
use outputs::{feed, pages, tree};
use portal::{issue, kiosk, session::Session};

#[tokio::main]
async fn main() {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    if let Err(e) = run(args).await {
        error!(error = %e, "Run aborted");
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<(), Error> {
    let start_time = std::time::Instant::now();
    info!(output = %args.output, base_url = %args.base_url, archive = args.archive(), "epaper2rss starting up");

    let session = Session::authenticate(&args.username, &args.password).await?;
    let editions = kiosk::list_editions(&session).await?;
    let edition = kiosk::current_edition(&editions)?;
    info!(issue = %edition.id, sys_date = %edition.sys_date, editions = editions.len(), "Resolved current edition");

    let output_root = Path::new(&args.output);
    let issue_dir = tree::prepare_issue_dir(output_root, &edition.id).await?;
    pages::write_masthead(output_root).await?;

    let sections = issue::fetch_sections(&session, &edition).await?;
    let contents = issue::fetch_contents(&session, &edition).await?;

    let articles = pipeline::crawl(
        &session,
        &edition,
        &contents,
        &sections,
        &issue_dir,
        &args.base_url,
    )
    .await?;
    info!(count = articles.len(), "Articles accepted");

    let ctx = feed::FeedContext {
        issue_dir: &issue_dir,
        issue_id: &edition.id,
        base_url: &args.base_url,
        archive: args.archive(),
    };
    let manifest = feed::build_feeds(&ctx, &articles, &sections).await;
    info!(sections = ?manifest, "Section manifest");

    tree::finalize_today(output_root, &edition.id, args.archive()).await?;

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Done");
    Ok(())
}
