//! Output generation: the per-issue directory tree, article pages and feeds.
//!
//! # Submodules
//!
//! - [`tree`]: issue directory lifecycle and the `today/` alias
//! - [`pages`]: article HTML page shells and the bundled masthead
//! - [`feed`]: per-section and aggregate RSS plus the section manifest
//!
//! # Output structure
//!
//! ```text
//! output_root/
//! ├── masthead.gif
//! ├── {issueId}/
//! │   ├── images/{imageId}.jpg
//! │   ├── {storyId}.html
//! │   ├── feed-{section}.xml
//! │   ├── feed.xml
//! │   └── sections.json
//! └── today/            # mirror of the latest issue tree
//! ```

pub mod feed;
pub mod pages;
pub mod tree;
