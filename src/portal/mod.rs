//! Portal access: authentication and the session-scoped fetchers.
//!
//! Every content fetch hits the same issue URL space and carries the
//! edition's `sysDate` cache-buster, so the URL assembly lives here:
//!
//! ```text
//! {ISSUE_BASE}/{issueId}/NWZ/Olde%20N/{tail}?t={sysDate}
//! ```
//!
//! # Submodules
//!
//! - [`session`]: cookie-bearing authenticated [`session::Session`]
//! - [`kiosk`]: edition discovery from the kiosk index page
//! - [`issue`]: section-index and content-index JSON endpoints
//! - [`story`]: per-story article markup and lead images

use crate::models::Edition;

pub mod issue;
pub mod kiosk;
pub mod session;
pub mod story;

const ISSUE_BASE: &str = "http://www.nwzonline.de/NWZ/ePaperIssue/epaper/NWZOnline";

/// Build a content URL for the given edition, with the cache-buster applied.
pub(crate) fn issue_url(edition: &Edition, tail: &str) -> String {
    format!(
        "{ISSUE_BASE}/{}/NWZ/Olde%20N/{}?t={}",
        edition.id, tail, edition.sys_date
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_url_carries_cache_buster() {
        let edition = Edition {
            id: "4242".to_string(),
            sys_date: "20160912".to_string(),
        };
        assert_eq!(
            issue_url(&edition, "editions/P/edition.json"),
            "http://www.nwzonline.de/NWZ/ePaperIssue/epaper/NWZOnline/4242/NWZ/Olde%20N/editions/P/edition.json?t=20160912"
        );
    }
}
