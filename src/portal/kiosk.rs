//! Edition discovery from the kiosk index page.
//!
//! The kiosk page embeds its edition list as a script literal:
//!
//! ```text
//! var editions = {"data":{"container":[...]}};
//! ```
//!
//! This module is the only place that scrapes that literal, so upstream
//! format drift stays localized here. The currently processed edition is the
//! first container; its `sysDate` token is read from a fixed positional slot
//! (`product[0].edition[4]`). That index is unexplained upstream and brittle
//! against portal layout changes, but it is preserved verbatim on purpose.

use crate::error::Error;
use crate::models::Edition;
use crate::portal::session::Session;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, instrument};

const KIOSK_URL: &str = "http://www.nwzonline.de/epaper-kiosk/3.2.0/kiosk";

// Positional slot of the sysDate entry inside product[0].edition.
const SYS_DATE_SLOT: usize = 4;

static EDITIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var editions = (.*);").expect("editions regex"));

/// One entry of the kiosk's `data.container` array.
#[derive(Debug, Deserialize)]
pub struct EditionContainer {
    #[serde(rename = "idContainer")]
    id_container: ContainerId,
    #[serde(default)]
    product: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    #[serde(default)]
    edition: Vec<EditionSlot>,
}

#[derive(Debug, Deserialize)]
struct EditionSlot {
    #[serde(rename = "sysDate", default)]
    sys_date: Option<String>,
}

/// The container id appears as a number on some portal versions and as a
/// string on others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContainerId {
    Num(u64),
    Str(String),
}

impl ContainerId {
    fn as_string(&self) -> String {
        match self {
            ContainerId::Num(n) => n.to_string(),
            ContainerId::Str(s) => s.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct KioskPayload {
    data: KioskData,
}

#[derive(Debug, Deserialize)]
struct KioskData {
    container: Vec<EditionContainer>,
}

/// Fetch the kiosk page and return the embedded edition list, in portal
/// order.
#[instrument(level = "info", skip_all)]
pub async fn list_editions(session: &Session) -> Result<Vec<EditionContainer>, Error> {
    info!("Parsing editions");
    let body = session.get_text(KIOSK_URL).await?;
    parse_editions(&body)
}

/// Extract the edition list from the kiosk page body.
pub fn parse_editions(body: &str) -> Result<Vec<EditionContainer>, Error> {
    let literal = EDITIONS_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .ok_or_else(|| Error::Parse("editions literal not found in kiosk page".to_string()))?;
    let payload: KioskPayload = serde_json::from_str(literal.as_str())
        .map_err(|e| Error::Parse(format!("malformed editions literal: {e}")))?;
    Ok(payload.data.container)
}

/// Select the currently processed edition: the first container, with its
/// `sysDate` taken from the fixed positional slot.
pub fn current_edition(editions: &[EditionContainer]) -> Result<Edition, Error> {
    let first = editions
        .first()
        .ok_or_else(|| Error::Parse("kiosk edition list is empty".to_string()))?;
    let sys_date = first
        .product
        .first()
        .and_then(|p| p.edition.get(SYS_DATE_SLOT))
        .and_then(|slot| slot.sys_date.clone())
        .ok_or_else(|| {
            Error::Parse(format!(
                "no sysDate at product[0].edition[{SYS_DATE_SLOT}] of first container"
            ))
        })?;
    Ok(Edition {
        id: first.id_container.as_string(),
        sys_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kiosk_page() -> String {
        let editions = r#"{"data":{"container":[
            {"idContainer":4242,"product":[{"edition":[
                {"name":"a"},{"name":"b"},{"name":"c"},{"name":"d"},
                {"name":"e","sysDate":"20160912T0500"}
            ]}]},
            {"idContainer":"4241","product":[{"edition":[]}]}
        ]}}"#
            .replace('\n', "")
            .replace("            ", "");
        format!(
            "<html><script>var other = 1;\nvar editions = {editions};\nvar after = 2;</script></html>"
        )
    }

    #[test]
    fn test_parse_editions_from_embedded_literal() {
        let editions = parse_editions(&kiosk_page()).unwrap();
        assert_eq!(editions.len(), 2);
    }

    #[test]
    fn test_current_edition_reads_positional_sys_date_slot() {
        let editions = parse_editions(&kiosk_page()).unwrap();
        let edition = current_edition(&editions).unwrap();
        assert_eq!(edition.id, "4242");
        // slot 4, not the first edition entry carrying a sysDate
        assert_eq!(edition.sys_date, "20160912T0500");
    }

    #[test]
    fn test_string_container_id_supported() {
        let body = r#"var editions = {"data":{"container":[{"idContainer":"abc","product":[{"edition":[{},{},{},{},{"sysDate":"t"}]}]}]}};"#;
        let editions = parse_editions(body).unwrap();
        let edition = current_edition(&editions).unwrap();
        assert_eq!(edition.id, "abc");
    }

    #[test]
    fn test_missing_literal_is_parse_error() {
        let err = parse_editions("<html><body>login wall</body></html>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_malformed_literal_is_parse_error() {
        let err = parse_editions("var editions = {not json};").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_short_edition_array_is_parse_error() {
        let body = r#"var editions = {"data":{"container":[{"idContainer":1,"product":[{"edition":[{"sysDate":"x"}]}]}]}};"#;
        let editions = parse_editions(body).unwrap();
        let err = current_edition(&editions).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
