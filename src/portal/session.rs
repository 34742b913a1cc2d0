//! Authenticated portal session.
//!
//! Authentication is a single GET against the login endpoint with the
//! credentials as query parameters. The response sets the cookies that every
//! later fetch must carry, so the [`Session`] owns a cookie-jar
//! [`reqwest::Client`] built exactly once. After [`Session::authenticate`]
//! returns nothing mutates the cookie state again: the session is shared
//! read-only by all concurrent fetchers for the rest of the run.

use crate::error::Error;
use tracing::{debug, info, instrument};

const AUTH_URL: &str = "https://login.nwzonline.de/json/authenticate.php?callback=jQuery111105526024862398045_1473920759710&action=authenticate";

/// An authenticated, immutable portal session.
pub struct Session {
    client: reqwest::Client,
}

impl Session {
    /// Log into the portal and return the cookie-bearing session.
    ///
    /// # Errors
    ///
    /// [`Error::Auth`] on transport failure, a non-success response, or an
    /// unparsable login payload.
    #[instrument(level = "info", skip_all)]
    pub async fn authenticate(username: &str, password: &str) -> Result<Session, Error> {
        info!("Authenticating");
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Auth(format!("failed to build HTTP client: {e}")))?;

        let url = format!(
            "{AUTH_URL}&userLogin={}&userPass={}",
            urlencoding::encode(username),
            urlencoding::encode(password)
        );
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Auth(format!("login request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Auth(format!(
                "login endpoint returned status {}",
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| Error::Auth(format!("failed to read login response: {e}")))?;
        parse_login_payload(&body)?;

        debug!("Login payload accepted");
        Ok(Session { client })
    }

    /// GET a URL through the session and return the body as text.
    #[instrument(level = "debug", skip(self))]
    pub(crate) async fn get_text(&self, url: &str) -> Result<String, Error> {
        let response = self.get_checked(url).await?;
        response.text().await.map_err(|e| Error::Fetch {
            url: url.to_string(),
            source: e,
        })
    }

    /// GET a URL through the session and return the body as raw bytes.
    #[instrument(level = "debug", skip(self))]
    pub(crate) async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, Error> {
        let response = self.get_checked(url).await?;
        let bytes = response.bytes().await.map_err(|e| Error::Fetch {
            url: url.to_string(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }

    async fn get_checked(&self, url: &str) -> Result<reqwest::Response, Error> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch {
                url: url.to_string(),
                source: e,
            })?;
        if !response.status().is_success() {
            return Err(Error::FetchStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }
}

/// Validate the JSONP login payload: `callback({...})` or bare JSON.
fn parse_login_payload(body: &str) -> Result<serde_json::Value, Error> {
    let inner = match (body.find('('), body.rfind(')')) {
        (Some(open), Some(close)) if open < close => &body[open + 1..close],
        _ => body,
    };
    serde_json::from_str(inner.trim())
        .map_err(|e| Error::Auth(format!("unparsable login payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_payload_jsonp() {
        let body = r#"jQuery111105526024862398045_1473920759710({"status":"ok","user":"x"})"#;
        let value = parse_login_payload(body).unwrap();
        assert_eq!(value["status"], "ok");
    }

    #[test]
    fn test_parse_login_payload_bare_json() {
        let value = parse_login_payload(r#"{"status":"ok"}"#).unwrap();
        assert_eq!(value["status"], "ok");
    }

    #[test]
    fn test_parse_login_payload_rejects_garbage() {
        let err = parse_login_payload("<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
