//! Command-line interface definitions.
//!
//! All options can be supplied as flags; the credentials also fall back to
//! the `NWZ_USERNAME` / `NWZ_PASSWORD` environment variables. The parsed
//! struct is the immutable configuration record consumed by the pipeline.

use clap::Parser;
use url::Url;

/// Convert the current NWZ ePaper issue to RSS.
///
/// # Examples
///
/// ```sh
/// # credentials from the environment, defaults for everything else
/// epaper2rss
///
/// # explicit everything, keep only the today/ alias on disk
/// epaper2rss -u me -p secret -o /srv/epaper -b https://feeds.example.org --no-archive
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// NWZ ePaper username
    #[arg(short, long, env = "NWZ_USERNAME")]
    pub username: String,

    /// NWZ ePaper password
    #[arg(short, long, env = "NWZ_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Output folder where the generated feeds land
    #[arg(short, long, default_value = "out/")]
    pub output: String,

    /// Base URL under which the output folder is publicly served
    #[arg(short, long, default_value = "http://localhost:8000", value_parser = parse_base_url)]
    pub base_url: String,

    /// Keep only the today/ alias instead of archiving every issue
    #[arg(long)]
    pub no_archive: bool,
}

impl Cli {
    /// Whether per-issue directories are retained after the `today/` alias
    /// has been refreshed.
    pub fn archive(&self) -> bool {
        !self.no_archive
    }
}

/// Validate the base URL and strip any trailing slash so that item links
/// concatenate without doubled separators.
fn parse_base_url(s: &str) -> Result<String, String> {
    let url = Url::parse(s).map_err(|e| format!("invalid base URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(s.trim_end_matches('/').to_string()),
        other => Err(format!("unsupported base URL scheme '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["epaper2rss", "-u", "user", "-p", "pass"]);
        assert_eq!(cli.username, "user");
        assert_eq!(cli.password, "pass");
        assert_eq!(cli.output, "out/");
        assert_eq!(cli.base_url, "http://localhost:8000");
        assert!(cli.archive());
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::parse_from([
            "epaper2rss",
            "--username",
            "user",
            "--password",
            "pass",
            "--output",
            "/srv/epaper",
            "--base-url",
            "https://feeds.example.org",
            "--no-archive",
        ]);
        assert_eq!(cli.output, "/srv/epaper");
        assert_eq!(cli.base_url, "https://feeds.example.org");
        assert!(!cli.archive());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let cli = Cli::parse_from([
            "epaper2rss",
            "-u",
            "user",
            "-p",
            "pass",
            "-b",
            "https://feeds.example.org/",
        ]);
        assert_eq!(cli.base_url, "https://feeds.example.org");
    }

    #[test]
    fn test_base_url_must_parse() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("ftp://feeds.example.org").is_err());
        assert_eq!(
            parse_base_url("http://localhost:8000").unwrap(),
            "http://localhost:8000"
        );
    }
}
