//! Exposé PDF discovery and download.
//!
//! A listing's detail page usually links its exposé document somewhere in
//! the markup, but not always in the same attribute. The scan tries the
//! known carriers in order; a missing link is normal, not an error.

use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use url::Url;

static HREF_PDF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href\s*=\s*["']([^"']+\.pdf[^"']*)["']"#).expect("valid regex")
});
static DATA_HREF_PDF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"data-href\s*=\s*["']([^"']+\.pdf[^"']*)["']"#).expect("valid regex")
});
static DATA_URL_PDF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"data-url\s*=\s*["']([^"']+\.pdf[^"']*)["']"#).expect("valid regex")
});
static ABSOLUTE_PDF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s\x22'<>]+\.pdf").expect("valid regex"));

/// Find the exposé PDF link in detail-page markup, resolved against the
/// page URL. Attribute carriers win over a bare absolute URL in the text.
#[must_use]
pub fn find_expose_link(html: &str, page_url: &str) -> Option<String> {
    let candidate = DATA_HREF_PDF_RE
        .captures(html)
        .or_else(|| DATA_URL_PDF_RE.captures(html))
        .or_else(|| HREF_PDF_RE.captures(html))
        .map(|captures| captures[1].to_string())
        .or_else(|| ABSOLUTE_PDF_RE.find(html).map(|m| m.as_str().to_string()))?;

    match Url::parse(page_url).and_then(|base| base.join(&candidate)) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(e) => {
            tracing::debug!(candidate = %candidate, error = %e, "unresolvable expose link");
            None
        }
    }
}

/// Download an exposé PDF into the given directory. Returns the written
/// file path.
pub async fn download_expose(url: &str, dir: &Path, label: &str) -> Result<PathBuf> {
    let client = reqwest::Client::new();
    let response = client.get(url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.pdf", crate::snapshot::sanitize_label(label)));
    std::fs::write(&path, &bytes)?;
    tracing::info!(url = %url, path = %path.display(), bytes = bytes.len(), "expose downloaded");
    Ok(path)
}
