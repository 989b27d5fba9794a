//! Debug page snapshots.

use crate::driver::PageDriver;
use crate::error::Result;
use chrono::Local;
use std::fs;
use std::path::PathBuf;

/// Writes timestamped page dumps under a debug directory:
/// `html/<stamp>_<label>.html` and `screenshots/<stamp>_<label>.png`.
pub struct Snapshotter {
    dir: PathBuf,
}

impl Snapshotter {
    /// Snapshotter rooted at the given directory.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Dump the current page's markup and a screenshot. Failures are
    /// returned but callers treat snapshots as best-effort.
    pub async fn capture(&self, driver: &dyn PageDriver, label: &str) -> Result<()> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let name = format!("{stamp}_{}", sanitize_label(label));

        let html_dir = self.dir.join("html");
        fs::create_dir_all(&html_dir)?;
        let source = driver.page_source().await?;
        fs::write(html_dir.join(format!("{name}.html")), source)?;

        let shot_dir = self.dir.join("screenshots");
        fs::create_dir_all(&shot_dir)?;
        let png = driver.screenshot().await?;
        fs::write(shot_dir.join(format!("{name}.png")), png)?;

        tracing::debug!(label = label, dir = %self.dir.display(), "page snapshot written");
        Ok(())
    }
}

/// Make a label filesystem-safe.
pub(crate) fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.chars().take(60).collect()
}
