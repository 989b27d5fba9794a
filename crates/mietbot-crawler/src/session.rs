//! Session lifecycle and crash recovery.
//!
//! A session is one browser process plus one crawl loop over it. In
//! continuous mode a crashed session is torn down completely and a fresh
//! one started after a short backoff; the ledger carries all the state
//! that matters across the restart, so the new session simply re-walks the
//! catalog and skips what was already applied to.

use crate::control::CrawlLoop;
use crate::error::Result;
use mietbot_browser::{BrowserEngine, CatalogDriver};
use mietbot_core::{AppConfig, UserProfile};
use mietbot_notify::Notifier;
use mietbot_store::ApplicationLedger;
use std::time::Duration;

/// Wait before recreating the browser after a session crash.
const RESTART_BACKOFF: Duration = Duration::from_secs(5);

/// Run crawl sessions until one completes normally.
///
/// In single-pass mode (`run_once`) the first session's result is final,
/// success or failure. Otherwise session errors are logged and the browser
/// is recreated from scratch.
pub async fn run_session(
    config: &AppConfig,
    profile: &UserProfile,
    ledger: &dyn ApplicationLedger,
    notifier: Option<&Notifier>,
) -> Result<()> {
    loop {
        match run_one_session(config, profile, ledger, notifier).await {
            Ok(()) => return Ok(()),
            Err(e) if config.crawler.run_once => return Err(e),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    backoff_secs = RESTART_BACKOFF.as_secs(),
                    "session crashed, recreating browser"
                );
                tokio::time::sleep(RESTART_BACKOFF).await;
            }
        }
    }
}

async fn run_one_session(
    config: &AppConfig,
    profile: &UserProfile,
    ledger: &dyn ApplicationLedger,
    notifier: Option<&Notifier>,
) -> Result<()> {
    let engine = BrowserEngine::launch(&config.browser).await?;
    let page = match engine.new_page().await {
        Ok(page) => page,
        Err(e) => {
            // Leaving a headless Chromium orphaned leaks the process
            if let Err(close_err) = engine.close().await {
                tracing::warn!(error = %close_err, "browser teardown failed");
            }
            return Err(e.into());
        }
    };

    let driver = CatalogDriver::new(page, config.crawler.dry_run);
    let mut crawl = CrawlLoop::new(&driver, ledger, notifier, profile, config);
    let result = crawl.run().await;

    if let Err(e) = engine.close().await {
        tracing::warn!(error = %e, "browser teardown failed");
    }
    result
}
