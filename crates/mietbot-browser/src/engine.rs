//! Chromium engine lifecycle.

use crate::error::{BrowserError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use mietbot_core::BrowserSection;
use tokio::task::JoinHandle;

/// One owned Chromium session.
///
/// The engine is the single shared mutable resource of the whole bot: one
/// session at a time, torn down and recreated wholesale on crash rather
/// than repaired in place.
pub struct BrowserEngine {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserEngine {
    /// Launch Chromium per the browser config section and start the CDP
    /// event loop.
    pub async fn launch(section: &BrowserSection) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(section.window_width, section.window_height)
            .request_timeout(std::time::Duration::from_secs(
                section.navigation_timeout_secs,
            ));
        if !section.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::Chromium)?;

        tracing::info!(headless = section.headless, "launching browser");
        let (browser, mut handler) = Browser::launch(config).await.map_err(BrowserError::cdp)?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                // Keep the CDP connection drained; individual event errors
                // surface through the operations that triggered them.
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open a fresh page.
    pub async fn new_page(&self) -> Result<Page> {
        self.browser
            .new_page("about:blank")
            .await
            .map_err(BrowserError::cdp)
    }

    /// Close the browser and stop the event loop. The engine is unusable
    /// afterwards; crash recovery launches a new one.
    pub async fn close(mut self) -> Result<()> {
        tracing::info!("closing browser session");
        self.browser.close().await.map_err(BrowserError::cdp)?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}
