//! The crawl/apply control loop.
//!
//! One loop instance drives one browser session through the catalog:
//! load page, dismiss overlays, enumerate, sort cheapest-first, then walk
//! the listings and recipients, applying where the ledger and the criteria
//! allow. Any successful application restarts the page pass, because the
//! live page can no longer be trusted after a form submission; so does a
//! listing set that shrinks under the iteration. The loop holds no durable
//! state of its own: the ledger is the only memory that survives it.

use crate::connectivity;
use crate::delay::parse_delay;
use crate::error::{CrawlerError, Result};
use mietbot_browser::{
    expose, ApplicationForm, ApplyOutcome, BrowserError, PageDriver, PageFlip, Snapshotter,
};
use mietbot_core::{AppConfig, CrawlerSection, UserProfile};
use mietbot_listing::{evaluate, parse, sorted_by_rent, Listing, SortedEntry};
use mietbot_notify::{applied_notification, Notifier};
use mietbot_store::ApplicationLedger;
use std::path::PathBuf;
use std::time::Duration;

/// Pause between listings, to stay under the catalog's radar.
const LISTING_DELAY: Duration = Duration::from_secs(2);

/// Wait before re-probing when the network is unreachable.
const CONNECTIVITY_RETRY: Duration = Duration::from_secs(10);

/// Settle time after navigating back from a detail page.
const SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// Fallback when the configured application delay does not parse.
const DEFAULT_APPLICATION_DELAY: Duration = Duration::from_secs(10);

/// How one page pass ended.
enum PassAction {
    /// Page state changed (application sent, or listings mutated): start
    /// the pass over from `LoadPage`.
    Restart,
    /// Every listing was processed without touching the page.
    Completed,
}

/// One crawl loop over one browser session.
pub struct CrawlLoop<'a> {
    driver: &'a dyn PageDriver,
    ledger: &'a dyn ApplicationLedger,
    notifier: Option<&'a Notifier>,
    profile: &'a UserProfile,
    crawler: &'a CrawlerSection,
    snapshotter: Option<Snapshotter>,
    expose_dir: Option<PathBuf>,
    http: reqwest::Client,
    check_connectivity: bool,
    current_page: usize,
    advanced_since_reload: bool,
}

impl<'a> CrawlLoop<'a> {
    /// Wire a loop over the given collaborators.
    #[must_use]
    pub fn new(
        driver: &'a dyn PageDriver,
        ledger: &'a dyn ApplicationLedger,
        notifier: Option<&'a Notifier>,
        profile: &'a UserProfile,
        config: &'a AppConfig,
    ) -> Self {
        let snapshotter = config
            .browser
            .snapshot_dir
            .as_ref()
            .map(|dir| Snapshotter::new(dir.clone()));
        let expose_dir = config
            .browser
            .snapshot_dir
            .as_ref()
            .map(|dir| dir.join("exposes"));
        Self {
            driver,
            ledger,
            notifier,
            profile,
            crawler: &config.crawler,
            snapshotter,
            expose_dir,
            http: reqwest::Client::new(),
            check_connectivity: true,
            current_page: 1,
            advanced_since_reload: false,
        }
    }

    /// Disable the network probe before each pass. For tests that drive a
    /// scripted page without any network.
    #[must_use]
    pub fn without_connectivity_checks(mut self) -> Self {
        self.check_connectivity = false;
        self
    }

    /// Run until the catalog is exhausted (single-pass or
    /// exit-on-last-page) or an error aborts the session.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            if self.check_connectivity && !connectivity::is_online(&self.http).await {
                if self.crawler.run_once {
                    return Err(CrawlerError::Offline);
                }
                tracing::warn!(
                    retry_secs = CONNECTIVITY_RETRY.as_secs(),
                    "no connectivity, waiting"
                );
                tokio::time::sleep(CONNECTIVITY_RETRY).await;
                continue;
            }

            // LoadPage: unless pagination advanced us, go back to the start
            if self.advanced_since_reload {
                self.advanced_since_reload = false;
            } else {
                self.driver.navigate(&self.crawler.start_url).await?;
                self.current_page = 1;
            }
            self.driver.dismiss_overlays().await?;

            // Enumerate
            let fragments = self.driver.listing_fragments().await?;
            if fragments.is_empty() {
                if self.crawler.run_once {
                    tracing::info!("no listings found, single pass done");
                    return Ok(());
                }
                self.idle().await;
                continue;
            }
            self.capture_snapshot().await;

            // SortByRent
            let listings: Vec<Listing> = fragments.iter().map(|f| parse(f)).collect();
            let order = sorted_by_rent(&listings);
            tracing::info!(
                page = self.current_page,
                listings = listings.len(),
                "processing page, cheapest first"
            );

            // PerListing
            if let PassAction::Restart = self.process_page(&listings, &order).await? {
                continue;
            }

            // Paginate
            match self.driver.next_page().await? {
                PageFlip::Advanced { page, total } => {
                    tracing::info!(page = page, total = total, "advanced to next page");
                    self.current_page = page;
                    self.advanced_since_reload = true;
                }
                PageFlip::LastPage => {
                    if self.crawler.run_once || self.crawler.exit_on_last_page {
                        tracing::info!(page = self.current_page, "last page reached, terminating");
                        return Ok(());
                    }
                    self.idle().await;
                }
            }
        }
    }

    async fn process_page(
        &self,
        listings: &[Listing],
        order: &[SortedEntry],
    ) -> Result<PassAction> {
        for entry in order {
            tokio::time::sleep(LISTING_DELAY).await;

            // The live page may have shrunk under us (another bot applied,
            // the catalog rotated). An index past the end means the
            // enumeration is stale; re-enumerate rather than act on the
            // wrong listing.
            let live = self.driver.listing_fragments().await?;
            if entry.index >= live.len() {
                tracing::warn!(
                    index = entry.index,
                    live = live.len(),
                    "listing set mutated mid-pass, restarting page"
                );
                return Ok(PassAction::Restart);
            }

            let listing = &listings[entry.index];
            tracing::debug!(
                listing = %entry.title,
                rent = %entry.display_rent,
                "considering listing"
            );

            for recipient in &self.profile.emails {
                let recipient = recipient.trim();
                if recipient.is_empty() {
                    continue;
                }

                if self
                    .ledger
                    .has_applied(recipient, &listing.identity_hash)
                    .await?
                {
                    tracing::debug!(
                        listing = %entry.title,
                        recipient = recipient,
                        "already applied, skipping"
                    );
                    continue;
                }

                let outcome = evaluate(listing, self.profile);
                if let Some(reason) = outcome.primary_reason() {
                    tracing::info!(
                        listing = %entry.title,
                        recipient = recipient,
                        reason = %reason,
                        "listing does not match criteria, skipping"
                    );
                    // Criteria are recipient-independent; no point trying
                    // the remaining recipients
                    break;
                }

                match self.apply(entry, listing, recipient).await? {
                    PassAction::Restart => return Ok(PassAction::Restart),
                    PassAction::Completed => {}
                }
            }
        }
        Ok(PassAction::Completed)
    }

    /// One application attempt. `Restart` when the attempt touched the
    /// page, `Completed` when the listing was skipped without navigation.
    async fn apply(
        &self,
        entry: &SortedEntry,
        listing: &Listing,
        recipient: &str,
    ) -> Result<PassAction> {
        let form = ApplicationForm::for_recipient(self.profile, recipient);
        let outcome = match self.driver.apply_to_listing(entry.index, &form).await {
            Ok(outcome) => outcome,
            Err(BrowserError::StaleListingIndex { index, available }) => {
                tracing::warn!(
                    index = index,
                    live = available,
                    "listing vanished before application, restarting page"
                );
                return Ok(PassAction::Restart);
            }
            Err(e) => return Err(e.into()),
        };

        match outcome {
            ApplyOutcome::SkippedSeniorHousing { detail_url } => {
                tracing::info!(
                    listing = %entry.title,
                    url = %detail_url,
                    "senior housing, skipping"
                );
                Ok(PassAction::Completed)
            }
            ApplyOutcome::Submitted { detail_url } | ApplyOutcome::DryRun { detail_url } => {
                let dry_run = self.crawler.dry_run;
                tracing::info!(
                    listing = %entry.title,
                    recipient = recipient,
                    rent = %entry.display_rent,
                    url = %detail_url,
                    dry_run = dry_run,
                    "application submitted"
                );

                // Recording even a dry run keeps the loop from refilling
                // the same form forever; dry runs belong to test ledgers.
                self.ledger.record_application(recipient, listing).await?;
                self.notify(listing, recipient, &detail_url);
                self.fetch_expose(listing, &detail_url).await;

                let delay =
                    parse_delay(&self.crawler.application_delay, DEFAULT_APPLICATION_DELAY);
                tracing::debug!(secs = delay.as_secs(), "post-application delay");
                tokio::time::sleep(delay).await;

                self.driver.navigate(&self.crawler.start_url).await?;
                tokio::time::sleep(SETTLE_DELAY).await;
                Ok(PassAction::Restart)
            }
        }
    }

    fn notify(&self, listing: &Listing, recipient: &str, detail_url: &str) {
        let Some(notifier) = self.notifier else {
            return;
        };
        let mail = applied_notification(
            notifier.recipient(),
            listing,
            recipient,
            detail_url,
            self.profile,
        );
        if let Err(e) = notifier.send(&mail) {
            tracing::warn!(listing = %listing.title, error = %e, "notification failed");
        }
    }

    /// Best-effort exposé download into the debug directory.
    async fn fetch_expose(&self, listing: &Listing, detail_url: &str) {
        let Some(dir) = &self.expose_dir else {
            return;
        };
        let html = match self.driver.page_source().await {
            Ok(html) => html,
            Err(e) => {
                tracing::debug!(error = %e, "could not read detail page for expose scan");
                return;
            }
        };
        let Some(link) = expose::find_expose_link(&html, detail_url) else {
            tracing::debug!(listing = %listing.title, "no expose link on detail page");
            return;
        };
        if let Err(e) = expose::download_expose(&link, dir, &listing.title).await {
            tracing::debug!(listing = %listing.title, error = %e, "expose download failed");
        }
    }

    async fn capture_snapshot(&self) {
        let Some(snapshotter) = &self.snapshotter else {
            return;
        };
        let label = format!("page_{}", self.current_page);
        if let Err(e) = snapshotter.capture(self.driver, &label).await {
            tracing::debug!(error = %e, "page snapshot failed");
        }
    }

    async fn idle(&self) {
        let wait = Duration::from_secs(self.crawler.refresh_interval_minutes * 60);
        tracing::info!(minutes = self.crawler.refresh_interval_minutes, "idling");
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mietbot_store::FileLedger;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted driver: a fixed sequence of listing-fragment sets, one per
    /// enumeration, holding the last set once the script runs out.
    struct ScriptedDriver {
        state: Mutex<ScriptState>,
    }

    struct ScriptState {
        /// Fragment sets returned by successive `listing_fragments` calls
        enumerations: Vec<Vec<String>>,
        cursor: usize,
        navigations: Vec<String>,
        /// (row index, recipient) of every submitted application
        applications: Vec<(usize, String)>,
        /// Row indexes that resolve to a senior-housing detail link
        senior_rows: Vec<usize>,
        next_page: PageFlip,
    }

    impl ScriptedDriver {
        fn new(enumerations: Vec<Vec<String>>) -> Self {
            Self {
                state: Mutex::new(ScriptState {
                    enumerations,
                    cursor: 0,
                    navigations: Vec::new(),
                    applications: Vec::new(),
                    senior_rows: Vec::new(),
                    next_page: PageFlip::LastPage,
                }),
            }
        }

        fn with_senior_rows(self, rows: Vec<usize>) -> Self {
            self.state.lock().expect("lock").senior_rows = rows;
            self
        }

        fn applications(&self) -> Vec<(usize, String)> {
            self.state.lock().expect("lock").applications.clone()
        }

        fn navigations(&self) -> usize {
            self.state.lock().expect("lock").navigations.len()
        }
    }

    #[async_trait]
    impl PageDriver for ScriptedDriver {
        async fn navigate(&self, url: &str) -> mietbot_browser::Result<()> {
            self.state
                .lock()
                .expect("lock")
                .navigations
                .push(url.to_string());
            Ok(())
        }

        async fn current_url(&self) -> mietbot_browser::Result<String> {
            Ok("https://catalog.test/angebote/".to_string())
        }

        async fn page_source(&self) -> mietbot_browser::Result<String> {
            Ok(String::new())
        }

        async fn listing_fragments(&self) -> mietbot_browser::Result<Vec<String>> {
            let mut state = self.state.lock().expect("lock");
            let index = state.cursor.min(state.enumerations.len().saturating_sub(1));
            let fragments = state
                .enumerations
                .get(index)
                .cloned()
                .unwrap_or_default();
            state.cursor += 1;
            Ok(fragments)
        }

        async fn dismiss_overlays(&self) -> mietbot_browser::Result<()> {
            Ok(())
        }

        async fn apply_to_listing(
            &self,
            index: usize,
            form: &ApplicationForm,
        ) -> mietbot_browser::Result<ApplyOutcome> {
            let mut state = self.state.lock().expect("lock");
            let detail_url = format!("https://catalog.test/details/{index}/");
            if state.senior_rows.contains(&index) {
                return Ok(ApplyOutcome::SkippedSeniorHousing {
                    detail_url: format!("https://catalog.test/seniorenwohnungen/{index}/"),
                });
            }
            state.applications.push((index, form.email.clone()));
            Ok(ApplyOutcome::Submitted { detail_url })
        }

        async fn next_page(&self) -> mietbot_browser::Result<PageFlip> {
            Ok(self.state.lock().expect("lock").next_page.clone())
        }

        async fn screenshot(&self) -> mietbot_browser::Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn fragment(title: &str, rent: &str) -> String {
        format!(
            "<h2 class='imageTitle'>{title}</h2>\
             <div class='address'>Teststr 1, 10115 Berlin</div>\
             <div class='main-property-value main-property-rent'>Warmmiete {rent}</div>\
             <div class='main-property-value main-property-size'>Gr\u{f6}\u{df}e 54,00 m\u{b2}</div>\
             <div class='main-property-value main-property-rooms'>Zimmer 2</div>"
        )
    }

    fn test_profile() -> UserProfile {
        UserProfile {
            emails: vec!["anna@example.com".to_string()],
            first_name: "Anna".to_string(),
            last_name: "Muster".to_string(),
            max_rent: 1200.0,
            min_size: 40.0,
            min_rooms: 1,
            ..UserProfile::default()
        }
    }

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.crawler.run_once = true;
        config.crawler.application_delay = "0s".to_string();
        config
    }

    fn test_ledger(tmp: &TempDir) -> FileLedger {
        FileLedger::new(tmp.path().join("ledger.json"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_page_terminates_in_single_pass() {
        let tmp = TempDir::new().expect("create temp dir");
        let driver = ScriptedDriver::new(vec![Vec::new()]);
        let ledger = test_ledger(&tmp);
        let profile = test_profile();
        let config = test_config();

        let mut crawl = CrawlLoop::new(&driver, &ledger, None, &profile, &config)
            .without_connectivity_checks();
        crawl.run().await.expect("run");

        assert!(driver.applications().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_applies_once_then_skips_via_ledger() {
        let tmp = TempDir::new().expect("create temp dir");
        let page = vec![fragment("Sunny Flat", "850,00 \u{20ac}")];
        let driver = ScriptedDriver::new(vec![page]);
        let ledger = test_ledger(&tmp);
        let profile = test_profile();
        let config = test_config();

        let mut crawl = CrawlLoop::new(&driver, &ledger, None, &profile, &config)
            .without_connectivity_checks();
        crawl.run().await.expect("run");

        // Applied exactly once despite the post-application restart pass
        assert_eq!(driver.applications().len(), 1);
        assert_eq!(driver.applications()[0].1, "anna@example.com");

        let listing = parse(&fragment("Sunny Flat", "850,00 \u{20ac}"));
        assert!(ledger
            .has_applied("anna@example.com", &listing.identity_hash)
            .await
            .expect("check"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_processes_cheapest_listing_first() {
        let tmp = TempDir::new().expect("create temp dir");
        let page = vec![
            fragment("Expensive", "1.100,00 \u{20ac}"),
            fragment("Cheap", "700,00 \u{20ac}"),
        ];
        let driver = ScriptedDriver::new(vec![page]);
        let ledger = test_ledger(&tmp);
        let profile = test_profile();
        let config = test_config();

        let mut crawl = CrawlLoop::new(&driver, &ledger, None, &profile, &config)
            .without_connectivity_checks();
        crawl.run().await.expect("run");

        let applications = driver.applications();
        assert_eq!(applications.len(), 2);
        // Row 1 (the cheap listing) is applied to before row 0
        assert_eq!(applications[0].0, 1);
        assert_eq!(applications[1].0, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_matching_listing_is_skipped() {
        let tmp = TempDir::new().expect("create temp dir");
        let page = vec![fragment("Too Expensive", "2.500,00 \u{20ac}")];
        let driver = ScriptedDriver::new(vec![page]);
        let ledger = test_ledger(&tmp);
        let profile = test_profile();
        let config = test_config();

        let mut crawl = CrawlLoop::new(&driver, &ledger, None, &profile, &config)
            .without_connectivity_checks();
        crawl.run().await.expect("run");

        assert!(driver.applications().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_senior_housing_is_never_applied_to() {
        let tmp = TempDir::new().expect("create temp dir");
        let page = vec![fragment("Seniorenresidenz", "600,00 \u{20ac}")];
        let driver = ScriptedDriver::new(vec![page]).with_senior_rows(vec![0]);
        let ledger = test_ledger(&tmp);
        let profile = test_profile();
        let config = test_config();

        let mut crawl = CrawlLoop::new(&driver, &ledger, None, &profile, &config)
            .without_connectivity_checks();
        crawl.run().await.expect("run");

        assert!(driver.applications().is_empty());
        let listing = parse(&fragment("Seniorenresidenz", "600,00 \u{20ac}"));
        assert!(!ledger
            .has_applied("anna@example.com", &listing.identity_hash)
            .await
            .expect("check"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutated_listing_set_restarts_pass() {
        let tmp = TempDir::new().expect("create temp dir");
        // Both listings fail the rent criterion, so nothing restarts the
        // pass except the page itself: the first enumeration sees two
        // rows, and by the time the second row is due the live page has
        // shrunk to one. The stale index must restart the pass instead of
        // acting on the wrong row.
        let enumerations = vec![
            vec![
                fragment("Flat A", "1.500,00 \u{20ac}"),
                fragment("Flat B", "1.800,00 \u{20ac}"),
            ],
            vec![
                fragment("Flat A", "1.500,00 \u{20ac}"),
                fragment("Flat B", "1.800,00 \u{20ac}"),
            ],
            vec![fragment("Flat A", "1.500,00 \u{20ac}")],
        ];
        let driver = ScriptedDriver::new(enumerations);
        let ledger = test_ledger(&tmp);
        let profile = test_profile();
        let config = test_config();

        let mut crawl = CrawlLoop::new(&driver, &ledger, None, &profile, &config)
            .without_connectivity_checks();
        crawl.run().await.expect("run");

        assert!(driver.applications().is_empty());
        // Initial load plus the reload after the stale index
        assert!(driver.navigations() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_recipient_gets_an_application() {
        let tmp = TempDir::new().expect("create temp dir");
        let page = vec![fragment("Sunny Flat", "850,00 \u{20ac}")];
        let driver = ScriptedDriver::new(vec![page]);
        let ledger = test_ledger(&tmp);
        let mut profile = test_profile();
        profile.emails = vec![
            "anna@example.com".to_string(),
            "bert@example.com".to_string(),
        ];
        let config = test_config();

        let mut crawl = CrawlLoop::new(&driver, &ledger, None, &profile, &config)
            .without_connectivity_checks();
        crawl.run().await.expect("run");

        let recipients: Vec<String> = driver
            .applications()
            .into_iter()
            .map(|(_, recipient)| recipient)
            .collect();
        // Profile order, one application each, across restarted passes
        assert_eq!(recipients, ["anna@example.com", "bert@example.com"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_navigates_back_to_start_url() {
        let tmp = TempDir::new().expect("create temp dir");
        let page = vec![fragment("Sunny Flat", "850,00 \u{20ac}")];
        let driver = ScriptedDriver::new(vec![page]);
        let ledger = test_ledger(&tmp);
        let profile = test_profile();
        let config = test_config();

        let mut crawl = CrawlLoop::new(&driver, &ledger, None, &profile, &config)
            .without_connectivity_checks();
        crawl.run().await.expect("run");

        // Initial load, post-application return, restarted pass load
        assert!(driver.navigations() >= 3);
    }
}
