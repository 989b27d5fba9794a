//! The concrete catalog driver.
//!
//! Encodes everything site-specific: the listing row markup, the detail
//! link, the cookie banner and chat widget, the pagination controls and the
//! powermail application form. Everything above this module talks to the
//! [`PageDriver`] trait only.

use crate::driver::{ApplicationForm, ApplyOutcome, PageDriver, PageFlip};
use crate::error::{BrowserError, Result};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// One listing card in the search result list.
const ROW_SELECTOR: &str = ".row.openimmo-search-list-item";
/// Cookie consent banner accept button.
const COOKIE_ACCEPT_SELECTOR: &str = ".cm-btn.cm-btn-success";
/// Chat widget dismiss control.
const CHAT_DISMISS_SELECTOR: &str = "#removeConvaiseChat";
/// Pagination link to the next result page.
const NEXT_PAGE_SELECTOR: &str = "a[title='N\u{e4}chste Immobilien Seite']";
/// Detail links the bot never follows.
const SENIOR_HOUSING_MARKER: &str = "seniorenwohnungen";

// Powermail application form fields on the detail page.
const FIELD_WBS_YES: &str = "#powermail_field_wbsvorhanden_1";
const FIELD_WBS_NO: &str = "#powermail_field_wbsvorhanden_2";
const FIELD_WBS_DATE: &str = "#powermail_field_wbsgueltigbis";
const FIELD_WBS_ROOMS: &str = "#powermail_field_wbszimmeranzahl";
const FIELD_WBS_INCOME_TIER: &str = "#powermail_field_einkommensgrenzenacheinkommensbescheinigung9";
const FIELD_WBS_SPECIAL_NEED: &str = "#powermail_field_wbsmitbesonderemwohnbedarf_1";
const FIELD_SALUTATION: &str = "#powermail_field_anrede";
const FIELD_LAST_NAME: &str = "#powermail_field_name";
const FIELD_FIRST_NAME: &str = "#powermail_field_vorname";
const FIELD_STREET: &str = "#powermail_field_strasse";
const FIELD_ZIP: &str = "#powermail_field_plz";
const FIELD_CITY: &str = "#powermail_field_ort";
const FIELD_EMAIL: &str = "#powermail_field_e_mail";
const FIELD_PHONE: &str = "#powermail_field_telefon";
const FIELD_PRIVACY: &str = "#powermail_field_datenschutzhinweis_1";
const SUBMIT_SELECTOR: &str = "button[type='submit']";

#[derive(Debug, Deserialize)]
struct PaginationState {
    page: usize,
    total: usize,
}

/// Chromium-backed [`PageDriver`] for the housing catalog.
pub struct CatalogDriver {
    page: Page,
    dry_run: bool,
}

impl CatalogDriver {
    /// Driver over an open page. With `dry_run` the application form is
    /// filled but never submitted.
    #[must_use]
    pub fn new(page: Page, dry_run: bool) -> Self {
        Self { page, dry_run }
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(BrowserError::cdp)?
            .into_value()
            .map_err(|e| BrowserError::Evaluation(e.to_string()))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        element.click().await.map_err(BrowserError::cdp)?;
        Ok(())
    }

    /// Click an element that may legitimately be absent (overlays).
    async fn try_click(&self, selector: &str) -> bool {
        match self.click(selector).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(selector = selector, error = %e, "optional element not clicked");
                false
            }
        }
    }

    async fn fill_input(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        element.click().await.map_err(BrowserError::cdp)?;
        element.type_str(value).await.map_err(BrowserError::cdp)?;
        Ok(())
    }

    /// Set a `<select>`'s value and fire its change event.
    async fn select_value(&self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return false; \
             el.value = {val}; el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true; }})()",
            sel = js_string(selector),
            val = js_string(value),
        );
        let found: bool = self.eval(script).await?;
        if found {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(selector.to_string()))
        }
    }

    async fn detail_url(&self, index: usize) -> Result<String> {
        let script = format!(
            "(() => {{ const rows = document.querySelectorAll({rows}); \
             if ({index} >= rows.length) return null; \
             const link = rows[{index}].querySelector(\"a[title='Details']\"); \
             return link ? link.href : null; }})()",
            rows = js_string(ROW_SELECTOR),
        );
        let href: Option<String> = self.eval(script).await?;
        href.ok_or_else(|| BrowserError::SelectorNotFound("a[title='Details']".to_string()))
    }

    async fn live_row_count(&self) -> Result<usize> {
        let script = format!(
            "document.querySelectorAll({rows}).length",
            rows = js_string(ROW_SELECTOR)
        );
        self.eval(script).await
    }

    async fn fill_application_form(&self, form: &ApplicationForm) -> Result<()> {
        if form.wbs {
            self.click(FIELD_WBS_YES).await?;
            if !form.wbs_date.is_empty() {
                self.fill_input(FIELD_WBS_DATE, &form.wbs_date).await?;
            }
            if !form.wbs_rooms.is_empty() {
                self.select_value(FIELD_WBS_ROOMS, &form.wbs_rooms).await?;
            }
            if !form.wbs_income_tier.is_empty() {
                self.select_value(FIELD_WBS_INCOME_TIER, &form.wbs_income_tier)
                    .await?;
            }
            if form.wbs_special_housing_need {
                self.click(FIELD_WBS_SPECIAL_NEED).await?;
            }
        } else {
            self.click(FIELD_WBS_NO).await?;
        }

        self.select_value(FIELD_SALUTATION, &form.salutation).await?;
        self.fill_input(FIELD_LAST_NAME, &form.last_name).await?;
        self.fill_input(FIELD_FIRST_NAME, &form.first_name).await?;
        self.fill_input(FIELD_STREET, &form.street).await?;
        self.fill_input(FIELD_ZIP, &form.zip_code).await?;
        self.fill_input(FIELD_CITY, &form.city).await?;
        self.fill_input(FIELD_EMAIL, &form.email).await?;
        if !form.phone.is_empty() {
            self.fill_input(FIELD_PHONE, &form.phone).await?;
        }
        self.click(FIELD_PRIVACY).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PageDriver for CatalogDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation(format!("{url}: {e}")))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::Navigation(format!("{url}: {e}")))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(BrowserError::cdp)?
            .ok_or_else(|| BrowserError::Navigation("page has no URL".to_string()))
    }

    async fn page_source(&self) -> Result<String> {
        self.page.content().await.map_err(BrowserError::cdp)
    }

    async fn listing_fragments(&self) -> Result<Vec<String>> {
        let script = format!(
            "Array.from(document.querySelectorAll({rows})).map(el => el.outerHTML)",
            rows = js_string(ROW_SELECTOR)
        );
        self.eval(script).await
    }

    async fn dismiss_overlays(&self) -> Result<()> {
        if self.try_click(COOKIE_ACCEPT_SELECTOR).await {
            tracing::debug!("cookie banner accepted");
        }
        if self.try_click(CHAT_DISMISS_SELECTOR).await {
            tracing::debug!("chat widget dismissed");
        }
        Ok(())
    }

    async fn apply_to_listing(
        &self,
        index: usize,
        form: &ApplicationForm,
    ) -> Result<ApplyOutcome> {
        let available = self.live_row_count().await?;
        if index >= available {
            return Err(BrowserError::StaleListingIndex { index, available });
        }

        let detail_url = self.detail_url(index).await?;
        if detail_url.to_lowercase().contains(SENIOR_HOUSING_MARKER) {
            return Ok(ApplyOutcome::SkippedSeniorHousing { detail_url });
        }

        self.navigate(&detail_url).await?;
        self.fill_application_form(form).await?;

        if self.dry_run {
            tracing::info!(url = %detail_url, "dry run, form filled but not submitted");
            return Ok(ApplyOutcome::DryRun { detail_url });
        }

        self.click(SUBMIT_SELECTOR).await?;
        // Let the form post settle before anyone reads the page again
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(ApplyOutcome::Submitted { detail_url })
    }

    async fn next_page(&self) -> Result<PageFlip> {
        let present: bool = self
            .eval(format!(
                "document.querySelector({sel}) !== null",
                sel = js_string(NEXT_PAGE_SELECTOR)
            ))
            .await?;
        if !present {
            return Ok(PageFlip::LastPage);
        }

        self.click(NEXT_PAGE_SELECTOR).await?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::Navigation(format!("next page: {e}")))?;

        // The two arrow items bracket the numbered pages
        let state: PaginationState = self
            .eval(
                "(() => { const items = document.querySelectorAll('ul.pagination li'); \
                 const total = Math.max(items.length - 2, 0); \
                 const active = document.querySelector('ul.pagination li.active'); \
                 const page = active ? (parseInt(active.textContent.trim(), 10) || 0) : 0; \
                 return { page: page, total: total }; })()"
                    .to_string(),
            )
            .await?;
        Ok(PageFlip::Advanced {
            page: state.page,
            total: state.total,
        })
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(BrowserError::cdp)
    }
}

/// Encode a Rust string as a JS string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string("plain"), "\"plain\"");
        assert_eq!(js_string("O'Brien \"x\""), r#""O'Brien \"x\"""#);
    }

    #[test]
    fn test_senior_housing_marker_is_case_insensitive_by_lowercasing() {
        let url = "https://example.org/Seniorenwohnungen/flat-1";
        assert!(url.to_lowercase().contains(SENIOR_HOUSING_MARKER));
    }

    #[test]
    fn test_selectors_are_stable() {
        // The row selector is what the parser's fragments come from; a
        // change here changes every identity hash downstream.
        assert_eq!(ROW_SELECTOR, ".row.openimmo-search-list-item");
        assert!(SUBMIT_SELECTOR.contains("submit"));
    }
}
