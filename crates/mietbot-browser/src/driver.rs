//! The page-rendering capability boundary.
//!
//! The crawl loop only ever talks to [`PageDriver`]; the concrete Chromium
//! driver lives behind it, and tests substitute their own implementation.

use crate::error::Result;
use mietbot_core::UserProfile;

/// Outcome of a pagination attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFlip {
    /// The catalog advanced to another page.
    Advanced {
        /// Page number now shown (1-based)
        page: usize,
        /// Total pages the catalog reports
        total: usize,
    },
    /// There is no further page. This is a normal terminal outcome, not an
    /// error.
    LastPage,
}

/// Outcome of one application attempt against a listing's detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The form was filled and submitted.
    Submitted {
        /// URL of the detail page the form was submitted on
        detail_url: String,
    },
    /// Dry-run mode: the form was filled but never submitted.
    DryRun {
        /// URL of the detail page
        detail_url: String,
    },
    /// The detail link points at senior housing, which the bot never
    /// applies to.
    SkippedSeniorHousing {
        /// URL of the skipped detail page
        detail_url: String,
    },
}

/// The values one application form submission carries.
#[derive(Debug, Clone)]
pub struct ApplicationForm {
    /// Recipient address the application is filed under
    pub email: String,
    /// Salutation for the form's select field
    pub salutation: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Street and house number
    pub street: String,
    /// Postal code
    pub zip_code: String,
    /// City
    pub city: String,
    /// Phone number
    pub phone: String,
    /// Applicant holds a WBS certificate
    pub wbs: bool,
    /// WBS valid-until date
    pub wbs_date: String,
    /// WBS room entitlement
    pub wbs_rooms: String,
    /// WBS income tier
    pub wbs_income_tier: String,
    /// WBS marked with special housing need
    pub wbs_special_housing_need: bool,
}

impl ApplicationForm {
    /// Form values for one recipient address, everything else from the
    /// profile.
    #[must_use]
    pub fn for_recipient(profile: &UserProfile, recipient: &str) -> Self {
        Self {
            email: recipient.trim().to_string(),
            salutation: profile.salutation.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            street: profile.street.clone(),
            zip_code: profile.zip_code.clone(),
            city: profile.city.clone(),
            phone: profile.phone.clone(),
            wbs: profile.wbs,
            wbs_date: profile.wbs_date.clone(),
            wbs_rooms: profile.wbs_rooms.clone(),
            wbs_income_tier: profile.wbs_income_tier.clone(),
            wbs_special_housing_need: profile.wbs_special_housing_need,
        }
    }
}

/// Everything the crawl loop needs from a rendered catalog page.
#[async_trait::async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL and wait for the page to settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// URL of the page currently shown.
    async fn current_url(&self) -> Result<String>;

    /// Full markup of the page currently shown.
    async fn page_source(&self) -> Result<String>;

    /// Outer HTML of every listing row currently on the page, in page
    /// order.
    async fn listing_fragments(&self) -> Result<Vec<String>>;

    /// Dismiss the cookie banner and the chat widget. Best-effort: absent
    /// overlays are not an error.
    async fn dismiss_overlays(&self) -> Result<()>;

    /// Open the detail page of the listing at `index` and submit the
    /// application form.
    async fn apply_to_listing(&self, index: usize, form: &ApplicationForm)
        -> Result<ApplyOutcome>;

    /// Advance to the next catalog page, if one exists.
    async fn next_page(&self) -> Result<PageFlip>;

    /// PNG screenshot of the current page.
    async fn screenshot(&self) -> Result<Vec<u8>>;
}
