//! Mietbot Browser - Chromium automation behind the page-rendering boundary.
//!
//! The crawl loop never sees a browser: it talks to the [`PageDriver`]
//! capability trait. This crate provides the trait, the chromiumoxide
//! [`BrowserEngine`] session, and the [`CatalogDriver`] that knows the
//! housing catalog's actual markup (listing rows, overlays, pagination, the
//! powermail application form). Exposé PDF discovery and debug page
//! snapshots live here too, since both need the rendered page.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod catalog;
pub mod driver;
pub mod engine;
pub mod error;
pub mod expose;
pub mod snapshot;

pub use catalog::CatalogDriver;
pub use driver::{ApplicationForm, ApplyOutcome, PageDriver, PageFlip};
pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use snapshot::Snapshotter;
