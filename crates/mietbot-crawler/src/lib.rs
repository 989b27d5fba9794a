//! Mietbot Crawler - the crawl/apply control loop.
//!
//! Ties the other crates together: the [`CrawlLoop`] walks catalog pages
//! through a [`PageDriver`](mietbot_browser::PageDriver), consults the
//! application ledger, matches listings against the profile and submits
//! applications, restarting the page pass whenever the live page changed
//! under it. [`run_session`] wraps the loop in browser lifecycle and crash
//! recovery for continuous operation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod connectivity;
pub mod control;
pub mod delay;
pub mod error;
pub mod session;

pub use control::CrawlLoop;
pub use delay::parse_delay;
pub use error::{CrawlerError, Result};
pub use session::run_session;
