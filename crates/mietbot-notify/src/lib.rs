//! Mietbot Notify - Mail to the operator after each successful application.
//!
//! Send-only SMTP. Whether notifications happen is decided once, at
//! [`Notifier::from_config`]: no complete SMTP section or no notification
//! address means no notifier. Delivery failures are the caller's to log;
//! they are never fatal to the crawl loop.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod sender;
pub mod templates;

pub use error::{NotifyError, Result};
pub use sender::Notifier;
pub use templates::{applied_notification, EmailMessage};
