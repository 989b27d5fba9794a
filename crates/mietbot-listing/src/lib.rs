//! Mietbot Listing - Parsing and matching for housing-catalog listings.
//!
//! This crate turns the raw listing fragments the browser hands over into
//! normalized [`Listing`] entities with a stable content-hash identity, and
//! decides which of them a profile should apply to.
//!
//! Parsing is a total function: any fragment, markup or plain text, yields a
//! `Listing`; fields the fragment doesn't carry degrade to empty strings.
//! Markup fragments are read through their structural CSS classes first, with
//! a text-mode pass filling whatever the markup left empty. The raw fragment
//! bytes are hashed into the listing's durable identity, so the same offer
//! always maps to the same ledger records no matter how often it is re-parsed.
//!
//! # Example
//!
//! ```rust
//! use mietbot_listing::parse;
//!
//! let listing = parse("<h2 class='imageTitle'>Sunny Flat</h2>\
//!     <div class='address'>Teststr 1, 10115 Berlin</div>");
//! assert_eq!(listing.title, "Sunny Flat");
//! assert_eq!(listing.zip_code, "10115");
//! assert!(!listing.requires_wbs);
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod listing;
pub mod matcher;
pub mod numeric;
pub mod parser;
pub mod sort;
mod text;

pub use listing::Listing;
pub use matcher::{evaluate, CriterionFailure, MatchOutcome};
pub use parser::parse;
pub use sort::{sorted_by_rent, SortedEntry};
