//! The durable application record and its keys.

use chrono::Utc;
use mietbot_listing::{numeric, Listing};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The durable fact "recipient X applied to listing H on date D", plus
/// denormalized display fields for audit and export.
///
/// Field names match the remote ledger schema one to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    /// Recipient address, trimmed but in its original spelling
    pub email: String,
    /// The listing's identity hash
    pub flat_hash: String,
    /// Logical day of the application (ISO date)
    pub date: String,
    /// Same value as `date`; kept for the export schema
    pub applied_on: String,
    /// Listing title at application time
    pub title: String,
    /// Street and house number
    pub street: String,
    /// Postal code
    pub zip_code: String,
    /// `"street zip"`, trimmed
    pub address: String,
    /// Parsed warm rent in euros, when the listing carried one
    pub rent: Option<f64>,
    /// Parsed size in square meters, when the listing carried one
    pub size: Option<f64>,
    /// Parsed room count, when the listing carried one
    pub rooms: Option<u32>,
    /// The listing demanded a WBS certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wbs: Option<bool>,
    /// Record creation timestamp (RFC 3339)
    pub created_at: String,
}

impl ApplicationRecord {
    /// Build the record for one (recipient, listing) application, dated to
    /// the run's logical today.
    #[must_use]
    pub fn new(recipient: &str, listing: &Listing) -> Self {
        let now = Utc::now();
        let today = now.format("%Y-%m-%d").to_string();
        let address = format!("{} {}", listing.street, listing.zip_code)
            .trim()
            .to_string();

        Self {
            email: recipient.trim().to_string(),
            flat_hash: listing.identity_hash.clone(),
            date: today.clone(),
            applied_on: today,
            title: listing.title.clone(),
            street: listing.street.clone(),
            zip_code: listing.zip_code.clone(),
            address,
            rent: numeric::parse_rent(&listing.total_rent_raw),
            size: numeric::parse_size(&listing.size_raw),
            rooms: numeric::parse_rooms(&listing.rooms_raw),
            wbs: Some(listing.requires_wbs),
            created_at: now.to_rfc3339(),
        }
    }
}

/// Canonical recipient spelling used for every ledger key: trimmed and
/// lowercased, so two casings of one address are the same recipient.
#[must_use]
pub fn normalize_recipient(recipient: &str) -> String {
    recipient.trim().to_lowercase()
}

/// Document id of a (recipient, listing) pair in the remote ledger:
/// SHA-256 hex of `"{normalized recipient}|{identity hash}"`.
#[must_use]
pub fn remote_doc_id(recipient: &str, identity_hash: &str) -> String {
    let key = format!("{}|{identity_hash}", normalize_recipient(recipient));
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
