//! The normalized listing entity.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One rental offer, as extracted from a single catalog fragment.
///
/// Immutable once constructed by [`crate::parse`]: the crate exposes no
/// mutating operations, and the identity hash is a pure function of
/// `source_identity`, so re-parsing the same fragment always reproduces the
/// same entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// The raw fragment this listing was parsed from. Used only to derive
    /// identity, never displayed.
    pub source_identity: String,
    /// SHA-256 hex digest of `source_identity`; the listing's durable
    /// identity and the sole key tying it to ledger records.
    pub identity_hash: String,
    /// Offer title (empty when unrecoverable)
    pub title: String,
    /// District / neighborhood
    pub district: String,
    /// Street and house number
    pub street: String,
    /// 5-digit postal code
    pub zip_code: String,
    /// City
    pub city: String,
    /// Unparsed rent display string, e.g. `"Warmmiete 1.404,40 €"`
    pub total_rent_raw: String,
    /// Unparsed size display string, e.g. `"Größe 54,33 m²"`
    pub size_raw: String,
    /// Unparsed room display string, e.g. `"Zimmer 2"`
    pub rooms_raw: String,
    /// Whitespace-trimmed textual rendering of the fragment; what keyword
    /// exclusion and WBS detection run over.
    pub display_text: String,
    /// The housing-subsidy marker appears in the title or full text
    pub requires_wbs: bool,
}

/// SHA-256 hex digest of a fragment's raw bytes.
#[must_use]
pub fn identity_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}
