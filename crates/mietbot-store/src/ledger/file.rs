//! File-backed ledger: one pretty-printed JSON document on disk.

use crate::error::Result;
use crate::ledger::record::{normalize_recipient, ApplicationRecord};
use crate::ledger::ApplicationLedger;
use async_trait::async_trait;
use mietbot_listing::Listing;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// `{normalized recipient → {identity hash → record}}`. `BTreeMap` keeps the
/// file diffable between runs.
type LedgerDocument = BTreeMap<String, BTreeMap<String, ApplicationRecord>>;

/// Ledger stored as a single local JSON file.
///
/// Reads never raise: an absent or unreadable file answers "not applied",
/// because the local store's failure modes (first run, wiped data dir) are
/// benign and self-heal on the next write. Writes do raise.
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    /// Ledger at the given file path. Nothing is touched until
    /// `initialize` or the first write.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_document(&self) -> LedgerDocument {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "ledger file not readable, treating as empty");
                return LedgerDocument::new();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ledger file is not valid JSON, treating as empty");
                LedgerDocument::new()
            }
        }
    }

    fn write_document(&self, document: &LedgerDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[async_trait]
impl ApplicationLedger for FileLedger {
    async fn initialize(&self) -> Result<()> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "creating application ledger file");
            self.write_document(&LedgerDocument::new())?;
        }
        Ok(())
    }

    async fn has_applied(&self, recipient: &str, identity_hash: &str) -> Result<bool> {
        let document = self.read_document();
        Ok(document
            .get(&normalize_recipient(recipient))
            .is_some_and(|records| records.contains_key(identity_hash)))
    }

    async fn record_application(&self, recipient: &str, listing: &Listing) -> Result<()> {
        let mut document = self.read_document();
        let record = ApplicationRecord::new(recipient, listing);
        document
            .entry(normalize_recipient(recipient))
            .or_default()
            .insert(listing.identity_hash.clone(), record);
        self.write_document(&document)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mietbot_listing::parse;
    use tempfile::TempDir;

    fn sample_listing() -> Listing {
        parse("Sunny Flat\nMitte\nTeststr 1\n10115 Berlin\nWarmmiete\n850,00 \u{20ac}")
    }

    #[test]
    fn test_ledger_type_name() {
        let tmp = TempDir::new().expect("create temp dir");
        assert_eq!(FileLedger::new(tmp.path().join("l.json")).name(), "file");
    }

    #[tokio::test]
    async fn test_never_recorded_is_not_applied() {
        let tmp = TempDir::new().expect("create temp dir");
        let ledger = FileLedger::new(tmp.path().join("ledger.json"));
        ledger.initialize().await.expect("initialize");

        let applied = ledger
            .has_applied("anna@example.com", "deadbeef")
            .await
            .expect("check");
        assert!(!applied);
    }

    #[tokio::test]
    async fn test_record_then_has_applied() {
        let tmp = TempDir::new().expect("create temp dir");
        let ledger = FileLedger::new(tmp.path().join("ledger.json"));
        let listing = sample_listing();

        ledger
            .record_application("anna@example.com", &listing)
            .await
            .expect("record");

        assert!(ledger
            .has_applied("anna@example.com", &listing.identity_hash)
            .await
            .expect("check"));
        // A different recipient remains unrecorded
        assert!(!ledger
            .has_applied("bert@example.com", &listing.identity_hash)
            .await
            .expect("check"));
    }

    #[tokio::test]
    async fn test_recording_is_idempotent() {
        let tmp = TempDir::new().expect("create temp dir");
        let ledger = FileLedger::new(tmp.path().join("ledger.json"));
        let listing = sample_listing();

        for _ in 0..3 {
            ledger
                .record_application("anna@example.com", &listing)
                .await
                .expect("record");
        }

        let contents =
            fs::read_to_string(tmp.path().join("ledger.json")).expect("read ledger file");
        let document: LedgerDocument = serde_json::from_str(&contents).expect("parse ledger file");
        assert_eq!(document["anna@example.com"].len(), 1);
        assert!(ledger
            .has_applied("anna@example.com", &listing.identity_hash)
            .await
            .expect("check"));
    }

    #[tokio::test]
    async fn test_recipient_casing_is_normalized() {
        let tmp = TempDir::new().expect("create temp dir");
        let ledger = FileLedger::new(tmp.path().join("ledger.json"));
        let listing = sample_listing();

        ledger
            .record_application("user@example.com", &listing)
            .await
            .expect("record");

        assert!(ledger
            .has_applied("USER@EXAMPLE.COM", &listing.identity_hash)
            .await
            .expect("check"));
        assert!(ledger
            .has_applied("  user@example.com  ", &listing.identity_hash)
            .await
            .expect("check"));
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_empty_and_heals_on_write() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("ledger.json");
        fs::write(&path, "{ not json").expect("write corrupt file");

        let ledger = FileLedger::new(path.clone());
        assert!(!ledger
            .has_applied("anna@example.com", "deadbeef")
            .await
            .expect("check"));

        let listing = sample_listing();
        ledger
            .record_application("anna@example.com", &listing)
            .await
            .expect("record");

        let contents = fs::read_to_string(&path).expect("read ledger file");
        assert!(serde_json::from_str::<LedgerDocument>(&contents).is_ok());
    }

    #[tokio::test]
    async fn test_survives_reopening() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("ledger.json");
        let listing = sample_listing();

        {
            let ledger = FileLedger::new(path.clone());
            ledger
                .record_application("anna@example.com", &listing)
                .await
                .expect("record");
        }

        let reopened = FileLedger::new(path);
        assert!(reopened
            .has_applied("anna@example.com", &listing.identity_hash)
            .await
            .expect("check"));
    }
}
