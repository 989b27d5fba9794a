//! Composite ledger: ordered fan-out over several backends.

use crate::error::Result;
use crate::ledger::ApplicationLedger;
use async_trait::async_trait;
use mietbot_listing::Listing;

/// Redundant ledger over an ordered list of member backends.
///
/// Reads answer true if any member answers true; a failing member is logged
/// and counted as "that member says no", so the composite keeps working on
/// whatever backends remain reachable. Writes go to every member
/// independently; a member's failure is logged and does not stop its
/// siblings. There is no transaction across members: a partial write
/// (recorded in one backend, missing in another) is an accepted failure
/// mode, healed by the next successful write of the same pair.
pub struct CompositeLedger {
    members: Vec<Box<dyn ApplicationLedger>>,
}

impl CompositeLedger {
    /// Composite over the given members, consulted in order.
    #[must_use]
    pub fn new(members: Vec<Box<dyn ApplicationLedger>>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl ApplicationLedger for CompositeLedger {
    /// Initializes every member; fails only if a member fails, in which case
    /// the caller should treat the whole ledger as unusable (a backend that
    /// cannot even initialize would silently lose the guarantee later).
    async fn initialize(&self) -> Result<()> {
        for member in &self.members {
            member.initialize().await?;
        }
        Ok(())
    }

    async fn has_applied(&self, recipient: &str, identity_hash: &str) -> Result<bool> {
        for member in &self.members {
            match member.has_applied(recipient, identity_hash).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        backend = member.name(),
                        error = %e,
                        "ledger member read failed, counting as not applied"
                    );
                }
            }
        }
        Ok(false)
    }

    async fn record_application(&self, recipient: &str, listing: &Listing) -> Result<()> {
        for member in &self.members {
            if let Err(e) = member.record_application(recipient, listing).await {
                tracing::warn!(
                    backend = member.name(),
                    listing = %listing.title,
                    error = %e,
                    "ledger member write failed, continuing with remaining members"
                );
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "composite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::ledger::FileLedger;
    use mietbot_listing::parse;
    use tempfile::TempDir;

    /// Member that fails every operation, standing in for an unreachable
    /// remote store.
    struct UnreachableLedger;

    #[async_trait]
    impl ApplicationLedger for UnreachableLedger {
        async fn initialize(&self) -> Result<()> {
            Ok(())
        }

        async fn has_applied(&self, _recipient: &str, _identity_hash: &str) -> Result<bool> {
            Err(StoreError::Remote {
                status: 503,
                operation: "get document".to_string(),
                message: "unavailable".to_string(),
            })
        }

        async fn record_application(&self, _recipient: &str, _listing: &Listing) -> Result<()> {
            Err(StoreError::Remote {
                status: 503,
                operation: "upsert document".to_string(),
                message: "unavailable".to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "unreachable"
        }
    }

    fn sample_listing() -> Listing {
        parse("Sunny Flat\nMitte\nTeststr 1\n10115 Berlin")
    }

    #[tokio::test]
    async fn test_any_member_true_wins() {
        let tmp = TempDir::new().expect("create temp dir");
        let recorded = FileLedger::new(tmp.path().join("a.json"));
        let empty = FileLedger::new(tmp.path().join("b.json"));
        let listing = sample_listing();

        recorded
            .record_application("anna@example.com", &listing)
            .await
            .expect("record");

        let composite = CompositeLedger::new(vec![Box::new(empty), Box::new(recorded)]);
        assert!(composite
            .has_applied("anna@example.com", &listing.identity_hash)
            .await
            .expect("check"));
    }

    #[tokio::test]
    async fn test_unreachable_member_degrades_reads() {
        let tmp = TempDir::new().expect("create temp dir");
        let file = FileLedger::new(tmp.path().join("ledger.json"));
        let listing = sample_listing();
        file.record_application("anna@example.com", &listing)
            .await
            .expect("record");

        let composite = CompositeLedger::new(vec![Box::new(UnreachableLedger), Box::new(file)]);

        // The failing first member is skipped; the healthy member answers
        assert!(composite
            .has_applied("anna@example.com", &listing.identity_hash)
            .await
            .expect("check"));
        assert!(!composite
            .has_applied("bert@example.com", &listing.identity_hash)
            .await
            .expect("check"));
    }

    #[tokio::test]
    async fn test_write_reaches_siblings_past_a_failure() {
        let tmp = TempDir::new().expect("create temp dir");
        let file = FileLedger::new(tmp.path().join("ledger.json"));
        let listing = sample_listing();

        let composite = CompositeLedger::new(vec![Box::new(UnreachableLedger), Box::new(file)]);
        composite
            .record_application("anna@example.com", &listing)
            .await
            .expect("record despite failing member");

        let reopened = FileLedger::new(tmp.path().join("ledger.json"));
        assert!(reopened
            .has_applied("anna@example.com", &listing.identity_hash)
            .await
            .expect("check"));
    }

    #[tokio::test]
    async fn test_empty_composite_says_no() {
        let composite = CompositeLedger::new(Vec::new());
        assert!(!composite
            .has_applied("anna@example.com", "deadbeef")
            .await
            .expect("check"));
    }
}
