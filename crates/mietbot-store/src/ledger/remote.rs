//! Remote document-store ledger.

use crate::error::Result;
use crate::firestore::RemoteDocStore;
use crate::ledger::record::{remote_doc_id, ApplicationRecord};
use crate::ledger::ApplicationLedger;
use async_trait::async_trait;
use mietbot_listing::Listing;

/// Ledger backed by the remote document store.
///
/// One document per (normalized recipient, identity hash) pair, under a
/// deterministic id, so concurrent bot instances upserting the same pair
/// converge on one record without a read-modify-write race.
///
/// Failures propagate. A network or auth error is not evidence of absence;
/// treating it as "not applied" would re-apply on every outage. The caller
/// (or the composite ledger) decides how to degrade.
pub struct RemoteLedger {
    store: RemoteDocStore,
    collection: String,
}

impl RemoteLedger {
    /// Ledger over the given store and collection.
    #[must_use]
    pub fn new(store: RemoteDocStore, collection: String) -> Self {
        Self { store, collection }
    }
}

#[async_trait]
impl ApplicationLedger for RemoteLedger {
    async fn initialize(&self) -> Result<()> {
        // Collections spring into existence on first write; a cheap read
        // proves the store is reachable and the credentials work.
        let _ = self
            .store
            .document_exists(&self.collection, "connectivity-probe")
            .await?;
        tracing::debug!(collection = %self.collection, "remote ledger reachable");
        Ok(())
    }

    async fn has_applied(&self, recipient: &str, identity_hash: &str) -> Result<bool> {
        let doc_id = remote_doc_id(recipient, identity_hash);
        self.store.document_exists(&self.collection, &doc_id).await
    }

    async fn record_application(&self, recipient: &str, listing: &Listing) -> Result<()> {
        let doc_id = remote_doc_id(recipient, &listing.identity_hash);
        let record = ApplicationRecord::new(recipient, listing);
        let fields = serde_json::to_value(&record)?;
        self.store
            .upsert_document(&self.collection, &doc_id, &fields)
            .await?;
        tracing::debug!(
            listing = %record.title,
            flat_hash = %record.flat_hash,
            "application recorded in remote ledger"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
