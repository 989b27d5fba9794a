//! The application ledger: who already applied to what.
//!
//! The ledger is the only memory that survives restarts, so every backend is
//! durable and every write is a keyed upsert. Failure policy differs by
//! layer: the file backend never raises on reads (a missing or corrupt local
//! file is benign and self-heals on the next write), the remote backend
//! propagates every failure (a network error is not evidence of absence),
//! and the composite backend degrades deliberately because redundancy is its
//! point.

pub mod composite;
pub mod file;
pub mod record;
pub mod remote;

use crate::error::{Result, StoreError};
use crate::firestore::RemoteDocStore;
use async_trait::async_trait;
use mietbot_core::AppConfig;
use mietbot_listing::Listing;
use std::path::PathBuf;

pub use composite::CompositeLedger;
pub use file::FileLedger;
pub use record::{normalize_recipient, remote_doc_id, ApplicationRecord};
pub use remote::RemoteLedger;

/// Durable record of applications, keyed by (normalized recipient, identity
/// hash).
#[async_trait]
pub trait ApplicationLedger: Send + Sync {
    /// Idempotent setup (create the file, reach the remote store).
    async fn initialize(&self) -> Result<()>;

    /// Whether this recipient already applied to this listing.
    async fn has_applied(&self, recipient: &str, identity_hash: &str) -> Result<bool>;

    /// Record one application. Upserts; recording the same pair again is a
    /// no-op at the key level.
    async fn record_application(&self, recipient: &str, listing: &Listing) -> Result<()>;

    /// Backend name for operator logs.
    fn name(&self) -> &'static str;
}

/// Build the ledger the config selects.
///
/// `file` is the single local store. `remote` is the redundant pair: local
/// file plus remote document store behind a composite, so an outage of
/// either side never loses the idempotency guarantee entirely.
pub fn build_ledger(config: &AppConfig) -> Result<Box<dyn ApplicationLedger>> {
    let path = ledger_path(config)?;
    match config.store.ledger_backend.as_str() {
        "file" => Ok(Box::new(FileLedger::new(path))),
        "remote" => {
            let store = RemoteDocStore::from_config(&config.remote)?;
            let remote = RemoteLedger::new(store, config.remote.collection.clone());
            Ok(Box::new(CompositeLedger::new(vec![
                Box::new(FileLedger::new(path)),
                Box::new(remote),
            ])))
        }
        other => Err(StoreError::InvalidConfig {
            field: "store.ledger_backend",
            reason: format!("unknown ledger backend {other:?} (expected \"file\" or \"remote\")"),
        }),
    }
}

fn ledger_path(config: &AppConfig) -> Result<PathBuf> {
    if let Some(path) = &config.store.ledger_path {
        return Ok(path.clone());
    }
    let data_dir = AppConfig::data_dir().map_err(|e| StoreError::InvalidConfig {
        field: "store.ledger_path",
        reason: e.to_string(),
    })?;
    Ok(data_dir.join("applications.json"))
}
