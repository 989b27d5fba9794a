//! Mietbot Store - Durable state behind the bot.
//!
//! Two concerns live here. The [`ledger`] is the idempotency layer: the
//! durable record of which recipient already applied to which listing, with
//! file-backed, remote document-store and composite fan-out backends. The
//! [`config_store`] holds applicant profiles, either as a local JSON file or
//! as documents in the same remote store.
//!
//! The ledger is the bot's only cross-restart memory: the crawl loop may be
//! torn down and recreated at any time, and it is these records alone that
//! keep it from applying twice.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config_store;
pub mod error;
pub mod firestore;
pub mod ledger;

pub use config_store::{build_config_store, ConfigStore, FileConfigStore, RemoteConfigStore};
pub use error::{Result, StoreError};
pub use firestore::RemoteDocStore;
pub use ledger::{
    build_ledger, normalize_recipient, remote_doc_id, ApplicationLedger, ApplicationRecord,
    CompositeLedger, FileLedger, RemoteLedger,
};
