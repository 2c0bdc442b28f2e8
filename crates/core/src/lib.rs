//! # OLR Core
//!
//! Core business logic for the OLR order ledger.
//!
//! This crate wires the two leaf utilities to runtime configuration:
//! - Key-identifier allocation for new ledger rows (`olr-keyid`)
//! - Month-partition table routing for reads and writes (`olr-tables`)
//!
//! [`LedgerService`] is the composition callers hold: it allocates row ids
//! and order references sized per [`CoreConfig`], and resolves which
//! physical table a row belongs to before the repository layer issues SQL.
//!
//! **No API concerns**: command-line and service interfaces belong in their
//! own crates; this one stays at plain functions over strings and dates.

pub mod config;
pub mod constants;
mod error;
mod ledger;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use ledger::LedgerService;

// Re-export the leaf utilities and transport envelopes for downstream
// crates, so the CLI and any future API surface depend on this crate alone.
pub use olr_keyid::{KeyFactory, BUSINESS_MIN_LEN, PRIMARY_MIN_LEN};
pub use olr_tables::{order_timestamp, MonthlyTables, TableError, TableResult};
pub use olr_types::{AuditStamp, Outcome, PagedData, Paging, QueryOutcome};
