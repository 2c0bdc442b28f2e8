//! Month-partitioned table routing.
//!
//! OLR splits its high-volume tables into one physical table per calendar
//! month. A logical table `trade_order` is stored as `trade_order_202401`,
//! `trade_order_202402` and so on, and the repository layer appends the
//! right suffix before issuing SQL.
//!
//! This module provides [`MonthlyTables`], the routing rules that decide
//! which physical table a row lives in. Routing is a pure string
//! computation; nothing here touches a database.
//!
//! ## Partition scheme
//! - A row dated at or after the cutover instant lives in
//!   `<base>_<YYYYMM>` for its month.
//! - A row dated before the cutover lives in the unpartitioned `<base>`
//!   table. The default cutover is `2016-01-09 00:30:59.999`, the moment
//!   partitioning went live in production.
//!
//! ## Routing inputs
//! Three kinds of input resolve to a table name:
//! - An explicit date ([`MonthlyTables::table_for_date`]).
//! - An order number with an embedded creation timestamp
//!   ([`MonthlyTables::table_for_order`]).
//! - A date range, which yields one table name per month spanned
//!   ([`MonthlyTables::tables_for_range`]).
//!
//! ## Order-number timestamp layouts
//! Legacy order numbers embed their creation instant in one of two layouts,
//! optionally behind a single alphabetic prefix:
//!
//! - `[letter]YYYYMMDDHHMMSS...` with a full four-digit year, or
//! - `[letter]YYMMDDHHMMSS...` with the year clipped to two digits.
//!
//! The two are told apart by comparing the leading two digits of the
//! payload against the leading two digits of the current year: a match
//! means a four-digit year, anything else is read as a clipped year in the
//! current century. See [`order_timestamp`] for the full rules, including
//! the clamping lenience applied to one class of malformed legacy numbers.
//!
//! Malformed order numbers surface a [`TableError`] to the caller. Whether
//! to fall back to the unpartitioned table on error is caller policy; the
//! router never swallows a parse failure.

mod monthly;

// Re-export public types
pub use monthly::{order_timestamp, MonthlyTables};

/// Error type for order-number routing.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Order number shorter than the timestamp layout requires
    #[error("Order number too short: {0}")]
    TooShort(String),
    /// A digit field holds non-digit characters
    #[error("Order number field is not numeric: {0}")]
    NonNumeric(String),
    /// Digit fields do not form a real calendar date
    #[error("Order number encodes an invalid date: {0}")]
    InvalidDate(String),
}

/// Result type for order-number routing.
pub type TableResult<T> = Result<T, TableError>;
