//! Constants used throughout the OLR core crate.

/// Logical name of the order table, before any partition suffix.
pub const DEFAULT_ORDER_TABLE: &str = "trade_order";

/// Business code stamped onto order references.
pub const ORDER_BUSINESS_CODE: &str = "OD";
