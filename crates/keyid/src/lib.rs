//! Key-identifier allocation.
//!
//! OLR rows are keyed by digit strings minted in-process rather than by
//! database sequences, so inserts never round-trip to the database for an id
//! and rows created on different hosts still sort by creation time.
//!
//! This module provides [`KeyFactory`], an allocator for two identifier
//! series:
//!
//! ## Primary series
//! The row-key series used for ordinary inserts.
//!
//! - Layout: `yymmddHHMMSSmmm` timestamp (15 digits), then a 4-digit random
//!   nonce, then a zero-padded sequence counter.
//! - Minimum requested length: 16. At the minimum the counter is a single
//!   digit, so the id is 20 characters; each unit above the minimum widens
//!   the counter by one digit.
//!
//! Example: `240109123059123` + `4821` + `7` = `24010912305912348217`.
//!
//! ## Business series
//! The series for externally visible references (order numbers and the
//! like). A caller-supplied business code is appended so the reference
//! carries its kind.
//!
//! - Layout: `yyyymmddHHMMSSmmm` timestamp (17 digits), then a 7-digit
//!   random nonce, then the zero-padded counter, then the code.
//! - Minimum requested length: 24.
//!
//! ## Uniqueness
//! Each series holds its own counter and random source behind a mutex, so
//! concurrent callers are serialised per series and the counter is walked
//! cyclically with no skipped or doubled values. Collision avoidance rests
//! on the millisecond timestamp advancing, the counter cycling, and the
//! random nonce as a second layer. The nonce is drawn from a uniform range,
//! not a cryptographic source; under sustained generation faster than the
//! counter modulus per millisecond a (timestamp, counter) pair can repeat
//! and only the nonce distinguishes the ids. Widen the requested length
//! where that rate is realistic.
//!
//! Identifiers sort lexicographically in timestamp order between calls in
//! different milliseconds. Within one millisecond the nonce field makes the
//! order arbitrary.

mod factory;

// Re-export public types
pub use factory::{KeyFactory, BUSINESS_MIN_LEN, PRIMARY_MIN_LEN};
