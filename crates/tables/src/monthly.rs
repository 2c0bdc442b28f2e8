//! Internal implementation of month-partition routing.
//!
//! This module contains the partition cutover rule, the order-number
//! timestamp parser and the month-range enumeration.

use crate::{TableError, TableResult};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

/// The instant partitioning went live. Rows dated earlier stay in the
/// unpartitioned base table.
fn default_cutover() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2016, 1, 9)
        .expect("fixed cutover date is valid")
        .and_hms_milli_opt(0, 30, 59, 999)
        .expect("fixed cutover time is valid")
}

/// Routing rules for month-partitioned tables.
///
/// A `MonthlyTables` value is nothing but the cutover instant; every method
/// is a pure string computation and the type is freely shareable across
/// threads.
///
/// # Construction
/// - [`MonthlyTables::new`] uses the production cutover,
///   `2016-01-09 00:30:59.999`.
/// - [`MonthlyTables::with_cutover`] pins a different cutover, which tests
///   and migration tooling use to exercise both sides of the rule.
///
/// # Partition rule
/// A row dated at or after the cutover belongs to `<base>_<YYYYMM>`; an
/// older row belongs to the unpartitioned `<base>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthlyTables {
    cutover: NaiveDateTime,
}

impl Default for MonthlyTables {
    fn default() -> Self {
        Self::new()
    }
}

impl MonthlyTables {
    /// Creates the router with the production cutover instant.
    pub fn new() -> Self {
        Self {
            cutover: default_cutover(),
        }
    }

    /// Creates a router with an explicit cutover instant.
    pub fn with_cutover(cutover: NaiveDateTime) -> Self {
        Self { cutover }
    }

    /// The cutover instant this router partitions from.
    pub fn cutover(&self) -> NaiveDateTime {
        self.cutover
    }

    /// Resolves the physical table for a row dated `at`.
    ///
    /// # Arguments
    ///
    /// * `base` - Logical table name, for example `trade_order`.
    /// * `at` - The row's creation instant.
    ///
    /// # Returns
    ///
    /// `<base>_<YYYYMM>` for instants at or after the cutover, `base`
    /// unchanged for older instants.
    pub fn table_for_date(&self, base: &str, at: NaiveDateTime) -> String {
        if at >= self.cutover {
            format!("{}_{}", base, at.format("%Y%m"))
        } else {
            base.to_string()
        }
    }

    /// Resolves the physical table for an order number, reading the current
    /// clock for year disambiguation.
    ///
    /// Equivalent to [`MonthlyTables::table_for_order_at`] with the current
    /// local time.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] when the order number's embedded timestamp
    /// cannot be parsed; see [`order_timestamp`].
    pub fn table_for_order(&self, base: &str, order: &str) -> TableResult<String> {
        self.table_for_order_at(base, order, Local::now().naive_local())
    }

    /// Resolves the physical table for an order number against an explicit
    /// clock.
    ///
    /// # Arguments
    ///
    /// * `base` - Logical table name.
    /// * `order` - Order number with an embedded creation timestamp.
    /// * `now` - Clock used to disambiguate two-digit years.
    ///
    /// # Returns
    ///
    /// The table the order's row lives in, by the same rule as
    /// [`MonthlyTables::table_for_date`].
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] when the embedded timestamp cannot be
    /// parsed.
    pub fn table_for_order_at(
        &self,
        base: &str,
        order: &str,
        now: NaiveDateTime,
    ) -> TableResult<String> {
        let at = order_timestamp(order, now)?;
        Ok(self.table_for_date(base, at))
    }

    /// Lists the partition tables covering a date range, clamping the end
    /// to the current local date.
    ///
    /// Equivalent to [`MonthlyTables::tables_for_range_as_of`] with today's
    /// date.
    pub fn tables_for_range(&self, base: &str, start: NaiveDate, end: NaiveDate) -> Vec<String> {
        self.tables_for_range_as_of(base, start, end, Local::now().date_naive())
    }

    /// Lists the partition tables covering a date range against an explicit
    /// "today".
    ///
    /// One name is produced per calendar month from `start`'s month through
    /// `end`'s month inclusive. An `end` past `today` is clamped to
    /// `today` first. The list always contains at least the start month,
    /// even when clamping leaves `end` before `start`; callers are expected
    /// to pass `start <= end`.
    ///
    /// Every name carries a month suffix. The cutover plays no part here:
    /// a range reaching back before it still lists suffixed names for
    /// those months.
    ///
    /// # Arguments
    ///
    /// * `base` - Logical table name.
    /// * `start` - First date of the range.
    /// * `end` - Last date of the range, inclusive.
    /// * `today` - Upper clamp for `end`.
    pub fn tables_for_range_as_of(
        &self,
        base: &str,
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> Vec<String> {
        let end = if end > today { today } else { end };
        let first = month_index(start);
        let span = (month_index(end) - first).max(0);
        (0..=span)
            .map(|offset| {
                let index = first + offset;
                let year = index.div_euclid(12);
                let month = index.rem_euclid(12) + 1;
                format!("{}_{:04}{:02}", base, year, month)
            })
            .collect()
    }
}

/// Months since year zero, used to walk calendar months without day
/// arithmetic.
fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Reads the two-digit field at byte offset `at`.
fn field2(order: &str, at: usize, what: &'static str) -> TableResult<u32> {
    let pair = order.as_bytes().get(at..at + 2).ok_or_else(|| {
        TableError::TooShort(format!("'{}' ends before the {} field", order, what))
    })?;
    if !pair.iter().all(|b| b.is_ascii_digit()) {
        return Err(TableError::NonNumeric(format!(
            "{} field of '{}'",
            what, order
        )));
    }
    Ok(u32::from(pair[0] - b'0') * 10 + u32::from(pair[1] - b'0'))
}

/// Reads the four-digit field at byte offset `at`.
fn field4(order: &str, at: usize, what: &'static str) -> TableResult<u32> {
    Ok(field2(order, at, what)? * 100 + field2(order, at + 2, what)?)
}

/// Validates the parsed fields as a real calendar instant.
fn to_datetime(
    order: &str,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> TableResult<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(|| {
            TableError::InvalidDate(format!(
                "'{}' gives {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                order, year, month, day, hour, minute, second
            ))
        })
}

/// Extracts the creation instant embedded in an order number.
///
/// The timestamp payload starts after an optional single alphabetic prefix.
/// Its first two digits are compared against the leading two digits of
/// `now`'s year:
///
/// - On a match the payload is read as `YYYYMMDDHHMMSS` (four-digit year).
/// - Otherwise the two digits are a clipped year within the current
///   century, and the payload is read as `YYMMDDHHMMSS`.
///
/// Trailing characters beyond the timestamp fields are ignored, which is
/// how sequence and nonce digits after the timestamp coexist with routing.
///
/// For bare clipped-year numbers only, an hour above 24, minute above 60 or
/// second above 60 is clamped to zero instead of rejected. Legacy importers
/// depend on malformed numbers of that shape still routing by their date;
/// prefixed and four-digit-year numbers stay strict. The comparisons are
/// strict too, so hour 24 or minute 60 is not clamped and fails date
/// validation instead.
///
/// # Arguments
///
/// * `order` - Order number to read.
/// * `now` - Clock supplying "this year" for the two-digit disambiguation.
///
/// # Returns
///
/// The embedded creation instant, at second precision.
///
/// # Errors
///
/// - [`TableError::TooShort`] when the payload ends before a field.
/// - [`TableError::NonNumeric`] when a field holds non-digit characters.
/// - [`TableError::InvalidDate`] when the fields do not form a real
///   calendar date, including unclamped out-of-range time fields.
pub fn order_timestamp(order: &str, now: NaiveDateTime) -> TableResult<NaiveDateTime> {
    let has_prefix = order
        .as_bytes()
        .first()
        .map_or(false, |b| b.is_ascii_alphabetic());
    let start = usize::from(has_prefix);

    let century = now.year().div_euclid(100);
    let century_digits = format!("{:02}", century);
    let matches_century =
        order.as_bytes().get(start..start + 2) == Some(century_digits.as_bytes());

    if matches_century {
        let year = field4(order, start, "year")? as i32;
        let month = field2(order, start + 4, "month")?;
        let day = field2(order, start + 6, "day")?;
        let hour = field2(order, start + 8, "hour")?;
        let minute = field2(order, start + 10, "minute")?;
        let second = field2(order, start + 12, "second")?;
        to_datetime(order, year, month, day, hour, minute, second)
    } else {
        let year = century * 100 + field2(order, start, "year")? as i32;
        let month = field2(order, start + 2, "month")?;
        let day = field2(order, start + 4, "day")?;
        let mut hour = field2(order, start + 6, "hour")?;
        let mut minute = field2(order, start + 8, "minute")?;
        let mut second = field2(order, start + 10, "second")?;
        if !has_prefix {
            if hour > 24 {
                hour = 0;
            }
            if minute > 60 {
                minute = 0;
            }
            if second > 60 {
                second = 0;
            }
        }
        to_datetime(order, year, month, day, hour, minute, second)
    }
}
