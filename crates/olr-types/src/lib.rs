use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Outcome of a state-changing operation, as reported to API consumers.
///
/// Success carries an empty message; failure carries a human-readable
/// reason. This is a transport shape, not an error type: code inside the
/// workspace uses `Result` and converts at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub succeeded: bool,
    pub message: String,
}

impl Outcome {
    /// A successful outcome with no message.
    pub fn success() -> Self {
        Self {
            succeeded: true,
            message: String::new(),
        }
    }

    /// A failed outcome carrying the reason.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
        }
    }
}

/// Outcome of a query, carrying the fetched data beside the verdict.
///
/// `data` is absent exactly when the query failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome<T> {
    pub outcome: Outcome,
    pub data: Option<T>,
}

impl<T> QueryOutcome<T> {
    /// A successful query with its data.
    pub fn success(data: T) -> Self {
        Self {
            outcome: Outcome::success(),
            data: Some(data),
        }
    }

    /// A failed query; the data slot stays empty.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::failure(message),
            data: None,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for QueryOutcome<T> {
    /// Folds a `Result` into the envelope at the API boundary, rendering
    /// the error through its `Display` form.
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Position of one page within a paged query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    /// One-based page number.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Total matching rows across all pages.
    pub total: u64,
}

impl Paging {
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        Self {
            page,
            page_size,
            total,
        }
    }

    /// Number of pages the total fills, rounding the last partial page up.
    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }
}

/// One page of query results plus its paging position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedData<T> {
    pub paging: Paging,
    pub data: Vec<T>,
}

impl<T> PagedData<T> {
    pub fn new(paging: Paging, data: Vec<T>) -> Self {
        Self { paging, data }
    }
}

/// Who did what, when. Attached to mutating operations for audit trails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub operator: String,
    pub action: String,
    pub at: NaiveDateTime,
}

impl AuditStamp {
    pub fn new(operator: impl Into<String>, action: impl Into<String>, at: NaiveDateTime) -> Self {
        Self {
            operator: operator.into(),
            action: action.into(),
            at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_outcome_constructors() {
        let ok = Outcome::success();
        assert!(ok.succeeded);
        assert!(ok.message.is_empty());

        let failed = Outcome::failure("no such order");
        assert!(!failed.succeeded);
        assert_eq!(failed.message, "no such order");
    }

    #[test]
    fn test_query_outcome_failure_has_no_data() {
        let result: QueryOutcome<Vec<String>> = QueryOutcome::failure("timeout");

        assert!(!result.outcome.succeeded);
        assert!(result.data.is_none());
    }

    #[test]
    fn test_query_outcome_folds_results() {
        let ok: QueryOutcome<u32> = Ok::<_, std::fmt::Error>(7).into();
        assert!(ok.outcome.succeeded);
        assert_eq!(ok.data, Some(7));

        let failed: QueryOutcome<u32> = Err::<u32, _>("no such order").into();
        assert!(!failed.outcome.succeeded);
        assert_eq!(failed.outcome.message, "no such order");
        assert!(failed.data.is_none());
    }

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(Paging::new(1, 20, 0).page_count(), 0);
        assert_eq!(Paging::new(1, 20, 40).page_count(), 2);
        assert_eq!(Paging::new(1, 20, 41).page_count(), 3);
        assert_eq!(Paging::new(1, 0, 41).page_count(), 0);
    }

    #[test]
    fn test_query_outcome_serialises_round_trip() {
        let original = QueryOutcome::success(vec!["trade_order_202401".to_string()]);
        let json = serde_json::to_string(&original).unwrap();
        let parsed: QueryOutcome<Vec<String>> = serde_json::from_str(&json).unwrap();

        assert_eq!(original, parsed);
        assert!(json.contains("\"succeeded\":true"));
    }

    #[test]
    fn test_audit_stamp_serialises_datetime() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 9)
            .unwrap()
            .and_hms_opt(12, 30, 59)
            .unwrap();
        let stamp = AuditStamp::new("ops", "rebuild shard index", at);
        let json = serde_json::to_string(&stamp).unwrap();

        assert!(json.contains("2024-01-09T12:30:59"));
    }
}
