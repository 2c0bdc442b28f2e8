//! Order-ledger composition service.
//!
//! This module ties the key allocator and the partition router to the
//! runtime configuration. It is the piece a repository layer holds: ids for
//! new rows come from here, and so does the physical table name to write
//! them to.
//!
//! ## Division of labour
//!
//! - `olr-keyid` mints the id strings and owns the counter state.
//! - `olr-tables` decides the partition suffix, purely computationally.
//! - This service supplies both with the configured order-table name and
//!   id length, and logs the one situation worth an operator's attention:
//!   an order number that cannot be routed.
//!
//! Repositories append nothing themselves; the names returned here are the
//! exact physical table names to put in SQL.

use crate::constants::ORDER_BUSINESS_CODE;
use crate::{CoreConfig, CoreResult};
use chrono::{Local, NaiveDate, NaiveDateTime};
use olr_keyid::{KeyFactory, BUSINESS_MIN_LEN};
use olr_tables::MonthlyTables;
use olr_types::AuditStamp;
use std::sync::Arc;

/// Ledger operations over the configured order table.
///
/// Holds the id allocator (stateful, mutex-guarded internally) and the
/// partition router (stateless). One instance is meant to live for the
/// process and be shared freely; all methods take `&self`.
#[derive(Debug)]
pub struct LedgerService {
    cfg: Arc<CoreConfig>,
    keys: KeyFactory,
    tables: MonthlyTables,
}

impl LedgerService {
    /// Creates the service from configuration.
    ///
    /// The allocator's default id length follows
    /// [`CoreConfig::id_min_len`]; the router uses the production cutover.
    ///
    /// # Arguments
    ///
    /// * `cfg` - Core configuration resolved at startup.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            keys: KeyFactory::with_min_len(cfg.id_min_len()),
            tables: MonthlyTables::new(),
            cfg,
        }
    }

    /// Creates the service from explicit parts.
    ///
    /// Tests use this to pin a seeded allocator or a custom cutover.
    pub fn with_parts(cfg: Arc<CoreConfig>, keys: KeyFactory, tables: MonthlyTables) -> Self {
        Self { cfg, keys, tables }
    }

    /// Allocates a primary-series row id at the configured length.
    pub fn allocate_row_id(&self) -> String {
        self.keys.next_id()
    }

    /// Allocates an externally visible order reference.
    ///
    /// Business series, stamped with [`ORDER_BUSINESS_CODE`].
    pub fn allocate_order_reference(&self) -> String {
        self.keys.next_business_id(ORDER_BUSINESS_CODE, BUSINESS_MIN_LEN)
    }

    /// Resolves the physical order table for an order number, using the
    /// current clock for year disambiguation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Routing`] when the order number's
    /// embedded timestamp cannot be parsed. The failure is logged here;
    /// whether to fall back to the unpartitioned table is for the caller
    /// to decide.
    pub fn order_table_for(&self, order: &str) -> CoreResult<String> {
        self.order_table_for_at(order, Local::now().naive_local())
    }

    /// Resolves the physical order table for an order number against an
    /// explicit clock.
    ///
    /// # Arguments
    ///
    /// * `order` - Order number carrying an embedded creation timestamp.
    /// * `now` - Clock supplying "this year" for two-digit years.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Routing`] when the order number cannot
    /// be parsed.
    pub fn order_table_for_at(&self, order: &str, now: NaiveDateTime) -> CoreResult<String> {
        match self
            .tables
            .table_for_order_at(self.cfg.order_table(), order, now)
        {
            Ok(table) => Ok(table),
            Err(err) => {
                tracing::warn!("unroutable order number '{}': {}", order, err);
                Err(err.into())
            }
        }
    }

    /// Resolves the physical order table for a row dated `at`.
    pub fn order_table_on(&self, at: NaiveDateTime) -> String {
        self.tables.table_for_date(self.cfg.order_table(), at)
    }

    /// Lists the physical order tables covering a date range, one per
    /// month, with the end clamped to today.
    pub fn order_tables_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<String> {
        self.tables.tables_for_range(self.cfg.order_table(), start, end)
    }

    /// Stamps an operator action with the current local time.
    pub fn audit(&self, operator: &str, action: &str) -> AuditStamp {
        AuditStamp::new(operator, action, Local::now().naive_local())
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn key_factory(&self) -> &KeyFactory {
        &self.keys
    }

    pub fn tables(&self) -> &MonthlyTables {
        &self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;

    fn service() -> LedgerService {
        LedgerService::new(Arc::new(CoreConfig::default()))
    }

    fn clock_2024() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_row_id_length_follows_config() {
        let default_len = service().allocate_row_id().len();
        assert_eq!(default_len, 20);

        let widened = LedgerService::new(Arc::new(
            CoreConfig::new("trade_order".to_string(), 20).unwrap(),
        ));
        assert_eq!(widened.allocate_row_id().len(), 24);
    }

    #[test]
    fn test_order_reference_carries_business_code() {
        let reference = service().allocate_order_reference();

        assert_eq!(reference.len(), 27);
        assert!(reference.ends_with(ORDER_BUSINESS_CODE));
        assert!(reference.starts_with("20"));
    }

    #[test]
    fn test_order_routing_uses_configured_table() {
        let svc = LedgerService::new(Arc::new(
            CoreConfig::new("settlement".to_string(), 16).unwrap(),
        ));

        let table = svc.order_table_for_at("240109123059", clock_2024()).unwrap();
        assert_eq!(table, "settlement_202401");
    }

    #[test]
    fn test_pre_cutover_order_routes_to_base_table() {
        let table = service()
            .order_table_for_at("150109123059", clock_2024())
            .unwrap();

        assert_eq!(table, "trade_order");
    }

    #[test]
    fn test_unroutable_order_surfaces_routing_error() {
        let result = service().order_table_for_at("junk", clock_2024());

        assert!(matches!(result, Err(CoreError::Routing(_))));
    }

    #[test]
    fn test_date_routing_and_range_listing() {
        let svc = service();

        assert_eq!(svc.order_table_on(clock_2024()), "trade_order_202406");

        let names = svc.order_tables_between(
            NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2020, 3, 10).unwrap(),
        );
        assert_eq!(
            names,
            vec![
                "trade_order_202001",
                "trade_order_202002",
                "trade_order_202003",
            ]
        );
    }

    #[test]
    fn test_seeded_parts_give_deterministic_ids() {
        let cfg = Arc::new(CoreConfig::default());
        let a = LedgerService::with_parts(
            Arc::clone(&cfg),
            KeyFactory::seeded(7),
            MonthlyTables::new(),
        );
        let b = LedgerService::with_parts(cfg, KeyFactory::seeded(7), MonthlyTables::new());

        let at = clock_2024();
        assert_eq!(a.key_factory().next_id_at(at), b.key_factory().next_id_at(at));
    }

    #[test]
    fn test_audit_stamp_records_operator_and_action() {
        let stamp = service().audit("ops", "rebuild shard index");

        assert_eq!(stamp.operator, "ops");
        assert_eq!(stamp.action, "rebuild shard index");
    }
}
