//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into core services. Resolving it up front keeps
//! request handling free of environment reads, which behave inconsistently
//! in multi-threaded runtimes and test harnesses.

use crate::constants::DEFAULT_ORDER_TABLE;
use crate::{CoreError, CoreResult};
use olr_keyid::PRIMARY_MIN_LEN;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    order_table: String,
    id_min_len: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Arguments
    ///
    /// * `order_table` - Logical order table name the router suffixes.
    /// * `id_min_len` - Requested length for allocated row ids.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] when `order_table` is empty or
    /// `id_min_len` is below the allocator's minimum. The allocator itself
    /// would silently raise a low value; configuration rejects it instead
    /// so a bad deployment fails at startup, not at first insert.
    pub fn new(order_table: String, id_min_len: usize) -> CoreResult<Self> {
        if order_table.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "order_table cannot be empty".into(),
            ));
        }
        if id_min_len < PRIMARY_MIN_LEN {
            return Err(CoreError::InvalidInput(format!(
                "id_min_len must be at least {}, got {}",
                PRIMARY_MIN_LEN, id_min_len
            )));
        }

        Ok(Self {
            order_table,
            id_min_len,
        })
    }

    pub fn order_table(&self) -> &str {
        &self.order_table
    }

    pub fn id_min_len(&self) -> usize {
        self.id_min_len
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            order_table: DEFAULT_ORDER_TABLE.to_string(),
            id_min_len: PRIMARY_MIN_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = CoreConfig::default();

        assert_eq!(cfg.order_table(), DEFAULT_ORDER_TABLE);
        assert_eq!(cfg.id_min_len(), PRIMARY_MIN_LEN);
    }

    #[test]
    fn test_valid_config_is_accepted() {
        let cfg = CoreConfig::new("settlement".to_string(), 20).unwrap();

        assert_eq!(cfg.order_table(), "settlement");
        assert_eq!(cfg.id_min_len(), 20);
    }

    #[test]
    fn test_empty_order_table_is_rejected() {
        let result = CoreConfig::new("   ".to_string(), 16);

        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_short_id_min_len_is_rejected() {
        let result = CoreConfig::new("trade_order".to_string(), 8);

        match result {
            Err(CoreError::InvalidInput(msg)) => assert!(msg.contains("16")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }
}
