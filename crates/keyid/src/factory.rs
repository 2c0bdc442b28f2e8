//! Internal implementation of the key-identifier factory.
//!
//! This module contains the two identifier series (primary and business)
//! and the mutex-guarded counter state backing them.

use chrono::{Local, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::sync::Mutex;

/// Smallest accepted requested length for the primary series.
///
/// Requests below this are raised to it, so a default-configured factory
/// always pads the counter to at least one digit.
pub const PRIMARY_MIN_LEN: usize = 16;

/// Smallest accepted requested length for the business series.
pub const BUSINESS_MIN_LEN: usize = 24;

/// Primary-series timestamp layout: two-digit year, millisecond precision.
const PRIMARY_STAMP: &str = "%y%m%d%H%M%S%3f";

/// Business-series timestamp layout: four-digit year, millisecond precision.
const BUSINESS_STAMP: &str = "%Y%m%d%H%M%S%3f";

/// Half-open nonce ranges for the two series (4 and 7 digits wide).
const PRIMARY_NONCE: Range<u32> = 1_000..9_999;
const BUSINESS_NONCE: Range<u32> = 1_000_000..9_999_999;

/// Per-series mutable state: the cyclic counter and the nonce source.
///
/// Both live under one mutex so a seeded factory replays an identical
/// (counter, nonce) stream.
#[derive(Debug)]
struct SeriesState {
    counter: u64,
    rng: StdRng,
}

impl SeriesState {
    fn new(rng: StdRng) -> Self {
        Self { counter: 0, rng }
    }

    /// Takes one step of the series: returns the current counter padded to
    /// `width` digits plus a fresh nonce, then advances and wraps the
    /// counter.
    ///
    /// The read, increment and wrap happen as one step under the caller's
    /// lock, so the emitted counter values walk `0..=modulus` cyclically
    /// with no gaps under any interleaving.
    fn advance(&mut self, width: u32, nonce_range: Range<u32>) -> (String, u32) {
        let modulus = counter_modulus(width);
        let counter = format!("{:0width$}", self.counter, width = width as usize);
        self.counter = self.counter.wrapping_add(1);
        if self.counter > modulus {
            self.counter = 0;
        }
        let nonce = self.rng.gen_range(nonce_range);
        (counter, nonce)
    }
}

/// Largest value the counter may emit for a field of `width` digits.
///
/// Saturates at `u64::MAX` once `10^width` no longer fits, which keeps
/// generation total for absurd requested lengths; the padded field simply
/// stops being all-nines at the top of the cycle.
fn counter_modulus(width: u32) -> u64 {
    match 10u64.checked_pow(width) {
        Some(m) => m - 1,
        None => u64::MAX,
    }
}

/// Counter field width for a requested length against a series minimum.
fn field_width(min_len: usize, series_min: usize) -> u32 {
    (min_len.max(series_min) - series_min + 1) as u32
}

/// Allocator for OLR key identifiers.
///
/// A factory owns two independent series, primary and business, each with
/// its own counter and random source. The series never share state: walking
/// one does not perturb the other, and tests can pin either stream with
/// [`KeyFactory::seeded`].
///
/// # Identifier shape
/// See the crate-level documentation for the field layout of each series.
///
/// # Concurrency
/// All methods take `&self`; the factory is meant to be shared (for example
/// behind an `Arc`) and called from any number of threads. Each generation
/// call holds the series lock only for the counter step and nonce draw.
///
/// # Construction
/// - [`KeyFactory::new`] seeds the random sources from the operating
///   system.
/// - [`KeyFactory::with_min_len`] additionally raises the default requested
///   length used by [`KeyFactory::next_id`].
/// - [`KeyFactory::seeded`] gives deterministic nonce streams for tests.
///
/// None of the generation methods can fail.
#[derive(Debug)]
pub struct KeyFactory {
    min_len: usize,
    primary: Mutex<SeriesState>,
    business: Mutex<SeriesState>,
}

impl Default for KeyFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyFactory {
    /// Creates a factory with the default requested length
    /// ([`PRIMARY_MIN_LEN`]) and operating-system seeded nonce sources.
    pub fn new() -> Self {
        Self::build(PRIMARY_MIN_LEN, StdRng::from_entropy(), StdRng::from_entropy())
    }

    /// Creates a factory whose no-argument [`KeyFactory::next_id`] requests
    /// `min_len` instead of the default.
    ///
    /// Values below [`PRIMARY_MIN_LEN`] are raised to it.
    ///
    /// # Arguments
    ///
    /// * `min_len` - Default requested length for primary-series ids.
    pub fn with_min_len(min_len: usize) -> Self {
        Self::build(min_len, StdRng::from_entropy(), StdRng::from_entropy())
    }

    /// Creates a factory with deterministic nonce streams.
    ///
    /// Two factories built from the same seed and driven with the same
    /// sequence of calls produce identical identifiers for identical
    /// timestamps. Counters start at zero as always.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed for the primary series; the business series derives
    ///   its own stream from it.
    pub fn seeded(seed: u64) -> Self {
        Self::build(
            PRIMARY_MIN_LEN,
            StdRng::seed_from_u64(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        )
    }

    /// Deterministic construction with a raised default requested length.
    pub fn seeded_with_min_len(seed: u64, min_len: usize) -> Self {
        Self::build(
            min_len,
            StdRng::seed_from_u64(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        )
    }

    fn build(min_len: usize, primary_rng: StdRng, business_rng: StdRng) -> Self {
        Self {
            min_len: min_len.max(PRIMARY_MIN_LEN),
            primary: Mutex::new(SeriesState::new(primary_rng)),
            business: Mutex::new(SeriesState::new(business_rng)),
        }
    }

    /// The default requested length used by [`KeyFactory::next_id`].
    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Allocates a primary-series id at the current local time.
    ///
    /// Equivalent to [`KeyFactory::next_id_sized`] with the factory's
    /// default requested length.
    pub fn next_id(&self) -> String {
        self.next_id_sized_at(self.min_len, Local::now().naive_local())
    }

    /// Allocates a primary-series id for an explicit timestamp.
    ///
    /// The counter and nonce still advance as usual; only the timestamp
    /// field is pinned. Intended for tests and for backfilling rows whose
    /// creation instant is already known.
    ///
    /// # Arguments
    ///
    /// * `at` - Timestamp to embed in place of the current time.
    pub fn next_id_at(&self, at: NaiveDateTime) -> String {
        self.next_id_sized_at(self.min_len, at)
    }

    /// Allocates a primary-series id and appends a business code.
    ///
    /// The code is a plain suffix; it takes no part in the length
    /// calculation, so `next_id_with_code("OD")` is exactly
    /// [`KeyFactory::next_id`] plus `"OD"`.
    ///
    /// # Arguments
    ///
    /// * `code` - Suffix identifying the row's kind to downstream systems.
    pub fn next_id_with_code(&self, code: &str) -> String {
        format!("{}{}", self.next_id(), code)
    }

    /// Allocates a primary-series id with a per-call requested length.
    ///
    /// # Arguments
    ///
    /// * `min_len` - Requested length; raised to [`PRIMARY_MIN_LEN`] when
    ///   below it. Each unit above the minimum widens the counter field by
    ///   one digit, multiplying the counter cycle by ten.
    pub fn next_id_sized(&self, min_len: usize) -> String {
        self.next_id_sized_at(min_len, Local::now().naive_local())
    }

    /// Core primary-series routine: explicit length and timestamp.
    ///
    /// # Arguments
    ///
    /// * `min_len` - Requested length, raised to [`PRIMARY_MIN_LEN`].
    /// * `at` - Timestamp to embed.
    ///
    /// # Returns
    ///
    /// A string of `15 + 4 + (min_len - 15)` digits: timestamp, nonce, then
    /// the zero-padded counter.
    pub fn next_id_sized_at(&self, min_len: usize, at: NaiveDateTime) -> String {
        let width = field_width(min_len, PRIMARY_MIN_LEN);
        let stamp = at.format(PRIMARY_STAMP).to_string();
        let mut state = self.primary.lock().expect("primary series lock poisoned");
        let (counter, nonce) = state.advance(width, PRIMARY_NONCE);
        format!("{}{}{}", stamp, nonce, counter)
    }

    /// Allocates a business-series id at the current local time.
    ///
    /// # Arguments
    ///
    /// * `code` - Business code appended after the counter field.
    /// * `min_len` - Requested length; raised to [`BUSINESS_MIN_LEN`] when
    ///   below it.
    pub fn next_business_id(&self, code: &str, min_len: usize) -> String {
        self.next_business_id_at(code, min_len, Local::now().naive_local())
    }

    /// Core business-series routine: explicit timestamp.
    ///
    /// # Arguments
    ///
    /// * `code` - Business code appended after the counter field.
    /// * `min_len` - Requested length, raised to [`BUSINESS_MIN_LEN`].
    /// * `at` - Timestamp to embed.
    ///
    /// # Returns
    ///
    /// A string of `17 + 7 + (min_len - 23)` digits followed by `code`:
    /// four-digit-year timestamp, seven-digit nonce, zero-padded counter,
    /// code.
    pub fn next_business_id_at(&self, code: &str, min_len: usize, at: NaiveDateTime) -> String {
        let width = field_width(min_len, BUSINESS_MIN_LEN);
        let stamp = at.format(BUSINESS_STAMP).to_string();
        let mut state = self.business.lock().expect("business series lock poisoned");
        let (counter, nonce) = state.advance(width, BUSINESS_NONCE);
        format!("{}{}{}{}", stamp, nonce, counter, code)
    }

    /// Current primary-series counter value (the value the next call will
    /// emit).
    pub fn primary_counter(&self) -> u64 {
        self.primary.lock().expect("primary series lock poisoned").counter
    }

    /// Current business-series counter value.
    pub fn business_counter(&self) -> u64 {
        self.business.lock().expect("business series lock poisoned").counter
    }

    /// Rewinds both counters to zero.
    ///
    /// The nonce sources are left untouched, so a seeded factory's random
    /// stream keeps its position.
    pub fn reset_counters(&self) {
        self.primary.lock().expect("primary series lock poisoned").counter = 0;
        self.business
            .lock()
            .expect("business series lock poisoned")
            .counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn fixed_instant() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 9)
            .unwrap()
            .and_hms_milli_opt(12, 30, 59, 123)
            .unwrap()
    }

    #[test]
    fn test_default_primary_id_is_20_digits() {
        let factory = KeyFactory::new();
        let id = factory.next_id_at(fixed_instant());

        assert_eq!(id.len(), 20);
        assert!(id.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn test_primary_id_embeds_two_digit_year_timestamp() {
        let factory = KeyFactory::new();
        let id = factory.next_id_at(fixed_instant());

        assert!(id.starts_with("240109123059123"));
    }

    #[test]
    fn test_requested_length_widens_counter_field() {
        let factory = KeyFactory::new();

        // One unit above the minimum adds one counter digit.
        assert_eq!(factory.next_id_sized_at(17, fixed_instant()).len(), 21);
        assert_eq!(factory.next_id_sized_at(20, fixed_instant()).len(), 24);
    }

    #[test]
    fn test_requested_length_below_minimum_is_raised() {
        let factory = KeyFactory::new();
        let id = factory.next_id_sized_at(3, fixed_instant());

        assert_eq!(id.len(), 20);
    }

    #[test]
    fn test_factory_min_len_raises_default_request() {
        let factory = KeyFactory::with_min_len(20);

        assert_eq!(factory.min_len(), 20);
        assert_eq!(factory.next_id_at(fixed_instant()).len(), 24);
    }

    #[test]
    fn test_factory_min_len_below_minimum_is_raised() {
        let factory = KeyFactory::with_min_len(1);

        assert_eq!(factory.min_len(), PRIMARY_MIN_LEN);
    }

    #[test]
    fn test_counter_starts_at_zero_and_increments() {
        let factory = KeyFactory::new();

        assert_eq!(factory.primary_counter(), 0);

        let first = factory.next_id_at(fixed_instant());
        let second = factory.next_id_at(fixed_instant());

        // Counter is the final digit at the default width.
        assert!(first.ends_with('0'));
        assert!(second.ends_with('1'));
        assert_eq!(factory.primary_counter(), 2);
    }

    #[test]
    fn test_counter_wraps_after_modulus_plus_one_calls() {
        let factory = KeyFactory::new();
        let at = fixed_instant();

        // Default width is one digit, so the counter walks 0..=9 and wraps.
        let ids: Vec<String> = (0..11).map(|_| factory.next_id_at(at)).collect();

        for (i, id) in ids.iter().take(10).enumerate() {
            assert!(id.ends_with(&i.to_string()));
        }
        assert!(ids[10].ends_with('0'));
        assert_eq!(&ids[10][19..], &ids[0][19..]);
    }

    #[test]
    fn test_nonce_field_is_four_digits_in_range() {
        let factory = KeyFactory::new();

        for _ in 0..200 {
            let id = factory.next_id_at(fixed_instant());
            let nonce: u32 = id[15..19].parse().unwrap();
            assert!((1000..9999).contains(&nonce));
        }
    }

    #[test]
    fn test_code_is_appended_verbatim() {
        let factory = KeyFactory::new();
        let id = factory.next_id_with_code("OD");

        assert_eq!(id.len(), 22);
        assert!(id.ends_with("OD"));
    }

    #[test]
    fn test_business_id_shape() {
        let factory = KeyFactory::new();
        let id = factory.next_business_id_at("TRD", 24, fixed_instant());

        // 17 timestamp digits, 7 nonce digits, 1 counter digit, then code.
        assert_eq!(id.len(), 28);
        assert!(id.starts_with("20240109123059123"));
        assert!(id.ends_with("TRD"));

        let nonce: u32 = id[17..24].parse().unwrap();
        assert!((1_000_000..9_999_999).contains(&nonce));
        assert_eq!(&id[24..25], "0");
    }

    #[test]
    fn test_business_length_below_minimum_is_raised() {
        let factory = KeyFactory::new();
        let id = factory.next_business_id_at("X", 10, fixed_instant());

        assert_eq!(id.len(), 26);
    }

    #[test]
    fn test_series_counters_are_independent() {
        let factory = KeyFactory::new();

        factory.next_business_id_at("TRD", 24, fixed_instant());
        factory.next_business_id_at("TRD", 24, fixed_instant());

        assert_eq!(factory.primary_counter(), 0);
        assert_eq!(factory.business_counter(), 2);

        factory.next_id_at(fixed_instant());

        assert_eq!(factory.primary_counter(), 1);
        assert_eq!(factory.business_counter(), 2);
    }

    #[test]
    fn test_seeded_factories_replay_identical_ids() {
        let a = KeyFactory::seeded(42);
        let b = KeyFactory::seeded(42);
        let at = fixed_instant();

        for _ in 0..50 {
            assert_eq!(a.next_id_at(at), b.next_id_at(at));
        }
        for _ in 0..50 {
            assert_eq!(
                a.next_business_id_at("TRD", 24, at),
                b.next_business_id_at("TRD", 24, at)
            );
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = KeyFactory::seeded(1);
        let b = KeyFactory::seeded(2);
        let at = fixed_instant();

        let ids_a: Vec<String> = (0..10).map(|_| a.next_id_at(at)).collect();
        let ids_b: Vec<String> = (0..10).map(|_| b.next_id_at(at)).collect();

        assert_ne!(ids_a, ids_b);
    }

    #[test]
    fn test_reset_counters_rewinds_both_series() {
        let factory = KeyFactory::new();

        factory.next_id_at(fixed_instant());
        factory.next_business_id_at("TRD", 24, fixed_instant());
        factory.reset_counters();

        assert_eq!(factory.primary_counter(), 0);
        assert_eq!(factory.business_counter(), 0);

        let id = factory.next_id_at(fixed_instant());
        assert!(id.ends_with('0'));
    }

    #[test]
    fn test_ids_sort_with_wall_clock_time() {
        let factory = KeyFactory::new();
        let earlier = fixed_instant();
        let later = NaiveDate::from_ymd_opt(2024, 1, 9)
            .unwrap()
            .and_hms_milli_opt(12, 31, 0, 0)
            .unwrap();

        let first = factory.next_id_at(earlier);
        let second = factory.next_id_at(later);

        assert!(first < second);
    }

    #[test]
    fn test_ten_thousand_widened_ids_are_distinct() {
        // Width five gives a counter cycle of 100 000, so ten thousand ids
        // at one pinned timestamp cannot collide whatever the nonces do.
        let factory = KeyFactory::new();
        let at = fixed_instant();

        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(factory.next_id_sized_at(20, at)));
        }
    }

    #[test]
    fn test_concurrent_generation_yields_distinct_ids() {
        let factory = Arc::new(KeyFactory::new());
        let at = fixed_instant();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let factory = Arc::clone(&factory);
                std::thread::spawn(move || {
                    (0..500)
                        .map(|_| factory.next_id_sized_at(20, at))
                        .collect::<Vec<String>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 4000);
    }

    #[test]
    fn test_counter_modulus_widths() {
        assert_eq!(counter_modulus(1), 9);
        assert_eq!(counter_modulus(5), 99_999);
        assert_eq!(counter_modulus(19), 9_999_999_999_999_999_999);
        // Beyond 19 digits the modulus saturates instead of overflowing.
        assert_eq!(counter_modulus(20), u64::MAX);
    }

    #[test]
    fn test_field_width_derivation() {
        assert_eq!(field_width(16, PRIMARY_MIN_LEN), 1);
        assert_eq!(field_width(20, PRIMARY_MIN_LEN), 5);
        assert_eq!(field_width(8, PRIMARY_MIN_LEN), 1);
        assert_eq!(field_width(24, BUSINESS_MIN_LEN), 1);
        assert_eq!(field_width(30, BUSINESS_MIN_LEN), 7);
    }
}
