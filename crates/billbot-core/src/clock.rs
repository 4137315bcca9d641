//! Injectable time and randomness sources.
//!
//! Letter dates, default bill dates, and generated account numbers depend on
//! the wall clock and on random bits. Components take these through the
//! [`Clock`] and [`Entropy`] traits so tests can pin both.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Midnight UTC on the given date. Returns `None` for an invalid date.
    pub fn on(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Self(dt.and_utc()))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// `October 16, 2026`
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// `10/16/2026`
pub fn short_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Source of random bits.
pub trait Entropy: Send + Sync {
    fn next_u64(&self) -> u64;
}

/// Thread-local OS-seeded generator; nothing shared between callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadEntropy;

impl Entropy for ThreadEntropy {
    fn next_u64(&self) -> u64 {
        rand::rng().random()
    }
}

/// Deterministic generator for tests and reproducible CLI runs.
#[derive(Debug)]
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Entropy for SeededEntropy {
    fn next_u64(&self) -> u64 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_stable() {
        let clock = FixedClock::on(2026, 10, 16).unwrap();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
    }

    #[test]
    fn fixed_clock_rejects_invalid_date() {
        assert!(FixedClock::on(2026, 2, 30).is_none());
    }

    #[test]
    fn date_formats() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(long_date(d), "January 5, 2026");
        assert_eq!(short_date(d), "01/05/2026");
    }

    #[test]
    fn seeded_entropy_is_reproducible() {
        let a = SeededEntropy::new(42);
        let b = SeededEntropy::new(42);
        let seq_a: Vec<u64> = (0..4).map(|_| a.next_u64()).collect();
        let seq_b: Vec<u64> = (0..4).map(|_| b.next_u64()).collect();
        assert_eq!(seq_a, seq_b);

        let c = SeededEntropy::new(43);
        assert_ne!(seq_a[0], c.next_u64());
    }
}
