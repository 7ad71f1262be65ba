//! Lightweight global metrics for bloomer.
//!
//! Процессные атомарные счётчики (Relaxed): запросы, пробы битов, чтения записей,
//! попадания/промахи кэша записи, ошибки хранилища и статус-канала.
//! Состояние движка (хэндл, кэш) здесь не живёт: только наблюдаемость.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- Queries -----
static QUERIES_TOTAL: AtomicU64 = AtomicU64::new(0);
static VERDICT_PRESENT: AtomicU64 = AtomicU64::new(0);
static VERDICT_ABSENT: AtomicU64 = AtomicU64::new(0);
static QUERY_FAILURES: AtomicU64 = AtomicU64::new(0);
static PROBES_TOTAL: AtomicU64 = AtomicU64::new(0);

// ----- Record cache -----
static RECORD_CACHE_HITS: AtomicU64 = AtomicU64::new(0);
static RECORD_CACHE_MISSES: AtomicU64 = AtomicU64::new(0);
static RECORDS_READ: AtomicU64 = AtomicU64::new(0);
static STORE_REOPENS: AtomicU64 = AtomicU64::new(0);

// ----- Status channel -----
static STATUS_FAILURES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub queries_total: u64,
    pub verdict_present: u64,
    pub verdict_absent: u64,
    pub query_failures: u64,
    pub probes_total: u64,

    pub record_cache_hits: u64,
    pub record_cache_misses: u64,
    pub records_read: u64,
    pub store_reopens: u64,

    pub status_failures: u64,
}

impl MetricsSnapshot {
    pub fn cache_hit_ratio(&self) -> f64 {
        let total = self.record_cache_hits + self.record_cache_misses;
        if total == 0 {
            0.0
        } else {
            self.record_cache_hits as f64 / total as f64
        }
    }

    /// Среднее число проверенных битов на запрос (early-exit делает его < K).
    pub fn avg_probes_per_query(&self) -> f64 {
        if self.queries_total == 0 {
            0.0
        } else {
            self.probes_total as f64 / self.queries_total as f64
        }
    }
}

// ----- Recorders (Queries) -----
pub fn record_query(present: bool) {
    QUERIES_TOTAL.fetch_add(1, Ordering::Relaxed);
    if present {
        VERDICT_PRESENT.fetch_add(1, Ordering::Relaxed);
    } else {
        VERDICT_ABSENT.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_query_failure() {
    QUERIES_TOTAL.fetch_add(1, Ordering::Relaxed);
    QUERY_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_probe() {
    PROBES_TOTAL.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Record cache) -----
pub fn record_cache_hit() {
    RECORD_CACHE_HITS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_cache_miss() {
    RECORD_CACHE_MISSES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_record_read() {
    RECORDS_READ.fetch_add(1, Ordering::Relaxed);
}

pub fn record_store_reopen() {
    STORE_REOPENS.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Status) -----
pub fn record_status_failure() {
    STATUS_FAILURES.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        queries_total: QUERIES_TOTAL.load(Ordering::Relaxed),
        verdict_present: VERDICT_PRESENT.load(Ordering::Relaxed),
        verdict_absent: VERDICT_ABSENT.load(Ordering::Relaxed),
        query_failures: QUERY_FAILURES.load(Ordering::Relaxed),
        probes_total: PROBES_TOTAL.load(Ordering::Relaxed),

        record_cache_hits: RECORD_CACHE_HITS.load(Ordering::Relaxed),
        record_cache_misses: RECORD_CACHE_MISSES.load(Ordering::Relaxed),
        records_read: RECORDS_READ.load(Ordering::Relaxed),
        store_reopens: STORE_REOPENS.load(Ordering::Relaxed),

        status_failures: STATUS_FAILURES.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_on_empty_snapshot() {
        let s = MetricsSnapshot::default();
        assert_eq!(s.cache_hit_ratio(), 0.0);
        assert_eq!(s.avg_probes_per_query(), 0.0);
    }

    #[test]
    fn ratios_computed() {
        let s = MetricsSnapshot {
            queries_total: 4,
            probes_total: 10,
            record_cache_hits: 3,
            record_cache_misses: 1,
            ..Default::default()
        };
        assert_eq!(s.cache_hit_ratio(), 0.75);
        assert_eq!(s.avg_probes_per_query(), 2.5);
    }

    #[test]
    fn counters_grow() {
        // Счётчики глобальные и тесты идут параллельно - проверяем только рост.
        let before = snapshot();
        record_probe();
        record_query(true);
        record_status_failure();
        let after = snapshot();
        assert!(after.probes_total > before.probes_total);
        assert!(after.verdict_present > before.verdict_present);
        assert!(after.status_failures > before.status_failures);
    }
}
