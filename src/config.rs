//! Centralized configuration for bloomer.
//!
//! Goals:
//! - Single place for the three build-time filter constants (M, K, R) plus transport tunables.
//! - BloomerConfig::from_env() reads BLOOMER_* env vars; fluent `with_*` setters override them.
//! - `params()` validates into FilterParams, which the engine consumes.
//!
//! Filter constants must match the tool that built the persisted filter. A mismatch is not
//! detectable from the data: every answer silently becomes garbage.
//!
//! Env:
//!   BLOOMER_BITS            - M, total bits in the filter (default: 1541 geometry, 1_286_256)
//!   BLOOMER_HASHES          - K, 1..=5 (default 5)
//!   BLOOMER_RECORD_SIZE     - R, bytes per record (default 254)
//!   BLOOMER_PROBE_ORDER     - desc|asc|none (default desc)
//!   BLOOMER_IO_TIMEOUT_MS   - transport timeout, 0 = block forever (default 5000)
//!   BLOOMER_MAX_RETRIES     - transport read retries after reopen (default 0)
//!   BLOOMER_REOPEN_TO_SEEK  - reopen the session before every seek (default false)
//!   BLOOMER_STATUS_MSG_MAX  - status message buffer (default 64)

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::consts::{BITS_PER_BYTE, NUM_HASH_FUNCTIONS, STATUS_MSG_MAX};
use crate::geometry::DiskGeometry;

// -------------------- FilterParams --------------------

/// Неизменяемые параметры фильтра (M, K, R).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FilterParams {
    bit_count: u64,
    hash_count: usize,
    record_size: usize,
}

impl FilterParams {
    pub fn new(bit_count: u64, hash_count: usize, record_size: usize) -> Result<Self> {
        if bit_count == 0 {
            return Err(anyhow!("bit_count must be > 0"));
        }
        if hash_count == 0 || hash_count > NUM_HASH_FUNCTIONS {
            return Err(anyhow!(
                "hash_count {} out of range 1..={}",
                hash_count,
                NUM_HASH_FUNCTIONS
            ));
        }
        if record_size == 0 {
            return Err(anyhow!("record_size must be > 0"));
        }
        Ok(Self {
            bit_count,
            hash_count,
            record_size,
        })
    }

    #[inline]
    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    #[inline]
    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    #[inline]
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Байт в битовом массиве (последний байт может быть неполным).
    pub fn byte_count(&self) -> u64 {
        self.bit_count.div_ceil(BITS_PER_BYTE)
    }

    /// Записей в хранилище (последняя может быть неполной).
    pub fn record_count(&self) -> u64 {
        self.byte_count().div_ceil(self.record_size as u64)
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        let g = DiskGeometry::default();
        Self {
            bit_count: g.size_bits(),
            hash_count: NUM_HASH_FUNCTIONS,
            record_size: g.record_size as usize,
        }
    }
}

// -------------------- ProbeOrder --------------------

/// Порядок проверки битов запроса. На результат не влияет, только на число/направление seek'ов.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeOrder {
    /// От старших битов к младшим (поведение исходного checker'а).
    #[default]
    Descending,
    Ascending,
    /// Как посчитаны хэши (без сортировки).
    AsComputed,
}

impl FromStr for ProbeOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desc" | "descending" => Ok(ProbeOrder::Descending),
            "asc" | "ascending" => Ok(ProbeOrder::Ascending),
            "none" | "computed" | "as-computed" => Ok(ProbeOrder::AsComputed),
            other => Err(anyhow!("unknown probe order '{}' (desc|asc|none)", other)),
        }
    }
}

impl fmt::Display for ProbeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProbeOrder::Descending => "desc",
            ProbeOrder::Ascending => "asc",
            ProbeOrder::AsComputed => "none",
        };
        f.write_str(s)
    }
}

// -------------------- BloomerConfig --------------------

/// Top-level configuration (filter constants + engine/transport tunables).
#[derive(Clone, Debug)]
pub struct BloomerConfig {
    /// M. Env: BLOOMER_BITS
    pub bit_count: u64,

    /// K. Env: BLOOMER_HASHES
    pub hash_count: usize,

    /// R. Env: BLOOMER_RECORD_SIZE
    pub record_size: usize,

    /// Env: BLOOMER_PROBE_ORDER = desc|asc|none
    pub probe_order: ProbeOrder,

    /// Connect/read/write timeout at the store boundary, ms; 0 disables.
    /// Env: BLOOMER_IO_TIMEOUT_MS (default 5000)
    pub io_timeout_ms: u64,

    /// Transport read retries (each after reopening the session). 0 = fail fast.
    /// Env: BLOOMER_MAX_RETRIES (default 0)
    pub max_retries: u32,

    /// Reopen the store session before every seek (backends that only position sequentially
    /// after a fresh session). Env: BLOOMER_REOPEN_TO_SEEK
    pub reopen_to_seek: bool,

    /// Status message buffer size, bytes. Env: BLOOMER_STATUS_MSG_MAX (default 64)
    pub status_msg_max: usize,
}

impl Default for BloomerConfig {
    fn default() -> Self {
        let p = FilterParams::default();
        Self {
            bit_count: p.bit_count(),
            hash_count: p.hash_count(),
            record_size: p.record_size(),
            probe_order: ProbeOrder::Descending,
            io_timeout_ms: 5000,
            max_retries: 0,
            reopen_to_seek: false,
            status_msg_max: STATUS_MSG_MAX,
        }
    }
}

fn env_flag(s: &str) -> bool {
    let s = s.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "yes" || s == "on"
}

impl BloomerConfig {
    /// Load configuration from environment variables; unknown/invalid values keep defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("BLOOMER_BITS") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.bit_count = n;
            }
        }
        if let Ok(v) = std::env::var("BLOOMER_HASHES") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.hash_count = n;
            }
        }
        if let Ok(v) = std::env::var("BLOOMER_RECORD_SIZE") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.record_size = n;
            }
        }
        if let Ok(v) = std::env::var("BLOOMER_PROBE_ORDER") {
            match v.parse::<ProbeOrder>() {
                Ok(o) => cfg.probe_order = o,
                Err(e) => log::warn!("BLOOMER_PROBE_ORDER ignored: {}", e),
            }
        }
        if let Ok(v) = std::env::var("BLOOMER_IO_TIMEOUT_MS") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.io_timeout_ms = n;
            }
        }
        if let Ok(v) = std::env::var("BLOOMER_MAX_RETRIES") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.max_retries = n;
            }
        }
        if let Ok(v) = std::env::var("BLOOMER_REOPEN_TO_SEEK") {
            cfg.reopen_to_seek = env_flag(&v);
        }
        if let Ok(v) = std::env::var("BLOOMER_STATUS_MSG_MAX") {
            if let Ok(n) = v.trim().parse::<usize>() {
                if n > 0 {
                    cfg.status_msg_max = n;
                }
            }
        }

        cfg
    }

    pub fn with_bit_count(mut self, m: u64) -> Self {
        self.bit_count = m;
        self
    }

    pub fn with_hash_count(mut self, k: usize) -> Self {
        self.hash_count = k;
        self
    }

    pub fn with_record_size(mut self, r: usize) -> Self {
        self.record_size = r;
        self
    }

    pub fn with_probe_order(mut self, order: ProbeOrder) -> Self {
        self.probe_order = order;
        self
    }

    pub fn with_io_timeout_ms(mut self, ms: u64) -> Self {
        self.io_timeout_ms = ms;
        self
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_reopen_to_seek(mut self, on: bool) -> Self {
        self.reopen_to_seek = on;
        self
    }

    pub fn with_status_msg_max(mut self, n: usize) -> Self {
        self.status_msg_max = n.max(1);
        self
    }

    /// Validated filter constants.
    pub fn params(&self) -> Result<FilterParams> {
        FilterParams::new(self.bit_count, self.hash_count, self.record_size)
    }

    /// None when timeouts are disabled (io_timeout_ms = 0).
    pub fn io_timeout(&self) -> Option<Duration> {
        if self.io_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.io_timeout_ms))
        }
    }
}

impl fmt::Display for BloomerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BloomerConfig {{ \
             bit_count: {}, \
             hash_count: {}, \
             record_size: {}, \
             probe_order: {}, \
             io_timeout_ms: {}, \
             max_retries: {}, \
             reopen_to_seek: {}, \
             status_msg_max: {} \
             }}",
            self.bit_count,
            self.hash_count,
            self.record_size,
            self.probe_order,
            if self.io_timeout_ms == 0 {
                "none".to_string()
            } else {
                self.io_timeout_ms.to_string()
            },
            self.max_retries,
            self.reopen_to_seek,
            self.status_msg_max,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DEFAULT_RECORD_SIZE;

    #[test]
    fn default_params_follow_geometry() {
        let p = FilterParams::default();
        assert_eq!(p.bit_count(), 1_286_256);
        assert_eq!(p.hash_count(), 5);
        assert_eq!(p.record_size(), DEFAULT_RECORD_SIZE);
        assert_eq!(p.byte_count(), 160_782);
        assert_eq!(p.record_count(), 633);
    }

    #[test]
    fn partial_tail_record_is_counted() {
        // 100 бит = 13 байт; по 4 байта в записи → 4 записи
        let p = FilterParams::new(100, 5, 4).unwrap();
        assert_eq!(p.byte_count(), 13);
        assert_eq!(p.record_count(), 4);
    }

    #[test]
    fn invalid_params_rejected() {
        assert!(FilterParams::new(0, 5, 254).is_err());
        assert!(FilterParams::new(64, 0, 254).is_err());
        assert!(FilterParams::new(64, 6, 254).is_err());
        assert!(FilterParams::new(64, 5, 0).is_err());
    }

    #[test]
    fn probe_order_parse() {
        assert_eq!("DESC".parse::<ProbeOrder>().unwrap(), ProbeOrder::Descending);
        assert_eq!(" asc ".parse::<ProbeOrder>().unwrap(), ProbeOrder::Ascending);
        assert_eq!("none".parse::<ProbeOrder>().unwrap(), ProbeOrder::AsComputed);
        assert!("random".parse::<ProbeOrder>().is_err());
    }

    #[test]
    fn builder_overrides() {
        let cfg = BloomerConfig::default()
            .with_bit_count(64)
            .with_hash_count(3)
            .with_record_size(4)
            .with_io_timeout_ms(0)
            .with_status_msg_max(0);
        let p = cfg.params().unwrap();
        assert_eq!((p.bit_count(), p.hash_count(), p.record_size()), (64, 3, 4));
        assert!(cfg.io_timeout().is_none());
        assert_eq!(cfg.status_msg_max, 1);
        assert!(cfg.to_string().contains("io_timeout_ms: none"));
    }
}
