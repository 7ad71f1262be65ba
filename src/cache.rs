//! Single-record cache over a RecordStore.
//!
//! Design:
//! - Holds at most one record: `record` (Some(n) when valid) + `bytes`.
//! - ensure_record(n) is a no-op when n is resident; otherwise the record is read in full into a
//!   scratch buffer and swapped in only on success, so a failed read never leaves a partially
//!   updated record behind. Failure invalidates the cache.
//! - Backends that can only seek after a fresh session get close()+open() before the read.
//!
//! Locality comes from probe ordering in the engine, not from cache size.

use serde::Serialize;

use crate::metrics::{record_cache_hit, record_cache_miss, record_record_read, record_store_reopen};
use crate::store::{RecordStore, StoreError};

/// Per-cache counters (the global ones live in `metrics`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub reads: u64,
    pub reopens: u64,
}

pub struct RecordCache {
    record: Option<u64>,
    bytes: Box<[u8]>,
    scratch: Box<[u8]>,
    stats: CacheStats,
}

impl RecordCache {
    pub fn new(record_size: usize) -> Self {
        Self {
            record: None,
            bytes: vec![0u8; record_size].into_boxed_slice(),
            scratch: vec![0u8; record_size].into_boxed_slice(),
            stats: CacheStats::default(),
        }
    }

    /// Resident record number, if valid.
    #[inline]
    pub fn current(&self) -> Option<u64> {
        self.record
    }

    /// Bytes of the resident record.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.record.map(|_| &self.bytes[..])
    }

    pub fn invalidate(&mut self) {
        self.record = None;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Make record `n` resident and return its bytes.
    pub fn ensure_record<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        n: u64,
    ) -> Result<&[u8], StoreError> {
        if self.record == Some(n) {
            self.stats.hits += 1;
            record_cache_hit();
            return Ok(&self.bytes);
        }
        self.stats.misses += 1;
        record_cache_miss();

        if store.requires_reopen_to_seek() {
            store.close();
            self.record = None;
            store.open()?;
            self.stats.reopens += 1;
            record_store_reopen();
        }

        self.stats.reads += 1;
        record_record_read();
        match store.read_record(n, &mut self.scratch) {
            Ok(()) => {
                std::mem::swap(&mut self.bytes, &mut self.scratch);
                self.record = Some(n);
                Ok(&self.bytes)
            }
            Err(e) => {
                self.record = None;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem::MemRecordStore;

    fn store() -> MemRecordStore {
        let mut s = MemRecordStore::new((0u8..12).collect(), 4);
        s.open().unwrap();
        s
    }

    #[test]
    fn repeated_record_is_read_once() {
        let mut s = store();
        let mut c = RecordCache::new(4);
        assert_eq!(c.ensure_record(&mut s, 1).unwrap(), &[4, 5, 6, 7]);
        assert_eq!(c.ensure_record(&mut s, 1).unwrap(), &[4, 5, 6, 7]);
        assert_eq!(s.reads(), 1);
        assert_eq!(c.stats(), CacheStats { hits: 1, misses: 1, reads: 1, reopens: 0 });
    }

    #[test]
    fn failure_invalidates_and_keeps_no_partial_data() {
        let mut s = store();
        let mut c = RecordCache::new(4);
        c.ensure_record(&mut s, 0).unwrap();
        s.fail_record(2);
        assert!(c.ensure_record(&mut s, 2).is_err());
        assert_eq!(c.current(), None);
        assert!(c.bytes().is_none());

        // После сбоя запись 0 читается заново, а не берётся из "кэша"
        s.heal();
        assert_eq!(c.ensure_record(&mut s, 0).unwrap(), &[0, 1, 2, 3]);
        assert_eq!(s.reads(), 3);
    }

    #[test]
    fn reopen_before_seek_when_backend_requires() {
        let mut s = MemRecordStore::new(vec![0; 8], 4).with_reopen_to_seek(true);
        s.open().unwrap();
        let mut c = RecordCache::new(4);
        c.ensure_record(&mut s, 0).unwrap();
        c.ensure_record(&mut s, 1).unwrap();
        c.ensure_record(&mut s, 1).unwrap();
        assert_eq!(s.opens(), 3);
        assert_eq!(c.stats().reopens, 2);
    }
}
