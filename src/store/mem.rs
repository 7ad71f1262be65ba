//! store/mem - записи в памяти.
//!
//! Нужен там, где фильтр уже загружен (или собран на лету в тестах), и как наблюдаемый
//! mock: считает open/read и умеет имитировать сбой чтения конкретной записи.

use std::collections::HashSet;
use std::io;

use super::{check_buf, RecordStore, StoreError};

#[derive(Debug, Clone)]
pub struct MemRecordStore {
    data: Vec<u8>,
    record_size: usize,
    open: bool,
    reopen_to_seek: bool,
    failing: HashSet<u64>,
    reads: u64,
    opens: u64,
    history: Vec<u64>,
}

impl MemRecordStore {
    /// `data` - битовый массив целиком; хвост последней записи дополняется нулями.
    pub fn new(mut data: Vec<u8>, record_size: usize) -> Self {
        if record_size > 0 {
            let tail = data.len() % record_size;
            if tail != 0 {
                data.resize(data.len() + record_size - tail, 0);
            }
        }
        Self {
            data,
            record_size,
            open: false,
            reopen_to_seek: false,
            failing: HashSet::new(),
            reads: 0,
            opens: 0,
            history: Vec::new(),
        }
    }

    /// Имитировать бэкенд, которому нужна свежая сессия перед каждым seek.
    pub fn with_reopen_to_seek(mut self, on: bool) -> Self {
        self.reopen_to_seek = on;
        self
    }

    /// Чтение записи `record` будет падать с транспортной ошибкой (пока не вызван heal).
    pub fn fail_record(&mut self, record: u64) {
        self.failing.insert(record);
    }

    pub fn heal(&mut self) {
        self.failing.clear();
    }

    pub fn records(&self) -> u64 {
        if self.record_size == 0 {
            return 0;
        }
        (self.data.len() / self.record_size) as u64
    }

    /// Успешных и неуспешных обращений к read_record.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn opens(&self) -> u64 {
        self.opens
    }

    /// Номера записей в порядке чтения.
    pub fn history(&self) -> &[u64] {
        &self.history
    }

    pub fn reset_counters(&mut self) {
        self.reads = 0;
        self.opens = 0;
        self.history.clear();
    }
}

impl RecordStore for MemRecordStore {
    fn record_size(&self) -> usize {
        self.record_size
    }

    fn open(&mut self) -> Result<(), StoreError> {
        if self.record_size == 0 {
            return Err(StoreError::InvalidRecordSize { want: 1, got: 0 });
        }
        self.open = true;
        self.opens += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read_record(&mut self, record: u64, buf: &mut [u8]) -> Result<(), StoreError> {
        check_buf(self.record_size, buf)?;
        if !self.open {
            return Err(StoreError::NotOpen);
        }
        self.reads += 1;
        self.history.push(record);

        if self.failing.contains(&record) {
            return Err(StoreError::transport(
                "read record",
                io::Error::new(io::ErrorKind::Other, format!("injected failure on record {record}")),
            ));
        }
        let records = self.records();
        if record >= records {
            return Err(StoreError::OutOfRange { record, records });
        }
        let start = record as usize * self.record_size;
        buf.copy_from_slice(&self.data[start..start + self.record_size]);
        Ok(())
    }

    fn requires_reopen_to_seek(&self) -> bool {
        self.reopen_to_seek
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_tail_and_counts_reads() {
        let mut s = MemRecordStore::new(vec![1, 2, 3, 4, 5], 4);
        assert_eq!(s.records(), 2);
        s.open().unwrap();
        let mut buf = [0u8; 4];
        s.read_record(1, &mut buf).unwrap();
        assert_eq!(buf, [5, 0, 0, 0]);
        s.fail_record(0);
        assert!(s.read_record(0, &mut buf).unwrap_err().is_transport());
        assert_eq!(s.reads(), 2);
        assert_eq!(s.history(), &[1, 0]);
    }

    #[test]
    fn wrong_buffer_rejected() {
        let mut s = MemRecordStore::new(vec![0; 8], 4);
        s.open().unwrap();
        let mut buf = [0u8; 3];
        assert!(matches!(
            s.read_record(0, &mut buf),
            Err(StoreError::InvalidRecordSize { want: 4, got: 3 })
        ));
    }
}
