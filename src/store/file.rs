//! store/file - фильтр в обычном файле с прямым доступом.
//!
//! Запись n лежит по смещению n * R. Никакого канала команд/статуса: позиционирование -
//! обычный seek. Пока хранилище открыто, на файл держится разделяемая advisory-блокировка
//! (builder, перезаписывающий фильтр, берёт эксклюзивную).
//!
//! Хвост: если длина файла не кратна R, последняя запись дочитывается нулями.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::{check_buf, RecordStore, StoreError};

#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    record_size: usize,
    file: Option<File>,
    file_len: u64,
}

impl FileRecordStore {
    /// Хранилище не открыто - открывает `open()`.
    pub fn new<P: AsRef<Path>>(path: P, record_size: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            record_size,
            file: None,
            file_len: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Число записей в открытом файле (0, если не открыт).
    pub fn records(&self) -> u64 {
        if self.record_size == 0 {
            return 0;
        }
        self.file_len.div_ceil(self.record_size as u64)
    }
}

impl RecordStore for FileRecordStore {
    fn record_size(&self) -> usize {
        self.record_size
    }

    fn open(&mut self) -> Result<(), StoreError> {
        self.close();
        if self.record_size == 0 {
            return Err(StoreError::InvalidRecordSize { want: 1, got: 0 });
        }

        let f = OpenOptions::new()
            .read(true)
            .open(&self.path)
            .map_err(|e| StoreError::transport("open filter", e))?;
        f.lock_shared()
            .map_err(|e| StoreError::transport("lock_shared filter", e))?;
        let len = f
            .metadata()
            .map_err(|e| StoreError::transport("stat filter", e))?
            .len();

        self.file = Some(f);
        self.file_len = len;
        log::info!(
            "opened filter {} ({} bytes, {} records of {} B)",
            self.path.display(),
            len,
            self.records(),
            self.record_size
        );
        Ok(())
    }

    fn close(&mut self) {
        if let Some(f) = self.file.take() {
            let _ = f.unlock();
            log::debug!("closed filter {}", self.path.display());
        }
        self.file_len = 0;
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn read_record(&mut self, record: u64, buf: &mut [u8]) -> Result<(), StoreError> {
        check_buf(self.record_size, buf)?;
        let records = self.records();
        let f = self.file.as_mut().ok_or(StoreError::NotOpen)?;
        if record >= records {
            return Err(StoreError::OutOfRange { record, records });
        }

        let rs = self.record_size as u64;
        let off = record * rs;
        let avail = (self.file_len - off).min(rs) as usize;

        f.seek(SeekFrom::Start(off))
            .map_err(|e| StoreError::transport("seek record", e))?;
        f.read_exact(&mut buf[..avail])
            .map_err(|e| StoreError::transport("read record", e))?;
        buf[avail..].fill(0);

        log::debug!("read record {} @{} ({} B)", record, off, avail);
        Ok(())
    }
}

impl Drop for FileRecordStore {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn unique_path(prefix: &str) -> PathBuf {
        let pid = std::process::id();
        let t = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("bloomer-{}-{}-{}.dat", prefix, pid, t))
    }

    #[test]
    fn reads_records_and_zero_fills_tail() {
        let path = unique_path("file-tail");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[1, 2, 3, 4, 5, 6])
            .unwrap();

        let mut s = FileRecordStore::new(&path, 4);
        assert!(!s.is_open());
        let mut buf = [0xFFu8; 4];
        assert!(matches!(s.read_record(0, &mut buf), Err(StoreError::NotOpen)));

        s.open().unwrap();
        assert_eq!(s.records(), 2);
        s.read_record(0, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        s.read_record(1, &mut buf).unwrap();
        assert_eq!(buf, [5, 6, 0, 0]);
        assert!(matches!(
            s.read_record(2, &mut buf),
            Err(StoreError::OutOfRange { record: 2, records: 2 })
        ));

        s.close();
        s.close();
        assert!(!s.is_open());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_transport_error() {
        let mut s = FileRecordStore::new(unique_path("missing"), 254);
        let e = s.open().unwrap_err();
        assert!(e.is_transport());
    }
}
