//! store - контракт хранилища записей фиксированного размера.
//!
//! Адресация - номер записи (0-based на этом уровне), не байтовое смещение: вся байтовая/
//! битовая арифметика живёт уровнем выше (addressing/engine). Запись читается только
//! целиком, даже если нужен один байт.
//!
//! Реализации:
//! - file.rs    - локальный файл, прямое чтение по смещению record * R
//! - mem.rs     - записи в памяти (счётчик чтений, инъекция ошибок)
//! - channel.rs - протокол "канал команд + канал данных" (1-based записи, статус-канал)
//! - tcp.rs     - DriveSession поверх двух TCP-соединений с таймаутами

use std::io;
use thiserror::Error;

use crate::status::DriveStatus;

pub mod channel;
pub mod file;
pub mod mem;
pub mod tcp;

/// Ошибки хранилища. Никогда не означают "слова нет": запрос с такой ошибкой - неопределён.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store is not open")]
    NotOpen,

    /// Сбой открытия/позиционирования/чтения на границе транспорта.
    #[error("{op}: transport error: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Ненулевой код статуса, не входящий в allow-list вызова.
    #[error("{op} failed: DOS {code:02},{message}")]
    Status {
        op: &'static str,
        code: u8,
        message: String,
    },

    #[error("record {record} out of range (store has {records} records)")]
    OutOfRange { record: u64, records: u64 },

    #[error("record size mismatch: filter expects {expected} bytes, store has {actual}")]
    RecordSizeMismatch { expected: usize, actual: usize },

    #[error("buffer of {got} bytes does not match record size {want}")]
    InvalidRecordSize { want: usize, got: usize },
}

impl StoreError {
    pub(crate) fn transport(op: &'static str, source: io::Error) -> Self {
        StoreError::Transport { op, source }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, StoreError::Transport { .. })
    }

    pub fn is_status(&self) -> bool {
        matches!(self, StoreError::Status { .. })
    }

    /// Код статуса драйва, если ошибка пришла из статус-канала.
    pub fn status_code(&self) -> Option<u8> {
        match self {
            StoreError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Хранилище записей фиксированного размера R с позиционным доступом.
///
/// Само значение хранилища - это и есть "хэндл": open/close меняют его состояние.
pub trait RecordStore {
    /// Размер записи R в байтах.
    fn record_size(&self) -> usize;

    /// Открыть доступ. Повторный open после close сбрасывает позиционирование.
    fn open(&mut self) -> Result<(), StoreError>;

    /// Освободить доступ. Безопасно вызывать на закрытом хранилище.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Прочитать 0-based запись целиком в `buf` (len == record_size).
    fn read_record(&mut self, record: u64, buf: &mut [u8]) -> Result<(), StoreError>;

    /// true - бэкенд умеет позиционироваться только после свежей сессии.
    fn requires_reopen_to_seek(&self) -> bool {
        false
    }

    /// Последний отчёт статус-канала (если у бэкенда он есть).
    fn last_status(&self) -> Option<&DriveStatus> {
        None
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn record_size(&self) -> usize {
        (**self).record_size()
    }

    fn open(&mut self) -> Result<(), StoreError> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn read_record(&mut self, record: u64, buf: &mut [u8]) -> Result<(), StoreError> {
        (**self).read_record(record, buf)
    }

    fn requires_reopen_to_seek(&self) -> bool {
        (**self).requires_reopen_to_seek()
    }

    fn last_status(&self) -> Option<&DriveStatus> {
        (**self).last_status()
    }
}

/// Общая проверка буфера для реализаций.
#[inline]
pub(crate) fn check_buf(record_size: usize, buf: &[u8]) -> Result<(), StoreError> {
    if buf.len() != record_size {
        return Err(StoreError::InvalidRecordSize {
            want: record_size,
            got: buf.len(),
        });
    }
    Ok(())
}
