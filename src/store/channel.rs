//! store/channel - хранилище записей поверх протокола "канал команд + канал данных".
//!
//! Сессия с драйвом - два байтовых потока:
//! - канал команд: пишем команды позиционирования, читаем отчёты статуса ("NN,MSG,TT,SS\r");
//! - канал данных: открыт на REL-файл фильтра ("BLOOM.DAT,L,<R>"), после POSITION отдаёт
//!   ровно R байт записи.
//!
//! POSITION (5 байт):
//!   [b'P'][channel u8][record u16 LE][start byte u8 = 1]
//! Номера записей у драйва 1-based: адаптер прибавляет 1 к 0-based номеру движка,
//! записи, не влезающие в u16, отвергаются до обращения к драйву.
//!
//! Каждый отчёт статуса проверяется: успех на транспортном уровне ещё не значит, что
//! драйв считает операцию выполненной.
//!
//! Hardening:
//! - таймауты - на уровне DriveSession (см. tcp.rs);
//! - max_retries > 0: транспортный сбой чтения → переоткрыть сессию и повторить
//!   (ошибки статуса не повторяются);
//! - сбой транспорта без оставшихся ретраев закрывает сессию: в потоках могут остаться
//!   хвосты недочитанной записи. Следующий read_record сначала переоткрывает сессию.

use byteorder::{ByteOrder, LittleEndian};
use std::io::{self, Read, Write};

use super::{check_buf, RecordStore, StoreError};
use crate::config::BloomerConfig;
use crate::consts::{
    CMD_POSITION, DEFAULT_DATA_CHANNEL, DEFAULT_FILTER_NAME, POSITION_CMD_LEN,
    POSITION_START_BYTE, STATUS_DOS_VERSION, STATUS_MSG_MAX,
};
use crate::status::{check_status, DriveStatus};

/// Транспорт сессии с драйвом.
pub trait DriveSession {
    type Command: Read + Write;
    type Data: Read;

    /// Открыть канал команд. Первый отчёт статуса в нём читает вызывающий.
    fn open_command(&mut self) -> io::Result<Self::Command>;

    /// Открыть канал данных `channel` на файл `spec` (например "BLOOM.DAT,L,\xFE").
    /// Результат открытия драйв сообщает отчётом в канале команд.
    fn open_data(
        &mut self,
        cmd: &mut Self::Command,
        channel: u8,
        spec: &[u8],
    ) -> io::Result<Self::Data>;
}

/// Байты команды POSITION для 1-based записи.
pub fn encode_position(channel: u8, drive_record: u16) -> [u8; POSITION_CMD_LEN] {
    let mut cmd = [0u8; POSITION_CMD_LEN];
    cmd[0] = CMD_POSITION;
    cmd[1] = channel;
    LittleEndian::write_u16(&mut cmd[2..4], drive_record);
    cmd[4] = POSITION_START_BYTE;
    cmd
}

/// Спецификация открытия REL-файла: "<name>,L,<R как байт>".
pub fn rel_open_spec(name: &str, record_size: u8) -> Vec<u8> {
    let mut spec = Vec::with_capacity(name.len() + 4);
    spec.extend_from_slice(name.as_bytes());
    spec.extend_from_slice(b",L,");
    spec.push(record_size);
    spec
}

pub struct ChannelStore<S: DriveSession> {
    session: S,
    file_name: String,
    channel: u8,
    record_size: usize,
    msg_cap: usize,
    max_retries: u32,
    reopen_to_seek: bool,

    cmd: Option<S::Command>,
    data: Option<S::Data>,
    last_status: Option<DriveStatus>,
    // сессия закрыта из-за сбоя транспорта (а не вызывающим)
    needs_reopen: bool,
}

impl<S: DriveSession> ChannelStore<S> {
    pub fn new(session: S, record_size: usize) -> Self {
        Self {
            session,
            file_name: DEFAULT_FILTER_NAME.to_string(),
            channel: DEFAULT_DATA_CHANNEL,
            record_size,
            msg_cap: STATUS_MSG_MAX,
            max_retries: 0,
            reopen_to_seek: false,
            cmd: None,
            data: None,
            last_status: None,
            needs_reopen: false,
        }
    }

    /// Параметры транспорта из конфигурации (R, ретраи, reopen, буфер статуса).
    pub fn with_config(session: S, cfg: &BloomerConfig) -> Self {
        Self::new(session, cfg.record_size)
            .with_max_retries(cfg.max_retries)
            .with_reopen_to_seek(cfg.reopen_to_seek)
            .with_status_msg_max(cfg.status_msg_max)
    }

    pub fn with_file_name<N: Into<String>>(mut self, name: N) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
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
        self.msg_cap = n;
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    // Прочитать отчёт из канала команд и запомнить его как last_status (в т.ч. неуспешный).
    fn read_report(&mut self, op: &'static str, ok_codes: &[u8]) -> Result<DriveStatus, StoreError> {
        let cmd = self.cmd.as_mut().ok_or(StoreError::NotOpen)?;
        let res = check_status(cmd, op, ok_codes, self.msg_cap);
        self.last_status = Some(match &res {
            Ok(st) => st.clone(),
            Err(StoreError::Status { code, message, .. }) => DriveStatus {
                code: *code,
                message: message.clone(),
            },
            Err(e) => DriveStatus::comm_error(&e.to_string()),
        });
        res
    }

    fn open_inner(&mut self) -> Result<(), StoreError> {
        let rs = u8::try_from(self.record_size)
            .ok()
            .filter(|r| *r > 0)
            .ok_or(StoreError::InvalidRecordSize {
                want: u8::MAX as usize,
                got: self.record_size,
            })?;

        let cmd = self
            .session
            .open_command()
            .map_err(|e| StoreError::transport("open cmd", e))?;
        self.cmd = Some(cmd);

        // Первый отчёт после открытия - диагностика (часто 73 с версией DOS); не фатален.
        match self.read_report("open cmd", &[STATUS_DOS_VERSION]) {
            Ok(_) | Err(StoreError::Status { .. }) => {}
            Err(e) => return Err(e),
        }

        let spec = rel_open_spec(&self.file_name, rs);
        let cmd = self.cmd.as_mut().ok_or(StoreError::NotOpen)?;
        let data = self
            .session
            .open_data(cmd, self.channel, &spec)
            .map_err(|e| StoreError::transport("open data", e))?;
        self.data = Some(data);

        self.read_report("open data", &[])?;
        Ok(())
    }

    fn read_once(&mut self, drive_record: u16, buf: &mut [u8]) -> Result<(), StoreError> {
        let pos = encode_position(self.channel, drive_record);
        {
            let cmd = self.cmd.as_mut().ok_or(StoreError::NotOpen)?;
            cmd.write_all(&pos)
                .and_then(|_| cmd.flush())
                .map_err(|e| StoreError::transport("position", e))?;
        }
        self.read_report("position", &[])?;

        let data = self.data.as_mut().ok_or(StoreError::NotOpen)?;
        data.read_exact(buf)
            .map_err(|e| StoreError::transport("read record", e))?;
        Ok(())
    }
}

impl<S: DriveSession> RecordStore for ChannelStore<S> {
    fn record_size(&self) -> usize {
        self.record_size
    }

    fn open(&mut self) -> Result<(), StoreError> {
        self.close();
        match self.open_inner() {
            Ok(()) => {
                self.needs_reopen = false;
                log::info!(
                    "drive session open: {} on channel {} ({} B records)",
                    self.file_name,
                    self.channel,
                    self.record_size
                );
                Ok(())
            }
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        self.needs_reopen = false;
        // Сначала файл, потом канал команд.
        let had = self.data.take().is_some() | self.cmd.take().is_some();
        if had {
            log::debug!("drive session closed");
        }
    }

    fn is_open(&self) -> bool {
        self.cmd.is_some() && self.data.is_some()
    }

    fn read_record(&mut self, record: u64, buf: &mut [u8]) -> Result<(), StoreError> {
        check_buf(self.record_size, buf)?;
        let drive_record = record
            .checked_add(1)
            .and_then(|r| u16::try_from(r).ok())
            .ok_or(StoreError::OutOfRange {
                record,
                records: u16::MAX as u64,
            })?;
        if !self.is_open() {
            if !self.needs_reopen {
                return Err(StoreError::NotOpen);
            }
            log::info!("reopening drive session after transport failure");
            self.open()?;
        }

        let mut attempt = 0u32;
        loop {
            match self.read_once(drive_record, buf) {
                Ok(()) => {
                    log::debug!("read record {} (drive #{})", record, drive_record);
                    return Ok(());
                }
                Err(e) if e.is_transport() && attempt < self.max_retries => {
                    attempt += 1;
                    log::warn!(
                        "record {}: {}, reopening session (retry {}/{})",
                        record,
                        e,
                        attempt,
                        self.max_retries
                    );
                    self.open()?;
                }
                Err(e) if e.is_transport() => {
                    // позиция потоков неизвестна: дальше читать из этой сессии нельзя
                    log::warn!("record {}: {}, closing session", record, e);
                    self.close();
                    self.needs_reopen = true;
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn requires_reopen_to_seek(&self) -> bool {
        self.reopen_to_seek
    }

    fn last_status(&self) -> Option<&DriveStatus> {
        self.last_status.as_ref()
    }
}
