//! status - разбор отчётов драйва из канала команд.
//!
//! Формат отчёта: "NN,MESSAGE,TT,SS\r", где NN - двузначный десятичный код
//! (00 = OK), TT/SS - дорожка/сектор. Конец отчёта - '\r' или конец потока.
//!
//! Чтение всегда ограничено: сообщение не длиннее msg_cap-1 байт, хвост переполненного
//! сообщения дочитывается не более чем на STATUS_DRAIN_MAX байт (чтобы следующий отчёт
//! начинался с кода, а не с обрывка текста).
//!
//! Статус - диагностический канал: он не участвует в битовой логике запроса, но
//! ненулевой код (не из allow-list вызывающего) превращает операцию в ошибку.

use serde::Serialize;
use std::fmt;
use std::io::{self, Read};

use crate::consts::{STATUS_COMM_ERROR, STATUS_DRAIN_MAX, STATUS_TERMINATOR};
use crate::metrics::record_status_failure;
use crate::store::StoreError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DriveStatus {
    pub code: u8,
    /// Всё после первой запятой: "MESSAGE,TT,SS".
    pub message: String,
}

impl DriveStatus {
    /// Локальная ошибка связи (до драйва не достучались).
    pub fn comm_error(detail: &str) -> Self {
        Self {
            code: STATUS_COMM_ERROR,
            message: detail.to_string(),
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    /// 0 всегда успех; остальные коды - только если есть в allow-list вызова.
    pub fn is_acceptable(&self, ok_codes: &[u8]) -> bool {
        self.is_ok() || ok_codes.contains(&self.code)
    }

    /// Текст сообщения без дорожки/сектора.
    pub fn text(&self) -> &str {
        self.message.split(',').next().unwrap_or("").trim()
    }

    pub fn track_sector(&self) -> Option<(u8, u8)> {
        let mut it = self.message.split(',').skip(1);
        let t = it.next()?.trim().parse::<u8>().ok()?;
        let s = it.next()?.trim().parse::<u8>().ok()?;
        Some((t, s))
    }
}

impl fmt::Display for DriveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02},{}", self.code, self.message)
    }
}

// EOF → None. Interrupted повторяем.
fn read_byte<R: Read>(r: &mut R) -> io::Result<Option<u8>> {
    let mut b = [0u8; 1];
    loop {
        match r.read(&mut b) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(b[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[inline]
fn digit(c: u8) -> u8 {
    if c.is_ascii_digit() {
        c - b'0'
    } else {
        0
    }
}

/// Прочитать один отчёт. `msg_cap` - размер буфера сообщения (как у C-строки: с терминатором),
/// 0 - сообщение не сохраняется (но хвост отчёта всё равно дочитывается).
pub fn read_status<R: Read>(r: &mut R, msg_cap: usize) -> io::Result<DriveStatus> {
    let c1 = read_byte(r)?.ok_or_else(|| {
        io::Error::new(io::ErrorKind::UnexpectedEof, "status channel closed")
    })?;
    if c1 == STATUS_TERMINATOR {
        // отчёт без кода - это сбой протокола, а не "00"
        return Err(io::Error::new(io::ErrorKind::InvalidData, "empty status report"));
    }
    let mut code = digit(c1) * 10;

    let mut msg: Vec<u8> = Vec::new();
    let mut terminated = false;

    match read_byte(r)? {
        None => terminated = true,
        Some(STATUS_TERMINATOR) => terminated = true,
        Some(c2) => code += digit(c2),
    }

    if !terminated {
        // Разделитель после кода
        match read_byte(r)? {
            None | Some(STATUS_TERMINATOR) => terminated = true,
            Some(b',') => {}
            Some(c) if msg_cap > 1 => msg.push(c),
            Some(_) => {}
        }
    }

    if !terminated {
        while msg.len() + 1 < msg_cap {
            match read_byte(r)? {
                None | Some(STATUS_TERMINATOR) => {
                    terminated = true;
                    break;
                }
                Some(c) => msg.push(c),
            }
        }
    }

    if !terminated {
        let mut drained = 0usize;
        while drained < STATUS_DRAIN_MAX {
            match read_byte(r)? {
                None | Some(STATUS_TERMINATOR) => break,
                Some(_) => drained += 1,
            }
        }
    }

    Ok(DriveStatus {
        code,
        message: String::from_utf8_lossy(&msg).into_owned(),
    })
}

/// Прочитать отчёт после операции `op` и проверить код.
///
/// Ok(status) - код 0 или из `ok_codes`; иначе StoreError::Status. Ошибка чтения самого
/// канала - StoreError::Transport.
pub fn check_status<R: Read>(
    r: &mut R,
    op: &'static str,
    ok_codes: &[u8],
    msg_cap: usize,
) -> Result<DriveStatus, StoreError> {
    let st = read_status(r, msg_cap).map_err(|source| StoreError::Transport { op, source })?;
    log::debug!("{}: DOS {}", op, st);

    if st.is_acceptable(ok_codes) {
        return Ok(st);
    }
    record_status_failure();
    log::warn!("{} failed: DOS {}", op, st);
    Err(StoreError::Status {
        op,
        code: st.code,
        message: st.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_ok_report() {
        let mut c = Cursor::new(b"00, OK,00,00\r".to_vec());
        let st = read_status(&mut c, 64).unwrap();
        assert_eq!(st.code, 0);
        assert_eq!(st.message, " OK,00,00");
        assert_eq!(st.text(), "OK");
        assert_eq!(st.track_sector(), Some((0, 0)));
        assert!(st.is_ok());
    }

    #[test]
    fn stops_at_terminator_leaving_next_report() {
        let mut c = Cursor::new(b"62,FILE NOT FOUND,00,00\r00, OK,00,00\r".to_vec());
        let a = read_status(&mut c, 64).unwrap();
        assert_eq!(a.code, 62);
        assert_eq!(a.text(), "FILE NOT FOUND");
        let b = read_status(&mut c, 64).unwrap();
        assert_eq!(b.code, 0);
    }

    #[test]
    fn end_of_stream_terminates_message() {
        let mut c = Cursor::new(b"73,CBM DOS V2.6 1541,00,00".to_vec());
        let st = read_status(&mut c, 64).unwrap();
        assert_eq!(st.code, 73);
        assert_eq!(st.message, "CBM DOS V2.6 1541,00,00");
    }

    #[test]
    fn long_message_is_bounded_and_drained() {
        let mut raw = b"21,".to_vec();
        raw.extend(std::iter::repeat(b'X').take(100));
        raw.extend_from_slice(b"\r00, OK,00,00\r");
        let mut c = Cursor::new(raw);
        let st = read_status(&mut c, 8).unwrap();
        assert_eq!(st.code, 21);
        assert_eq!(st.message, "XXXXXXX");
        // хвост дочитан - следующий отчёт цел
        assert_eq!(read_status(&mut c, 8).unwrap().code, 0);
    }

    #[test]
    fn zero_cap_skips_message() {
        let mut c = Cursor::new(b"50,RECORD NOT PRESENT,00,00\r".to_vec());
        let st = read_status(&mut c, 0).unwrap();
        assert_eq!(st.code, 50);
        assert!(st.message.is_empty());
        assert_eq!(c.position(), 28);
    }

    #[test]
    fn closed_channel_is_error() {
        let mut c = Cursor::new(Vec::<u8>::new());
        let e = read_status(&mut c, 64).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn empty_report_is_protocol_error() {
        let mut c = Cursor::new(b"\r00, OK,00,00\r".to_vec());
        let e = read_status(&mut c, 64).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::InvalidData);

        // после POSITION пустой отчёт не должен пропускать чтение данных
        let e = check_status(&mut Cursor::new(b"\r".to_vec()), "position", &[], 64).unwrap_err();
        assert!(e.is_transport());
        assert!(!e.is_status());
    }

    #[test]
    fn non_digit_code_chars_count_as_zero() {
        let mut c = Cursor::new(b"?5,ODD\r".to_vec());
        assert_eq!(read_status(&mut c, 64).unwrap().code, 5);
    }

    #[test]
    fn allow_list_is_per_call() {
        let report = b"62,FILE NOT FOUND,00,00\r".to_vec();
        let st = check_status(&mut Cursor::new(report.clone()), "open", &[62], 64).unwrap();
        assert_eq!(st.code, 62);

        let err = check_status(&mut Cursor::new(report), "open", &[], 64).unwrap_err();
        assert!(err.is_status());
        match err {
            StoreError::Status { op, code, .. } => {
                assert_eq!(op, "open");
                assert_eq!(code, 62);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn display_pads_code() {
        let st = DriveStatus { code: 7, message: "X,01,02".into() };
        assert_eq!(st.to_string(), "07,X,01,02");
        assert_eq!(DriveStatus::comm_error("CHKIN 15 FAIL").code, STATUS_COMM_ERROR);
    }
}
