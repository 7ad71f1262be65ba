//! store/tcp - DriveSession поверх TCP (мост к драйву по сети).
//!
//! Два соединения:
//! - cmd_addr  - канал команд (POSITION пишем, отчёты статуса читаем);
//! - data_addr - канал данных. Сразу после connect шлём преамбулу открытия файла:
//!   [channel u8][spec bytes]['\r'], дальше мост отдаёт байты записей.
//!
//! Таймауты (connect/read/write) - граница, на которой зависший транспорт превращается
//! в ошибку запроса вместо вечной блокировки.

use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::channel::DriveSession;
use crate::consts::STATUS_TERMINATOR;

#[derive(Debug, Clone)]
pub struct TcpSession {
    cmd_addr: String,
    data_addr: String,
    timeout: Option<Duration>,
}

impl TcpSession {
    pub fn new<A: Into<String>, B: Into<String>>(cmd_addr: A, data_addr: B) -> Self {
        Self {
            cmd_addr: cmd_addr.into(),
            data_addr: data_addr.into(),
            timeout: None,
        }
    }

    /// None - блокироваться без ограничения.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cmd_addr(&self) -> &str {
        &self.cmd_addr
    }

    pub fn data_addr(&self) -> &str {
        &self.data_addr
    }

    fn connect(&self, addr: &str) -> io::Result<TcpStream> {
        let stream = match self.timeout {
            None => TcpStream::connect(addr)?,
            Some(t) => {
                let mut last_err: Option<io::Error> = None;
                let mut connected: Option<TcpStream> = None;
                for sa in addr.to_socket_addrs()? {
                    match TcpStream::connect_timeout(&sa, t) {
                        Ok(s) => {
                            connected = Some(s);
                            break;
                        }
                        Err(e) => last_err = Some(e),
                    }
                }
                match connected {
                    Some(s) => s,
                    None => {
                        return Err(last_err.unwrap_or_else(|| {
                            io::Error::new(
                                io::ErrorKind::AddrNotAvailable,
                                format!("no addresses for {}", addr),
                            )
                        }))
                    }
                }
            }
        };
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        stream.set_nodelay(true)?;
        log::debug!("connected {}", addr);
        Ok(stream)
    }
}

impl DriveSession for TcpSession {
    type Command = TcpStream;
    type Data = TcpStream;

    fn open_command(&mut self) -> io::Result<TcpStream> {
        self.connect(&self.cmd_addr)
    }

    fn open_data(&mut self, _cmd: &mut TcpStream, channel: u8, spec: &[u8]) -> io::Result<TcpStream> {
        let mut data = self.connect(&self.data_addr)?;
        let mut preamble = Vec::with_capacity(spec.len() + 2);
        preamble.push(channel);
        preamble.extend_from_slice(spec);
        preamble.push(STATUS_TERMINATOR);
        data.write_all(&preamble)?;
        data.flush()?;
        Ok(data)
    }
}
