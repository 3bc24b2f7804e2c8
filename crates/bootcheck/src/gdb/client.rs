//! GDB remote client for the emulator's debug stub.

use std::fmt::Write as _;
use std::io::{self, BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::OnceLock;
use std::time::Duration;

use bootcheck_regs::Register;
use regex::Regex;
use tracing::{debug, trace};

use super::packet::{encode, read_packet};
use crate::session::{DebugSession, SessionConfig, SessionError};

/// Breakpoint kind sent with `Z1`/`z1`; SM83 instructions start on any byte.
const BREAKPOINT_KIND: u8 = 1;

/// Hex digits per register in a `g` reply.
const REG_HEX_DIGITS: usize = 4;

/// `g` packet order of the SM83 stub: af, bc, de, hl, sp, pc.
const SM83_LAYOUT: &[Register] = &Register::ALL;

static STOP_REPLY: OnceLock<Regex> = OnceLock::new();

/// Why the target stopped, from a stop reply packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReply {
    /// `S`/`T`: stopped with a signal (SIGTRAP for breakpoints).
    Signal(u8),
    /// `W`: process exited.
    Exited(u8),
    /// `X`: process terminated.
    Terminated(u8),
}

impl StopReply {
    /// Parse a stop reply body such as `S05` or `T05thread:01;`.
    pub fn parse(reply: &str) -> Option<Self> {
        let pattern = STOP_REPLY.get_or_init(|| {
            Regex::new(r"^([STWX])([0-9a-fA-F]{2})").expect("stop reply pattern is valid")
        });
        let caps = pattern.captures(reply)?;
        let code = u8::from_str_radix(caps.get(2)?.as_str(), 16).ok()?;
        match caps.get(1)?.as_str() {
            "S" | "T" => Some(Self::Signal(code)),
            "W" => Some(Self::Exited(code)),
            "X" => Some(Self::Terminated(code)),
            _ => None,
        }
    }
}

/// Register order of the `g` packet for a given architecture.
fn register_layout(architecture: &str) -> Option<&'static [Register]> {
    match architecture {
        "gbz80" | "sm83" => Some(SM83_LAYOUT),
        _ => None,
    }
}

/// Decode a `g` reply into register values.
///
/// Each register is little-endian (`b001` is `0x01b0`). Trailing data
/// beyond the known registers (unavailable registers are sent as `xxxx`)
/// is ignored.
pub fn decode_registers(
    reply: &str,
    layout: &[Register],
) -> Result<Vec<(Register, u16)>, SessionError> {
    let needed = layout.len() * REG_HEX_DIGITS;
    let Some(data) = reply.get(..needed).filter(|data| data.is_ascii()) else {
        return Err(SessionError::Protocol(format!(
            "register reply too short or not hex: {} of {needed} digits",
            reply.len()
        )));
    };

    layout
        .iter()
        .enumerate()
        .map(|(i, &reg)| {
            let chunk = &data[i * REG_HEX_DIGITS..(i + 1) * REG_HEX_DIGITS];
            let bytes = u16::from_str_radix(chunk, 16).map_err(|_| {
                SessionError::Protocol(format!("register {reg} has invalid value '{chunk}'"))
            })?;
            Ok((reg, bytes.swap_bytes()))
        })
        .collect()
}

/// Render registers the way `info all-registers` prints them.
pub fn format_registers(values: &[(Register, u16)]) -> String {
    let mut out = String::new();
    for (reg, value) in values {
        let hex = format!("{value:#x}");
        let _ = writeln!(out, "{:<15}{hex:<19}{value}", reg.name());
    }
    out
}

struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Connection {
    fn open(endpoint: &str) -> Result<Self, SessionError> {
        let connect_err = |source| SessionError::Connect {
            endpoint: endpoint.to_string(),
            source,
        };
        let stream = TcpStream::connect(endpoint).map_err(connect_err)?;
        stream.set_nodelay(true).map_err(connect_err)?;
        let writer = stream.try_clone().map_err(connect_err)?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
        })
    }

    fn send(&mut self, data: &str) -> Result<(), SessionError> {
        trace!(packet = data, "->");
        self.writer.write_all(encode(data).as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn recv(&mut self) -> Result<String, SessionError> {
        let reply = read_packet(&mut self.reader)?;
        self.writer.write_all(b"+")?;
        trace!(packet = %reply, "<-");
        Ok(reply)
    }

    fn request(&mut self, data: &str) -> Result<String, SessionError> {
        self.send(data)?;
        self.recv()
    }

    fn expect_ok(&mut self, data: &str) -> Result<(), SessionError> {
        let reply = self.request(data)?;
        if reply == "OK" {
            Ok(())
        } else {
            Err(SessionError::Rejected {
                command: data.to_string(),
                reply,
            })
        }
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), SessionError> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        Ok(())
    }

    fn close(self) {
        let _ = self.writer.shutdown(Shutdown::Both);
    }
}

/// [`DebugSession`] speaking the GDB remote serial protocol over TCP.
///
/// Talks to the emulator's stub directly, no `gdb` process is involved.
pub struct GdbSession {
    conn: Option<Connection>,
    config: SessionConfig,
    layout: &'static [Register],
    pending_breakpoint: Option<u16>,
}

impl GdbSession {
    pub fn new() -> Self {
        Self {
            conn: None,
            config: SessionConfig::default(),
            layout: SM83_LAYOUT,
            pending_breakpoint: None,
        }
    }

    pub const fn is_attached(&self) -> bool {
        self.conn.is_some()
    }

    fn conn(&mut self) -> Result<&mut Connection, SessionError> {
        self.conn.as_mut().ok_or(SessionError::NotAttached)
    }

    fn wait_for_stop(&mut self) -> Result<StopReply, SessionError> {
        let timeout = self.config.resume_timeout;
        let conn = self.conn()?;
        conn.set_read_timeout(timeout)?;
        let reply = conn.recv();
        conn.set_read_timeout(None)?;

        let reply = match (reply, timeout) {
            (Err(SessionError::Io(e)), Some(limit))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                return Err(SessionError::Timeout(limit));
            }
            (reply, _) => reply?,
        };

        StopReply::parse(&reply)
            .ok_or_else(|| SessionError::Protocol(format!("unexpected stop reply '{reply}'")))
    }
}

impl Default for GdbSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugSession for GdbSession {
    fn configure(&mut self, config: &SessionConfig) -> Result<(), SessionError> {
        self.layout = register_layout(&config.architecture)
            .ok_or_else(|| SessionError::UnsupportedArchitecture(config.architecture.clone()))?;
        if config.pagination {
            debug!("pagination has no effect on a remote protocol session");
        }
        self.config = config.clone();
        Ok(())
    }

    fn attach(&mut self, endpoint: &str) -> Result<(), SessionError> {
        let mut conn = Connection::open(endpoint)?;

        let features = conn.request("qSupported:hwbreak+;")?;
        debug!(features = %features, "stub features");
        // The stub starts the CPU once it sees qAttached and only stops it on
        // `?`, so the halt has to come first or the boot ROM runs ahead.
        let halt = conn.request("?")?;
        if StopReply::parse(&halt).is_none() {
            return Err(SessionError::Protocol(format!(
                "unexpected halt reason '{halt}'"
            )));
        }
        let attached = conn.request("qAttached")?;
        debug!(endpoint, attached = %attached, halt = %halt, "attached to target");

        self.conn = Some(conn);
        Ok(())
    }

    fn set_temporary_breakpoint(&mut self, address: u16) -> Result<(), SessionError> {
        self.conn()?
            .expect_ok(&format!("Z1,{address:x},{BREAKPOINT_KIND}"))?;
        self.pending_breakpoint = Some(address);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), SessionError> {
        self.conn()?.send("c")?;
        match self.wait_for_stop()? {
            StopReply::Signal(signal) => {
                trace!(signal, "target stopped");
                if let Some(address) = self.pending_breakpoint.take() {
                    self.conn()?
                        .expect_ok(&format!("z1,{address:x},{BREAKPOINT_KIND}"))?;
                }
                Ok(())
            }
            StopReply::Exited(status) => Err(SessionError::TargetExited(status)),
            StopReply::Terminated(signal) => Err(SessionError::TargetTerminated(signal)),
        }
    }

    fn dump_registers(&mut self) -> Result<String, SessionError> {
        let layout = self.layout;
        let reply = self.conn()?.request("g")?;
        if reply.starts_with('E') {
            return Err(SessionError::Rejected {
                command: "g".to_string(),
                reply,
            });
        }
        let values = decode_registers(&reply, layout)?;
        Ok(format_registers(&values))
    }

    fn disconnect(&mut self) -> Result<(), SessionError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        let detached = conn.expect_ok("D");
        conn.close();
        debug!("detached from target");
        detached
    }
}
