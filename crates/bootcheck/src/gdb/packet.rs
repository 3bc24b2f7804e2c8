//! Remote serial protocol framing: `$<data>#<checksum>`.

use std::io::{self, Read};

use crate::session::SessionError;

/// Longest packet body accepted from the stub.
pub const MAX_PACKET_LEN: usize = 4096;

/// Modulo-256 sum of the packet body.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Frame `data` as a packet.
pub fn encode(data: &str) -> String {
    format!("${data}#{:02x}", checksum(data.as_bytes()))
}

/// Read one packet body, skipping acknowledgements.
///
/// A `-` (retransmit request) is treated as a protocol error, as is a
/// checksum mismatch.
pub fn read_packet<R: Read>(reader: &mut R) -> Result<String, SessionError> {
    loop {
        match read_byte(reader)? {
            b'+' => {}
            b'$' => break,
            b'-' => return Err(SessionError::Protocol("stub requested retransmission".into())),
            other => {
                return Err(SessionError::Protocol(format!(
                    "unexpected byte {other:#04x} before packet start"
                )));
            }
        }
    }

    let mut body = Vec::new();
    loop {
        match read_byte(reader)? {
            b'#' => break,
            b => {
                if body.len() >= MAX_PACKET_LEN {
                    return Err(SessionError::Protocol("packet too long".into()));
                }
                body.push(b);
            }
        }
    }

    let digits = [read_byte(reader)?, read_byte(reader)?];
    let expected = std::str::from_utf8(&digits)
        .ok()
        .and_then(|s| u8::from_str_radix(s, 16).ok())
        .ok_or_else(|| SessionError::Protocol("invalid checksum digits".into()))?;
    let actual = checksum(&body);
    if actual != expected {
        return Err(SessionError::Protocol(format!(
            "checksum mismatch: expected {expected:02x}, computed {actual:02x}"
        )));
    }

    String::from_utf8(body).map_err(|_| SessionError::Protocol("packet is not valid UTF-8".into()))
}

fn read_byte<R: Read>(reader: &mut R) -> Result<u8, SessionError> {
    let mut byte = [0u8; 1];
    match reader.read_exact(&mut byte) {
        Ok(()) => Ok(byte[0]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(SessionError::Protocol("connection closed by stub".into()))
        }
        Err(e) => Err(SessionError::Io(e)),
    }
}
