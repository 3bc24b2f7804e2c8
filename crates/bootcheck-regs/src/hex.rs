use crate::{RegsError, Result};

/// Parse a 16-bit hex value, with or without a `0x` prefix.
///
/// Leading zeros are accepted (`0x000001b0`), values above `0xffff` are
/// rejected rather than truncated.
pub fn parse_hex(text: &str) -> Result<u16> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RegsError::InvalidHex(text.to_string()));
    }

    let significant = digits.trim_start_matches('0');
    if significant.len() > 4 {
        return Err(RegsError::OutOfRange(text.to_string()));
    }
    if significant.is_empty() {
        return Ok(0);
    }

    u16::from_str_radix(significant, 16).map_err(|_| RegsError::InvalidHex(text.to_string()))
}
