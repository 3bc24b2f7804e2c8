use tracing::trace;

use crate::{Register, RegisterUpdate, Result, parse_hex};

/// Parse a debugger register dump into a partial update.
///
/// Every line is split on whitespace; the first token names the register
/// and the second is its hex value, anything after that is ignored. GDB's
/// `info all-registers` output looks like:
///
/// ```text
/// af             0x1b0               432
/// bc             0x13                19
/// ```
///
/// Blank lines, lines led by a name we do not track, and truncated lines
/// holding only a register name are skipped. A value token that is not hex
/// on a tracked register is an error.
pub fn parse_freeform_dump(text: &str) -> Result<RegisterUpdate> {
    let mut update = RegisterUpdate::new();

    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        let Some(reg) = tokens.next().and_then(Register::from_name) else {
            continue;
        };
        let Some(value) = tokens.next() else {
            trace!(line, "register line without value");
            continue;
        };
        update.set(reg, parse_hex(value)?);
    }

    Ok(update)
}
