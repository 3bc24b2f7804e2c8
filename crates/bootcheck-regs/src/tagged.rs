use crate::{Register, RegisterUpdate, RegsError, Result, parse_hex};

/// Parse one `name:hexvalue` field.
///
/// Returns `Ok(None)` for well-formed fields naming a register we do not
/// track; their value is not inspected.
pub fn parse_tagged_pair(field: &str) -> Result<Option<(Register, u16)>> {
    let field = field.trim();
    let Some((name, value)) = field.split_once(':') else {
        return Err(RegsError::MalformedPair(field.to_string()));
    };
    let (name, value) = (name.trim(), value.trim());
    if name.is_empty() || value.is_empty() || value.contains(':') {
        return Err(RegsError::MalformedPair(field.to_string()));
    }

    match Register::from_name(name) {
        Some(reg) => Ok(Some((reg, parse_hex(value)?))),
        None => Ok(None),
    }
}

/// Parse a sequence of `name:hexvalue` fields into a partial update.
///
/// Later fields win when a register is named twice.
pub fn parse_tagged_pairs<'a, I>(fields: I) -> Result<RegisterUpdate>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut update = RegisterUpdate::new();
    for field in fields {
        if let Some((reg, value)) = parse_tagged_pair(field)? {
            update.set(reg, value);
        }
    }
    Ok(update)
}
