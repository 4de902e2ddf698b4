use lazy_static::lazy_static;
use regex::Regex;
use crate::error::ConfigError;

lazy_static! {
    static ref BYTE_SIZE_PATTERN: Regex =
        Regex::new(r"^\s*(?P<value>[0-9]+)\s*_?(?P<unit>B|Bytes|KiB|MiB)?\s*$").unwrap();
}

/// Size in bytes, the identity. Exists so sizes read the same as `kib` and `mib`
pub const fn bytes(size: u32) -> u32 {
    size
}

/// Size in kibibytes, converted to bytes
pub const fn kib(size: u32) -> u32 {
    size << 10
}

/// Size in mebibytes, converted to bytes
pub const fn mib(size: u32) -> u32 {
    size << 20
}

/// Parses a byte size literal such as `64`, `64B`, `64_Bytes`, `4KiB` or `1_MiB` into bytes
///
/// Sizes which don't fit in 32 bits are rejected rather than truncated
///
/// # Arguments
///
/// * `input`: The literal, surrounding whitespace is ignored
///
/// returns: Result<u32, ConfigError>
///
/// # Examples
///
/// ```
/// use probelib::util::parse_byte_size;
/// assert_eq!(parse_byte_size("64_Bytes").unwrap(), 64);
/// assert_eq!(parse_byte_size("2KiB").unwrap(), 2048);
/// assert!(parse_byte_size("64 parsecs").is_err());
/// ```
pub fn parse_byte_size(input: &str) -> Result<u32, ConfigError> {
    let invalid = || ConfigError::ByteSize(input.to_string());
    let tokens = BYTE_SIZE_PATTERN.captures(input).ok_or_else(invalid)?;
    let value: u32 = tokens["value"].parse().map_err(|_| invalid())?;
    let shift = match tokens.name("unit").map(|unit| unit.as_str()) {
        None | Some("B") | Some("Bytes") => 0,
        Some("KiB") => 10,
        Some("MiB") => 20,
        Some(_) => return Err(invalid()),
    };
    value.checked_mul(1u32 << shift).ok_or_else(invalid)
}
