//! Memory-size literal parsing and the 1024-based unit constants.
//!
//! Grammar: `digits[KB|MB|GB]`. The unit, if present, must be exactly the
//! last two characters of the string; everything before it must be decimal
//! digits. An empty string, a string that is only a unit, or an unknown unit
//! are all errors.

use crate::error::SignatureError;

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * 1024;
pub const GB: u64 = 1024 * 1024 * 1024;

pub fn parse_memory_size(literal: &str) -> Result<u64, SignatureError> {
    if literal.is_empty() {
        return Err(SignatureError::Config("empty memory size".into()));
    }

    let bad = || SignatureError::Config(format!("invalid memory size literal: {literal:?}"));

    // Find where the digit run ends.
    let digit_end = literal
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(literal.len());

    if digit_end == literal.len() {
        // Pure digits, no unit: interpret as raw bytes.
        return literal.parse::<u64>().map_err(|_| bad());
    }

    if digit_end == 0 {
        return Err(bad());
    }

    let digits = &literal[..digit_end];
    let unit = &literal[digit_end..];
    if unit.len() != 2 || digit_end + 2 != literal.len() {
        return Err(bad());
    }

    let multiplier = match unit {
        "KB" => KB,
        "MB" => MB,
        "GB" => GB,
        _ => return Err(bad()),
    };

    let count: u64 = digits.parse().map_err(|_| bad())?;
    count.checked_mul(multiplier).ok_or_else(bad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_digits_as_bytes() {
        assert_eq!(parse_memory_size("512").unwrap(), 512);
    }

    #[test]
    fn parses_kb_mb_gb() {
        assert_eq!(parse_memory_size("1KB").unwrap(), KB);
        assert_eq!(parse_memory_size("3MB").unwrap(), 3 * MB);
        assert_eq!(parse_memory_size("2GB").unwrap(), 2 * GB);
    }

    #[test]
    fn empty_string_is_an_error() {
        assert!(parse_memory_size("").is_err());
    }

    #[test]
    fn unit_only_is_an_error() {
        assert!(parse_memory_size("MB").is_err());
    }

    #[test]
    fn unknown_unit_is_an_error() {
        assert!(parse_memory_size("10TB").is_err());
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        assert!(parse_memory_size("10MBx").is_err());
        assert!(parse_memory_size("10M").is_err());
    }

    #[test]
    fn zero_is_valid() {
        assert_eq!(parse_memory_size("0").unwrap(), 0);
        assert_eq!(parse_memory_size("0KB").unwrap(), 0);
    }
}
