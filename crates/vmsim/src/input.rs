//! Address parsing and batch address sources.

use std::fmt;
use std::io::BufRead;
use std::num::IntErrorKind;

use rand::Rng;

/// Largest accepted random batch.
pub const MAX_RANDOM_COUNT: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Decimal,
    /// Accepts an optional `0x` / `0X` prefix.
    Hexadecimal,
}

impl Radix {
    const fn base(self) -> u32 {
        match self {
            Self::Decimal => 10,
            Self::Hexadecimal => 16,
        }
    }

    /// Formats an address the way users type it in this radix.
    pub fn format(self, value: u64) -> String {
        match self {
            Self::Decimal => value.to_string(),
            Self::Hexadecimal => format!("0x{:X}", value),
        }
    }

    /// Message naming the valid address range for a virtual space of `limit` bytes.
    pub fn range_message(self, limit: u64) -> String {
        format!(
            "Address must be between {} and {}",
            self.format(0),
            self.format(limit.saturating_sub(1))
        )
    }
}

/// Errors from [`parse_address`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAddressError {
    /// Nothing but whitespace (or a bare `0x`).
    Empty,
    /// A character that is not a digit in the radix.
    InvalidDigit { input: String, radix: Radix },
    /// Does not fit in 64 bits.
    Overflow { input: String },
}

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no address given"),
            Self::InvalidDigit {
                input,
                radix: Radix::Decimal,
            } => write!(f, "'{}' is not a valid decimal number", input),
            Self::InvalidDigit {
                input,
                radix: Radix::Hexadecimal,
            } => write!(
                f,
                "'{}' is not a valid hexadecimal number (e.g., 1A2B3C)",
                input
            ),
            Self::Overflow { input } => write!(f, "'{}' does not fit in 64 bits", input),
        }
    }
}

impl std::error::Error for ParseAddressError {}

pub fn parse_address(text: &str, radix: Radix) -> Result<u64, ParseAddressError> {
    let trimmed = text.trim();
    let digits = match radix {
        Radix::Hexadecimal => trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed),
        Radix::Decimal => trimmed,
    };

    u64::from_str_radix(digits, radix.base()).map_err(|err| match err.kind() {
        IntErrorKind::Empty => ParseAddressError::Empty,
        IntErrorKind::PosOverflow => ParseAddressError::Overflow {
            input: trimmed.to_string(),
        },
        _ => ParseAddressError::InvalidDigit {
            input: trimmed.to_string(),
            radix,
        },
    })
}

/// Reads one decimal address per line.
///
/// Blank lines and `#` comments are skipped silently; anything else that does not parse is
/// skipped with a warning.
pub fn read_addresses<R: BufRead>(reader: R) -> std::io::Result<Vec<u64>> {
    let mut addresses = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_address(line, Radix::Decimal) {
            Ok(address) => addresses.push(address),
            Err(err) => log::warn!("line {}: skipped: {}", index + 1, err),
        }
    }
    Ok(addresses)
}

/// Draws `count` addresses uniformly from `0..limit`.
pub fn random_addresses(rng: &mut impl Rng, count: u32, limit: u64) -> Vec<u64> {
    (0..count).map(|_| rng.gen_range(0..limit)).collect()
}

/// Checks a random batch size against `1..=MAX_RANDOM_COUNT`.
pub fn check_count(count: u32) -> Result<u32, String> {
    if (1..=MAX_RANDOM_COUNT).contains(&count) {
        Ok(count)
    } else {
        Err(format!("Count must be between 1 and {}", MAX_RANDOM_COUNT))
    }
}
