//! Human-readable size formatting for memory configuration values.

use core::fmt;

/// Formats a byte count with binary prefixes (KiB, MiB, ...).
///
/// Whole multiples print without a fraction; anything else prints with two decimals.
///
/// # Examples
///
/// ```
/// use vmm::HumanSize;
///
/// assert_eq!(format!("{}", HumanSize(1023)), "1023B");
/// assert_eq!(format!("{}", HumanSize(4096)), "4KiB");
/// assert_eq!(format!("{}", HumanSize(1536)), "1.50KiB");
/// assert_eq!(format!("{}", HumanSize(1 << 32)), "4GiB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct HumanSize(pub u64);

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

        let mut unit = 0;
        let mut whole = self.0;
        while whole >= 1024 && unit < UNITS.len() - 1 {
            whole /= 1024;
            unit += 1;
        }

        let divisor = 1u64 << (10 * unit);
        if self.0 % divisor == 0 {
            write!(f, "{}{}", whole, UNITS[unit])
        } else {
            write!(f, "{:.2}{}", self.0 as f64 / divisor as f64, UNITS[unit])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bytes() {
        assert_eq!(format!("{}", HumanSize(0)), "0B");
        assert_eq!(format!("{}", HumanSize(512)), "512B");
    }

    #[test]
    fn formats_exact_multiples() {
        assert_eq!(format!("{}", HumanSize(1024)), "1KiB");
        assert_eq!(format!("{}", HumanSize(16 * 1024 * 1024)), "16MiB");
        assert_eq!(format!("{}", HumanSize(1 << 40)), "1TiB");
    }

    #[test]
    fn formats_fractions() {
        assert_eq!(format!("{}", HumanSize(1536)), "1.50KiB");
        assert_eq!(format!("{}", HumanSize(1025)), "1.00KiB");
    }

    #[test]
    fn formats_largest_unit() {
        assert_eq!(format!("{}", HumanSize(u64::MAX)), "16.00EiB");
    }
}
