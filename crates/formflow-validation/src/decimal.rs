//! Fixed-point decimal values and precision checks
//!
//! A decimal keeps the digits exactly as submitted (trailing fractional zeros
//! included), because precision rules count the digits the user typed:
//! "1.50" has two decimal places even though it equals "1.5".

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

/// Exact decimal number parsed from text
#[derive(Debug, Clone)]
pub struct Decimal {
    negative: bool,
    /// Integer digits without leading zeros; empty means zero
    integer: String,
    /// Fractional digits exactly as written
    fraction: String,
}

/// The text is not a plain decimal literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalParseError;

impl fmt::Display for DecimalParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid decimal literal")
    }
}

impl std::error::Error for DecimalParseError {}

/// Which precision rule a decimal broke, with the configured limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecisionViolation {
    MaxDigits(u32),
    MaxDecimalPlaces(u32),
    MaxWholeDigits(u32),
}

impl Decimal {
    /// Digits after the decimal point, as written
    pub fn decimal_places(&self) -> u32 {
        self.fraction.len() as u32
    }

    /// Total significant digits, counted the way precision rules count them
    pub fn digits(&self) -> u32 {
        match (self.integer.is_empty(), self.fraction.is_empty()) {
            (true, true) => 1,
            (true, false) => self.fraction.len() as u32,
            _ => (self.integer.len() + self.fraction.len()) as u32,
        }
    }

    /// Digits before the decimal point
    pub fn whole_digits(&self) -> u32 {
        self.digits() - self.decimal_places()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Enforce max total digits and max decimal places
    pub fn check_precision(
        &self,
        max_digits: Option<u32>,
        decimal_places: Option<u32>,
    ) -> Result<(), PrecisionViolation> {
        if let Some(max) = max_digits {
            if self.digits() > max {
                return Err(PrecisionViolation::MaxDigits(max));
            }
        }

        if let Some(places) = decimal_places {
            if self.decimal_places() > places {
                return Err(PrecisionViolation::MaxDecimalPlaces(places));
            }
        }

        if let (Some(max), Some(places)) = (max_digits, decimal_places) {
            let whole = max.saturating_sub(places);
            if self.whole_digits() > whole {
                return Err(PrecisionViolation::MaxWholeDigits(whole));
            }
        }

        Ok(())
    }

    fn trimmed_fraction(&self) -> &str {
        self.fraction.trim_end_matches('0')
    }

    fn is_zero(&self) -> bool {
        self.integer.is_empty() && self.trimmed_fraction().is_empty()
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        self.integer
            .len()
            .cmp(&other.integer.len())
            .then_with(|| self.integer.cmp(&other.integer))
            .then_with(|| self.trimmed_fraction().cmp(other.trimmed_fraction()))
    }
}

impl FromStr for Decimal {
    type Err = DecimalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (integer, fraction) = body.split_once('.').unwrap_or((body, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if integer.is_empty() && fraction.is_empty() {
            return Err(DecimalParseError);
        }
        if !all_digits(integer) || !all_digits(fraction) {
            return Err(DecimalParseError);
        }

        let mut decimal = Decimal {
            negative,
            integer: integer.trim_start_matches('0').to_string(),
            fraction: fraction.to_string(),
        };
        if decimal.is_zero() {
            decimal.negative = false;
        }
        Ok(decimal)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        if self.integer.is_empty() {
            f.write_str("0")?;
        } else {
            f.write_str(&self.integer)?;
        }
        if !self.fraction.is_empty() {
            write!(f, ".{}", self.fraction)?;
        }
        Ok(())
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}
