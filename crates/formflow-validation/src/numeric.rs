//! Numeric validation functions

/// Outcome of a failed bounds check, carrying the violated bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeViolation<T> {
    TooSmall(T),
    TooLarge(T),
}

/// Validates a value against optional inclusive bounds
pub fn check_range<T: PartialOrd + Clone>(
    value: &T,
    min: Option<&T>,
    max: Option<&T>,
) -> Result<(), RangeViolation<T>> {
    if let Some(min) = min {
        if value < min {
            return Err(RangeViolation::TooSmall(min.clone()));
        }
    }

    if let Some(max) = max {
        if value > max {
            return Err(RangeViolation::TooLarge(max.clone()));
        }
    }

    Ok(())
}

/// Parses a whole number, accepting a leading sign
pub fn parse_integer(value: &str) -> Option<i64> {
    value.parse::<i64>().ok()
}

/// Parses a finite float; "NaN" and "inf" are rejected
pub fn parse_float(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range() {
        assert!(check_range(&5, Some(&0), Some(&10)).is_ok());
        assert!(check_range(&0, Some(&0), Some(&10)).is_ok());
        assert!(check_range(&10, Some(&0), Some(&10)).is_ok());
        assert_eq!(
            check_range(&15, Some(&0), Some(&10)),
            Err(RangeViolation::TooLarge(10))
        );
        assert_eq!(
            check_range(&-1, Some(&0), Some(&10)),
            Err(RangeViolation::TooSmall(0))
        );
        assert!(check_range(&1_000_000, None, None).is_ok());
    }

    #[test]
    fn test_parsing() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("-7"), Some(-7));
        assert_eq!(parse_integer("4.2"), None);
        assert_eq!(parse_float("4.25"), Some(4.25));
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float("abc"), None);
    }
}
