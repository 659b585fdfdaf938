use chrono::{Months, NaiveDate};

use crate::error::ContractError;
use crate::ContractResult;

/// Add `months` calendar months to `date`.
///
/// When the target month is shorter than the day-of-month of `date`, the
/// result is the last day of the target month (Jan 31 + 1 → Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> ContractResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| ContractError::DateError(format!("{date} + {months} months is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_leap_year_clamp() {
        assert_eq!(add_months(d(2024, 1, 31), 1).unwrap(), d(2024, 2, 29));
    }

    #[test]
    fn test_non_leap_year_clamp() {
        assert_eq!(add_months(d(2023, 1, 31), 1).unwrap(), d(2023, 2, 28));
    }

    #[test]
    fn test_zero_months() {
        assert_eq!(add_months(d(2024, 3, 15), 0).unwrap(), d(2024, 3, 15));
    }

    #[test]
    fn test_year_rollover() {
        assert_eq!(add_months(d(2024, 11, 30), 3).unwrap(), d(2025, 2, 28));
        assert_eq!(add_months(d(2024, 12, 1), 1).unwrap(), d(2025, 1, 1));
    }

    #[test]
    fn test_clamp_does_not_accumulate() {
        // Each offset is taken from the original date, not chained.
        let start = d(2024, 1, 31);
        assert_eq!(add_months(start, 2).unwrap(), d(2024, 3, 31));
        assert_eq!(add_months(start, 3).unwrap(), d(2024, 4, 30));
    }

    #[test]
    fn test_out_of_range() {
        assert!(add_months(NaiveDate::MAX, 1).is_err());
    }
}
