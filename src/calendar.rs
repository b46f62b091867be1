use chrono::{Days, Months, NaiveDateTime};

use crate::error::{Error, Result};
use crate::model::{Period, PeriodUnit};

/// Adds calendar months, clamping the day to the last valid day of the target month.
pub fn add_months(timestamp: NaiveDateTime, months: u32) -> Result<NaiveDateTime> {
    timestamp
        .checked_add_months(Months::new(months))
        .ok_or(Error::TimestampOverflow)
}

pub fn advance(timestamp: NaiveDateTime, period: &Period) -> Result<NaiveDateTime> {
    if period.count == 0 {
        return Err(Error::InvalidPeriod(period.count));
    }

    match period.unit {
        PeriodUnit::Day => timestamp
            .checked_add_days(Days::new(period.count.into()))
            .ok_or(Error::TimestampOverflow),
        PeriodUnit::Week => timestamp
            .checked_add_days(Days::new(u64::from(period.count) * 7))
            .ok_or(Error::TimestampOverflow),
        PeriodUnit::Month => add_months(timestamp, period.count),
        PeriodUnit::Year => add_months(
            timestamp,
            period
                .count
                .checked_mul(12)
                .ok_or(Error::TimestampOverflow)?,
        ),
    }
}

#[cfg(test)]
pub(crate) fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("inline date error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_months_clamps_to_month_end() -> Result<()> {
        assert_eq!(add_months(at(2024, 1, 31), 1)?, at(2024, 2, 29));
        assert_eq!(add_months(at(2023, 1, 31), 1)?, at(2023, 2, 28));
        assert_eq!(add_months(at(2024, 1, 31), 2)?, at(2024, 3, 31));
        assert_eq!(add_months(at(2024, 3, 31), 1)?, at(2024, 4, 30));

        Ok(())
    }

    #[test]
    fn test_add_months_keeps_time_of_day() -> Result<()> {
        let start = at(2024, 5, 15);
        assert_eq!(add_months(start, 0)?, start);
        assert_eq!(add_months(start, 13)?.time(), start.time());

        Ok(())
    }

    #[test]
    fn test_advance_units() -> Result<()> {
        let start = at(2024, 2, 29);
        assert_eq!(advance(start, &Period::new(3, PeriodUnit::Day))?, at(2024, 3, 3));
        assert_eq!(advance(start, &Period::new(2, PeriodUnit::Week))?, at(2024, 3, 14));
        assert_eq!(advance(start, &Period::new(1, PeriodUnit::Month))?, at(2024, 3, 29));
        assert_eq!(advance(start, &Period::new(1, PeriodUnit::Year))?, at(2025, 2, 28));
        assert_eq!(advance(start, &Period::new(4, PeriodUnit::Year))?, at(2028, 2, 29));

        Ok(())
    }

    #[test]
    fn test_advance_zero_period() {
        assert!(matches!(
            advance(at(2024, 1, 1), &Period::new(0, PeriodUnit::Day)),
            Err(Error::InvalidPeriod(0))
        ));
    }

    #[test]
    fn test_advance_out_of_range() {
        assert!(matches!(
            advance(NaiveDateTime::MAX, &Period::new(1, PeriodUnit::Day)),
            Err(Error::TimestampOverflow)
        ));
    }
}
