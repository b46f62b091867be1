use chrono::NaiveDateTime;

use crate::calendar::add_months;
use crate::error::{Error, Result};
use crate::model::MinorUnits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Installment {
    pub timestamp: NaiveDateTime,
    pub amount: MinorUnits,
}

pub fn split(amount: MinorUnits, count: u32, start: NaiveDateTime) -> Result<Vec<Installment>> {
    if count == 0 {
        return Err(Error::InvalidInstallmentCount(count));
    }

    let magnitude = i128::from(amount.0).abs();
    let base = magnitude / i128::from(count);
    let remainder = magnitude % i128::from(count);
    let sign = if amount.is_negative() { -1 } else { 1 };

    (0..count)
        .map(|i| {
            let part = base + i128::from(i128::from(i) < remainder);
            // Same sign as `amount` and no larger in magnitude, so it fits back into i64.
            let amount = MinorUnits((sign * part) as i64);

            Ok(Installment {
                // Always offset from `start` so a clamped month does not shorten later ones.
                timestamp: add_months(start, i)?,
                amount,
            })
        })
        .collect()
}
