// 📅 Period selection - sale facts for a date range
//
// A SaleFact is one book sale flattened together with the book's price and
// genre and the transaction's date. Everything downstream works on these.

use crate::error::{BandingError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleFact {
    pub book_id: i64,
    /// Minor currency units
    pub price: i64,
    pub genre_id: i64,
    pub transaction_id: i64,
    pub transaction_date: NaiveDateTime,
}

/// Read side of a sales store
///
/// Returns every sale whose transaction date lies within
/// `[start_date, end_date]`, both ends inclusive. An inverted range is not an
/// error, it simply matches nothing.
pub trait SaleSource {
    fn sales_for_period(
        &self,
        start_date: NaiveDateTime,
        end_date: NaiveDateTime,
    ) -> Result<Vec<SaleFact>>;
}

/// Inclusive on both ends
pub fn in_period(date: NaiveDateTime, start_date: NaiveDateTime, end_date: NaiveDateTime) -> bool {
    start_date <= date && date <= end_date
}

/// Parse a period bound given as `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`
///
/// A bare date means the start of that day, or its last second when
/// `end_of_day` is set, so a date-only range covers whole days.
pub fn parse_period_bound(value: &str, end_of_day: bool) -> Result<NaiveDateTime> {
    let value = value.trim();

    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(datetime);
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| {
        BandingError::InvalidDate {
            value: value.to_string(),
            source,
        }
    })?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
    } else {
        NaiveTime::MIN
    };

    Ok(date.and_time(time))
}

/// Keep only the facts dated within the period
pub fn filter_period(
    facts: impl IntoIterator<Item = SaleFact>,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
) -> Vec<SaleFact> {
    facts
        .into_iter()
        .filter(|fact| in_period(fact.transaction_date, start_date, end_date))
        .collect()
}

/// Highest price in the set, None when the set is empty
pub fn max_price(facts: &[SaleFact]) -> Option<i64> {
    facts.iter().map(|fact| fact.price).max()
}
