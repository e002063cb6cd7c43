//! Sales by price band and genre, end to end.
//!
//! period filter -> max price -> increment -> bands -> assignment -> totals
//!
//! Every stage is a pure function of its inputs, so the same source can
//! serve any number of concurrent queries.

use crate::aggregation::{aggregate, assign_bands, sort_rows, AggregateRow};
use crate::banding::{bands_for_max_price, PriceBand};
use crate::config::BandingConfig;
use crate::error::Result;
use crate::period::{max_price, SaleSource};
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Everything computed for one period, not only the aggregate rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBandReport {
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub config: BandingConfig,
    /// None when the period has no sales
    pub max_price: Option<i64>,
    /// Zero when no bands were generated
    pub increment: i64,
    pub bands: Vec<PriceBand>,
    pub rows: Vec<AggregateRow>,
    pub sales_in_period: usize,
    /// Sales priced outside every band
    pub dropped_sales: usize,
}

impl PriceBandReport {
    pub fn total_value(&self) -> i64 {
        self.rows.iter().map(|row| row.total_value).sum()
    }

    pub fn total_volume(&self) -> i64 {
        self.rows.iter().map(|row| row.total_volume).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Run the whole pipeline and keep the intermediate results
pub fn build_report<S: SaleSource + ?Sized>(
    source: &S,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
    config: &BandingConfig,
) -> Result<PriceBandReport> {
    config.validate()?;

    let sales = source.sales_for_period(start_date, end_date)?;
    let sales_in_period = sales.len();
    debug!("{} sales between {} and {}", sales_in_period, start_date, end_date);

    let max_price = max_price(&sales);
    let (increment, bands) = bands_for_max_price(max_price, config);
    debug!(
        "max price {:?}, increment {}, {} bands",
        max_price,
        increment,
        bands.len()
    );

    let assignment = assign_bands(sales, &bands);
    if assignment.dropped > 0 {
        warn!(
            "{} of {} sales fall outside the {} generated bands and are excluded",
            assignment.dropped,
            sales_in_period,
            bands.len()
        );
    }

    let mut rows = aggregate(&assignment.assigned);
    sort_rows(&mut rows);
    info!(
        "price band report {} to {}: {} rows from {} sales",
        start_date,
        end_date,
        rows.len(),
        assignment.assigned.len()
    );

    Ok(PriceBandReport {
        start_date,
        end_date,
        config: *config,
        max_price,
        increment,
        bands,
        rows,
        sales_in_period,
        dropped_sales: assignment.dropped,
    })
}

/// Totals per (price band, genre) for sales dated within
/// `[start_date, end_date]`, ordered by (price_band, genre_id)
///
/// An empty period or an inverted range gives an empty Vec.
pub fn compute_sales_by_price_band<S: SaleSource + ?Sized>(
    source: &S,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
    config: &BandingConfig,
) -> Result<Vec<AggregateRow>> {
    Ok(build_report(source, start_date, end_date, config)?.rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Catalog, SalesWriter};
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    /// Two genres, sales at 30 and 80 (A) and 130 (B) in June 2016
    fn small_catalog() -> (Catalog, i64, i64) {
        let mut catalog = Catalog::new();
        let a = catalog.add_genre("Art").unwrap();
        let b = catalog.add_genre("Drama").unwrap();
        let tx = catalog.add_transaction(at(2016, 6, 1)).unwrap();

        for (price, genre) in [(30, a), (80, a), (130, b)] {
            let book = catalog
                .add_book(&format!("Book at {}", price), None, Some(genre), Some(price))
                .unwrap();
            catalog.add_book_sale(book, tx).unwrap();
        }

        (catalog, a, b)
    }

    #[test]
    fn test_pipeline_over_catalog() {
        let (catalog, a, b) = small_catalog();
        let config = BandingConfig::new(50, 5).unwrap();

        let report = build_report(&catalog, at(2016, 1, 1), at(2016, 12, 31), &config).unwrap();

        // max 130 -> increment 50 -> bands up to 150
        assert_eq!(report.max_price, Some(130));
        assert_eq!(report.increment, 50);
        assert_eq!(report.bands.len(), 3);
        assert_eq!(report.dropped_sales, 0);

        let keys: Vec<(i64, i64, i64)> = report
            .rows
            .iter()
            .map(|r| (r.price_band, r.genre_id, r.total_value))
            .collect();
        assert_eq!(keys, vec![(1, a, 30), (2, a, 80), (3, b, 130)]);
        assert_eq!(report.total_value(), 240);
        assert_eq!(report.total_volume(), 3);
    }

    #[test]
    fn test_empty_period_is_not_an_error() {
        let (catalog, _, _) = small_catalog();

        let rows = compute_sales_by_price_band(
            &catalog,
            at(2017, 1, 1),
            at(2017, 12, 31),
            &BandingConfig::default(),
        )
        .unwrap();

        assert!(rows.is_empty());
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let (catalog, _, _) = small_catalog();

        let report = build_report(
            &catalog,
            at(2016, 12, 31),
            at(2016, 1, 1),
            &BandingConfig::default(),
        )
        .unwrap();

        assert!(report.is_empty());
        assert_eq!(report.max_price, None);
        assert!(report.bands.is_empty());
    }

    #[test]
    fn test_single_band_widens_to_cover_max_price() {
        let (catalog, a, _) = small_catalog();
        // One band allowed, so the increment grows to 150
        let config = BandingConfig::new(50, 1).unwrap();

        let report = build_report(&catalog, at(2016, 1, 1), at(2016, 12, 31), &config).unwrap();

        assert_eq!(report.increment, 150);
        assert_eq!(report.bands.len(), 1);
        assert_eq!(report.dropped_sales, 0);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].genre_id, a);
        assert_eq!(report.rows[0].total_value, 110);
        assert_eq!(report.rows[0].total_volume, 2);
    }

    #[test]
    fn test_invalid_deserialized_config_is_rejected() {
        let (catalog, _, _) = small_catalog();
        let config: BandingConfig =
            serde_json::from_str(r#"{"rounding_unit": 50, "max_num_bands": 0}"#).unwrap();

        let result = build_report(&catalog, at(2016, 1, 1), at(2016, 12, 31), &config);

        assert!(matches!(
            result,
            Err(crate::error::BandingError::InvalidConfiguration { field: "max_num_bands", .. })
        ));
    }
}
