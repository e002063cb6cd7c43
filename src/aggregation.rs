// 🧮 Band assignment and (band, genre) aggregation
//
// Each sale joins to the single band whose [from_price, to_price] holds its
// price. Sales outside every band are left out. The surviving sales are
// summed per (band, genre).

use crate::banding::PriceBand;
use crate::period::SaleFact;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A sale together with the band its price falls in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandedSale {
    pub sale: SaleFact,
    pub band: PriceBand,
}

/// Outcome of the containment join
#[derive(Debug, Clone, Default)]
pub struct BandAssignment {
    pub assigned: Vec<BandedSale>,
    /// Sales priced outside every band (above the capped last band, or below 1)
    pub dropped: usize,
}

/// Find the band holding `price` in a contiguous, ascending band list
pub fn find_band(bands: &[PriceBand], price: i64) -> Option<&PriceBand> {
    let index = bands.partition_point(|band| band.to_price < price);
    bands.get(index).filter(|band| band.contains(price))
}

/// Join every sale to its band
///
/// Bands never overlap, so a sale gets at most one band. Sales with no band
/// are counted in `dropped` and otherwise ignored.
pub fn assign_bands(sales: Vec<SaleFact>, bands: &[PriceBand]) -> BandAssignment {
    let mut assignment = BandAssignment::default();

    for sale in sales {
        match find_band(bands, sale.price) {
            Some(band) => assignment.assigned.push(BandedSale { sale, band: *band }),
            None => assignment.dropped += 1,
        }
    }

    assignment
}

// ============================================================================
// AGGREGATE ROWS
// ============================================================================

/// Composite key of an aggregate row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AggregateKey {
    pub price_band: i64,
    pub genre_id: i64,
}

/// Totals for one (band, genre) pair with at least one sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub price_band: i64,
    pub from_price: i64,
    pub to_price: i64,
    pub genre_id: i64,
    /// Sum of prices, minor currency units
    pub total_value: i64,
    /// Number of sales
    pub total_volume: i64,
}

impl AggregateRow {
    pub fn key(&self) -> AggregateKey {
        AggregateKey {
            price_band: self.price_band,
            genre_id: self.genre_id,
        }
    }
}

/// Group banded sales by (band, genre) and total them
///
/// Rows come back ordered by (price_band, genre_id). Pairs with no sales are
/// not emitted. Value totals saturate at `i64::MAX`.
pub fn aggregate(sales: &[BandedSale]) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<(PriceBand, i64), (i64, i64)> = BTreeMap::new();

    for banded in sales {
        let totals = groups
            .entry((banded.band, banded.sale.genre_id))
            .or_insert((0, 0));
        totals.0 = totals.0.saturating_add(banded.sale.price);
        totals.1 += 1;
    }

    groups
        .into_iter()
        .map(|((band, genre_id), (total_value, total_volume))| AggregateRow {
            price_band: band.number,
            from_price: band.from_price,
            to_price: band.to_price,
            genre_id,
            total_value,
            total_volume,
        })
        .collect()
}

/// Presentation order: ascending by (price_band, genre_id)
pub fn sort_rows(rows: &mut [AggregateRow]) {
    rows.sort_by_key(AggregateRow::key);
}
