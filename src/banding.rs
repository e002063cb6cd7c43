// 📊 Price Bands - data-dependent band width and boundaries
//
// The band width (increment) is derived from the highest price seen in the
// period, rounded up to a whole number of rounding units, so that at most
// `max_num_bands` bands cover [1, max_price].
//
// Bands are contiguous and non-overlapping:
//   band i spans (i-1)*increment + 1 ..= i*increment

use crate::config::BandingConfig;
use serde::{Deserialize, Serialize};

/// One price interval, both bounds inclusive
///
/// Ordering is by band number first, which is also price order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriceBand {
    pub number: i64,
    pub from_price: i64,
    pub to_price: i64,
}

impl PriceBand {
    pub fn contains(&self, price: i64) -> bool {
        self.from_price <= price && price <= self.to_price
    }
}

/// Ceiling division for a non-negative numerator and positive divisor
fn ceil_div(numerator: i64, divisor: i64) -> i64 {
    let quotient = numerator / divisor;
    if numerator % divisor != 0 {
        quotient + 1
    } else {
        quotient
    }
}

/// Band width for a period whose highest price is `max_price`
///
/// Smallest multiple of the rounding unit such that `max_num_bands` bands of
/// that width reach `max_price`, never less than one rounding unit.
///
/// ```
/// use sales_bands::{compute_increment, BandingConfig};
///
/// let config = BandingConfig::default();
/// assert_eq!(compute_increment(499, &config), 100);
/// assert_eq!(compute_increment(10001, &config), 2050);
/// ```
pub fn compute_increment(max_price: i64, config: &BandingConfig) -> i64 {
    let rounding_unit = config.rounding_unit();
    let span = rounding_unit.saturating_mul(config.max_num_bands());

    let units = ceil_div(max_price.max(0), span);
    units.saturating_mul(rounding_unit).max(rounding_unit)
}

/// Ordered band boundaries covering [1, max_price]
///
/// Produces `min(max_num_bands, ceil(max_price / increment))` bands. The last
/// band may overshoot `max_price`. When the cap is reached before
/// `max_price` is covered, the bands stop there and higher prices fall
/// outside every band.
///
/// A missing or non-positive `max_price` produces no bands. So does a
/// non-positive increment or band cap. Generation stops at the first band
/// whose bounds would not fit in an `i64`.
pub fn generate_bands(max_price: Option<i64>, increment: i64, max_num_bands: i64) -> Vec<PriceBand> {
    let max_price = match max_price {
        Some(price) if price > 0 => price,
        _ => return Vec::new(),
    };
    if increment <= 0 || max_num_bands <= 0 {
        return Vec::new();
    }

    let count = ceil_div(max_price, increment).min(max_num_bands);

    (1..=count)
        .map_while(|number| {
            let to_price = number.checked_mul(increment)?;
            let from_price = (number - 1).checked_mul(increment)?.checked_add(1)?;
            Some(PriceBand {
                number,
                from_price,
                to_price,
            })
        })
        .collect()
}

/// Compute the increment and bands for a period in one step
pub fn bands_for_max_price(max_price: Option<i64>, config: &BandingConfig) -> (i64, Vec<PriceBand>) {
    match max_price {
        Some(price) if price > 0 => {
            let increment = compute_increment(price, config);
            (increment, generate_bands(Some(price), increment, config.max_num_bands()))
        }
        _ => (0, Vec::new()),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn band(number: i64, from_price: i64, to_price: i64) -> PriceBand {
        PriceBand {
            number,
            from_price,
            to_price,
        }
    }

    #[test]
    fn test_increment_is_correct_value() {
        let config = BandingConfig::default();

        for (max_price, expected) in [
            (1, 50),
            (50, 50),
            (99, 50),
            (499, 100),
            (500, 100),
            (501, 150),
            (1001, 250),
            (10001, 2050),
        ] {
            assert_eq!(
                compute_increment(max_price, &config),
                expected,
                "increment for max_price {}",
                max_price
            );
        }
    }

    #[test]
    fn test_increment_never_below_rounding_unit() {
        let config = BandingConfig::new(25, 10).unwrap();

        assert_eq!(compute_increment(0, &config), 25);
        assert_eq!(compute_increment(-40, &config), 25);
        assert_eq!(compute_increment(3, &config), 25);
    }

    #[test]
    fn test_price_bands_are_correct() {
        let cases: Vec<(i64, i64, i64, Vec<PriceBand>)> = vec![
            (1, 50, 1, vec![band(1, 1, 50)]),
            (1, 50, 99, vec![band(1, 1, 50)]),
            (50, 50, 99, vec![band(1, 1, 50)]),
            (99, 50, 99, vec![band(1, 1, 50), band(2, 51, 100)]),
            (
                499,
                100,
                99,
                vec![
                    band(1, 1, 100),
                    band(2, 101, 200),
                    band(3, 201, 300),
                    band(4, 301, 400),
                    band(5, 401, 500),
                ],
            ),
            (
                500,
                100,
                99,
                vec![
                    band(1, 1, 100),
                    band(2, 101, 200),
                    band(3, 201, 300),
                    band(4, 301, 400),
                    band(5, 401, 500),
                ],
            ),
            (
                501,
                150,
                99,
                vec![
                    band(1, 1, 150),
                    band(2, 151, 300),
                    band(3, 301, 450),
                    band(4, 451, 600),
                ],
            ),
        ];

        for (max_price, increment, max_num_bands, expected) in cases {
            assert_eq!(
                generate_bands(Some(max_price), increment, max_num_bands),
                expected,
                "bands for max_price {} increment {}",
                max_price,
                increment
            );
        }
    }

    #[test]
    fn test_band_count_is_capped() {
        let bands = generate_bands(Some(1000), 100, 3);

        assert_eq!(bands.len(), 3);
        assert_eq!(bands.last().unwrap().to_price, 300);
    }

    #[test]
    fn test_no_bands_without_max_price() {
        assert!(generate_bands(None, 50, 5).is_empty());
        assert!(generate_bands(Some(0), 50, 5).is_empty());
        assert!(generate_bands(Some(-5), 50, 5).is_empty());
        assert!(generate_bands(Some(100), 0, 5).is_empty());

        let (increment, bands) = bands_for_max_price(None, &BandingConfig::default());
        assert_eq!(increment, 0);
        assert!(bands.is_empty());
    }

    #[test]
    fn test_bands_stop_before_overflowing() {
        let increment = 1i64 << 62;
        let bands = generate_bands(Some(i64::MAX - 1), increment, 5);

        assert_eq!(bands, vec![band(1, 1, increment)]);

        // Three bands are needed but the third would end past i64::MAX
        let unit = i64::MAX / 2;
        let config = BandingConfig::new(unit, 5).unwrap();
        let (increment, bands) = bands_for_max_price(Some(i64::MAX), &config);
        assert_eq!(increment, unit);
        assert_eq!(bands, vec![band(1, 1, unit), band(2, unit + 1, 2 * unit)]);
    }

    #[test]
    fn test_band_contains_is_inclusive() {
        let b = band(2, 51, 100);

        assert!(b.contains(51));
        assert!(b.contains(100));
        assert!(!b.contains(50));
        assert!(!b.contains(101));
    }

    proptest! {
        #[test]
        fn prop_increment_is_monotonic(
            a in 0i64..1_000_000,
            b in 0i64..1_000_000,
            rounding_unit in 1i64..500,
            max_num_bands in 1i64..50,
        ) {
            let config = BandingConfig::new(rounding_unit, max_num_bands).unwrap();
            let (low, high) = if a <= b { (a, b) } else { (b, a) };

            prop_assert!(compute_increment(low, &config) <= compute_increment(high, &config));
        }

        #[test]
        fn prop_increment_is_rounded_multiple(
            max_price in 0i64..1_000_000,
            rounding_unit in 1i64..500,
            max_num_bands in 1i64..50,
        ) {
            let config = BandingConfig::new(rounding_unit, max_num_bands).unwrap();
            let increment = compute_increment(max_price, &config);

            prop_assert_eq!(increment % rounding_unit, 0);
            prop_assert!(increment >= rounding_unit);
        }

        #[test]
        fn prop_computed_bands_cover_max_price(
            max_price in 1i64..1_000_000,
            rounding_unit in 1i64..500,
            max_num_bands in 1i64..50,
        ) {
            let config = BandingConfig::new(rounding_unit, max_num_bands).unwrap();
            let (_, bands) = bands_for_max_price(Some(max_price), &config);

            prop_assert!(!bands.is_empty());
            prop_assert!(bands.len() as i64 <= max_num_bands);
            prop_assert_eq!(bands[0].from_price, 1);
            prop_assert!(bands.last().unwrap().to_price >= max_price);
        }

        #[test]
        fn prop_bands_are_contiguous(
            max_price in 1i64..1_000_000,
            increment in 1i64..5_000,
            max_num_bands in 1i64..100,
        ) {
            let bands = generate_bands(Some(max_price), increment, max_num_bands);

            for (i, pair) in bands.windows(2).enumerate() {
                prop_assert_eq!(pair[1].from_price, pair[0].to_price + 1);
                prop_assert_eq!(pair[0].number, i as i64 + 1);
            }

            // Only a capped band count may leave max_price uncovered
            let covered = bands.last().map(|b| b.to_price >= max_price).unwrap_or(false);
            prop_assert!(covered || bands.len() as i64 == max_num_bands);
        }
    }
}
