// 🌱 Dummy sales - a year of plausible book shop activity
//
// Ten genres with twelve books each. Book prices climb by genre and by
// position: price = (genre_index + 1 + i) * 50. Popular books sit in the
// middle of each list (Beta(2, 2) picks), and most transactions are small
// (triangular distribution with its mode at one book).

use crate::entities::SalesWriter;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime};
use log::info;
use rand::Rng;
use rand_distr::{Beta, Distribution, Triangular};

pub const DEFAULT_GENRES: [&str; 10] = [
    "Action and Adventure",
    "Art",
    "Biography",
    "Children's",
    "Comics",
    "Cookery",
    "Reference",
    "Drama",
    "History",
    "Travel",
];

pub const BOOKS_PER_GENRE: usize = 12;
pub const TRANSACTION_COUNT: usize = 100;
pub const MAX_BOOKS_PER_TRANSACTION: usize = 6;
pub const PRICE_STEP: i64 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub genres: usize,
    pub books: usize,
    pub transactions: usize,
    pub book_sales: usize,
}

/// Price of the i-th book (1-based) of the genre at `genre_index` (0-based)
pub fn book_price(genre_index: usize, i: usize) -> i64 {
    (genre_index as i64 + 1 + i as i64) * PRICE_STEP
}

/// Pick an index in [0, len) biased towards the middle
fn pick_index<R: Rng>(beta: &Beta<f64>, rng: &mut R, len: usize) -> usize {
    let index = (beta.sample(rng) * len as f64) as usize;
    index.min(len - 1)
}

/// Populate `writer` with genres, books and random transactions dated
/// within `[start_date, end_date]`
pub fn create_dummy_sales<W, R>(
    writer: &mut W,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
    rng: &mut R,
) -> Result<SeedSummary>
where
    W: SalesWriter + ?Sized,
    R: Rng,
{
    if start_date > end_date {
        bail!("Start date {} is after end date {}", start_date, end_date);
    }

    let mut summary = SeedSummary::default();

    // genre id -> book ids in price order
    let mut shelves: Vec<Vec<i64>> = Vec::with_capacity(DEFAULT_GENRES.len());
    let mut genre_ids = Vec::with_capacity(DEFAULT_GENRES.len());
    for name in DEFAULT_GENRES {
        genre_ids.push(writer.add_genre(name)?);
        shelves.push(Vec::with_capacity(BOOKS_PER_GENRE));
        summary.genres += 1;
    }

    for i in 1..=BOOKS_PER_GENRE {
        for (genre_index, name) in DEFAULT_GENRES.iter().enumerate() {
            let author_id = writer.add_author(&format!("Author {}", summary.books + 1))?;
            let book_id = writer.add_book(
                &format!("Book {} of {}", i, name),
                Some(author_id),
                Some(genre_ids[genre_index]),
                Some(book_price(genre_index, i)),
            )?;
            shelves[genre_index].push(book_id);
            summary.books += 1;
        }
    }

    let beta = Beta::new(2.0, 2.0).context("Invalid beta distribution")?;
    let basket = Triangular::new(0.0, 1.0, 0.0).context("Invalid triangular distribution")?;
    let start_ts = start_date.and_utc().timestamp();
    let end_ts = end_date.and_utc().timestamp();

    for _ in 0..TRANSACTION_COUNT {
        let ts = rng.gen_range(start_ts..=end_ts);
        let create_date = DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.naive_utc())
            .with_context(|| format!("Timestamp {} out of range", ts))?;
        let transaction_id = writer.add_transaction(create_date)?;
        summary.transactions += 1;

        let size = (basket.sample(rng) * MAX_BOOKS_PER_TRANSACTION as f64) as usize + 1;
        for _ in 0..size.min(MAX_BOOKS_PER_TRANSACTION) {
            let shelf = &shelves[pick_index(&beta, rng, shelves.len())];
            let book_id = shelf[pick_index(&beta, rng, shelf.len())];
            writer.add_book_sale(book_id, transaction_id)?;
            summary.book_sales += 1;
        }
    }

    info!(
        "seeded {} genres, {} books, {} transactions, {} book sales",
        summary.genres, summary.books, summary.transactions, summary.book_sales
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Catalog;
    use crate::period::SaleSource;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn year_2016() -> (NaiveDateTime, NaiveDateTime) {
        (
            NaiveDate::from_ymd_opt(2016, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            NaiveDate::from_ymd_opt(2016, 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_book_prices() {
        assert_eq!(book_price(0, 1), 100);
        assert_eq!(book_price(9, 12), 1100);
    }

    #[test]
    fn test_dummy_sales_shape() {
        let (start, end) = year_2016();
        let mut catalog = Catalog::new();
        let mut rng = StdRng::seed_from_u64(1);

        let summary = create_dummy_sales(&mut catalog, start, end, &mut rng).unwrap();

        assert_eq!(summary.genres, 10);
        assert_eq!(summary.books, 120);
        assert_eq!(summary.transactions, 100);
        assert!(summary.book_sales >= 100 && summary.book_sales <= 600);
        assert_eq!(catalog.book_sale_count(), summary.book_sales);
        assert_eq!(catalog.transaction_count(), 100);

        let facts = catalog.sales_for_period(start, end).unwrap();
        assert_eq!(facts.len(), summary.book_sales);
        assert!(facts.iter().all(|f| f.price >= 100 && f.price <= 1100));
    }

    #[test]
    fn test_dummy_sales_are_repeatable() {
        let (start, end) = year_2016();
        let mut first = Catalog::new();
        let mut second = Catalog::new();

        create_dummy_sales(&mut first, start, end, &mut StdRng::seed_from_u64(7)).unwrap();
        create_dummy_sales(&mut second, start, end, &mut StdRng::seed_from_u64(7)).unwrap();

        assert_eq!(
            first.sales_for_period(start, end).unwrap(),
            second.sales_for_period(start, end).unwrap()
        );
    }

    #[test]
    fn test_rejects_inverted_range() {
        let (start, end) = year_2016();
        let mut catalog = Catalog::new();

        let result = create_dummy_sales(&mut catalog, end, start, &mut StdRng::seed_from_u64(1));

        assert!(result.is_err());
        assert_eq!(catalog.genres().count(), 0);
    }
}
