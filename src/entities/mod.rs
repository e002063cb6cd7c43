// Entity Models - the book shop's raw tables
//
// Plain records keyed by integer id. Relationships are foreign-key ids,
// resolved through lookup maps (see Catalog), never through live references.

pub mod book;
pub mod sale;
pub mod catalog;

pub use book::{Author, Book, Genre};
pub use sale::{BookSale, SaleTransaction};
pub use catalog::Catalog;

use anyhow::Result;
use chrono::NaiveDateTime;

/// Write side of a sales store
///
/// Implemented by the in-memory Catalog and by the SQLite store so the
/// dummy-sales generator can populate either one. Every method returns the
/// id assigned to the new row.
pub trait SalesWriter {
    fn add_author(&mut self, name: &str) -> Result<i64>;

    fn add_genre(&mut self, name: &str) -> Result<i64>;

    fn add_book(
        &mut self,
        title: &str,
        author_id: Option<i64>,
        genre_id: Option<i64>,
        price: Option<i64>,
    ) -> Result<i64>;

    fn add_transaction(&mut self, create_date: NaiveDateTime) -> Result<i64>;

    fn add_book_sale(&mut self, book_id: i64, transaction_id: i64) -> Result<i64>;
}
