// 🗂️ Catalog - in-memory store of the shop's tables
//
// Each table is a map keyed by id. Sales join to books, books to genres and
// transactions through these maps, which keeps the graph acyclic.

use super::{Author, Book, BookSale, Genre, SaleTransaction, SalesWriter};
use crate::error::Result as BandingResult;
use crate::period::{filter_period, SaleFact, SaleSource};
use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default, Clone)]
pub struct Catalog {
    authors: BTreeMap<i64, Author>,
    genres: BTreeMap<i64, Genre>,
    books: BTreeMap<i64, Book>,
    transactions: BTreeMap<i64, SaleTransaction>,
    book_sales: BTreeMap<i64, BookSale>,
    next_id: i64,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn genres(&self) -> impl Iterator<Item = &Genre> {
        self.genres.values()
    }

    /// Lookup table used when presenting results
    pub fn genre_names(&self) -> HashMap<i64, String> {
        self.genres
            .values()
            .map(|genre| (genre.id, genre.name.clone()))
            .collect()
    }

    pub fn book_sale_count(&self) -> usize {
        self.book_sales.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Resolve one book sale into a fact, if the joins all succeed
    fn resolve(&self, sale: &BookSale) -> Option<SaleFact> {
        let book = self.books.get(&sale.book_id)?;
        if !book.is_reportable() {
            return None;
        }
        let genre_id = book.genre_id.filter(|id| self.genres.contains_key(id))?;
        let price = book.price?;
        let transaction = self.transactions.get(&sale.transaction_id)?;

        Some(SaleFact {
            book_id: book.id,
            price,
            genre_id,
            transaction_id: transaction.id,
            transaction_date: transaction.create_date,
        })
    }
}

impl SaleSource for Catalog {
    fn sales_for_period(
        &self,
        start_date: NaiveDateTime,
        end_date: NaiveDateTime,
    ) -> BandingResult<Vec<SaleFact>> {
        let facts = self.book_sales.values().filter_map(|sale| self.resolve(sale));
        Ok(filter_period(facts, start_date, end_date))
    }
}

impl SalesWriter for Catalog {
    fn add_author(&mut self, name: &str) -> Result<i64> {
        let id = self.allocate_id();
        self.authors.insert(
            id,
            Author {
                id,
                name: name.to_string(),
            },
        );
        Ok(id)
    }

    fn add_genre(&mut self, name: &str) -> Result<i64> {
        let id = self.allocate_id();
        self.genres.insert(
            id,
            Genre {
                id,
                name: name.to_string(),
            },
        );
        Ok(id)
    }

    fn add_book(
        &mut self,
        title: &str,
        author_id: Option<i64>,
        genre_id: Option<i64>,
        price: Option<i64>,
    ) -> Result<i64> {
        if let Some(author_id) = author_id {
            if !self.authors.contains_key(&author_id) {
                bail!("Unknown author id {}", author_id);
            }
        }
        if let Some(genre_id) = genre_id {
            if !self.genres.contains_key(&genre_id) {
                bail!("Unknown genre id {}", genre_id);
            }
        }

        let id = self.allocate_id();
        self.books.insert(
            id,
            Book {
                id,
                title: title.to_string(),
                author_id,
                genre_id,
                price,
            },
        );
        Ok(id)
    }

    fn add_transaction(&mut self, create_date: NaiveDateTime) -> Result<i64> {
        let id = self.allocate_id();
        self.transactions
            .insert(id, SaleTransaction { id, create_date });
        Ok(id)
    }

    fn add_book_sale(&mut self, book_id: i64, transaction_id: i64) -> Result<i64> {
        if !self.books.contains_key(&book_id) {
            bail!("Unknown book id {}", book_id);
        }
        if !self.transactions.contains_key(&transaction_id) {
            bail!("Unknown transaction id {}", transaction_id);
        }

        let id = self.allocate_id();
        self.book_sales.insert(
            id,
            BookSale {
                id,
                book_id,
                transaction_id,
            },
        );
        Ok(id)
    }
}
