// 🗄️ SQLite store - book shop tables and the pushed-down queries
//
// Dates are stored as TEXT in DATE_FORMAT so that string comparison in SQL
// (BETWEEN) is chronological comparison. The fraction is always nine digits
// wide; a shorter one would break that ordering.

use crate::aggregation::AggregateRow;
use crate::config::BandingConfig;
use crate::entities::{Genre, SalesWriter};
use crate::error::{BandingError, Result as BandingResult};
use crate::period::{SaleFact, SaleSource};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Accepts stored dates with or without a fractional second
const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn format_date(date: NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> BandingResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, PARSE_FORMAT).map_err(|source| BandingError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS author (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS genre (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS book (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author_id INTEGER REFERENCES author(id),
            genre_id INTEGER REFERENCES genre(id),
            price INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sale_transaction (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            create_date TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%S.000000000', 'now'))
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS book_sale (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id INTEGER NOT NULL REFERENCES book(id),
            transaction_id INTEGER NOT NULL REFERENCES sale_transaction(id)
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON sale_transaction(create_date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_book_sale_transaction ON book_sale(transaction_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_book_genre ON book(genre_id)",
        [],
    )?;

    Ok(())
}

/// Drop every table and recreate the schema
pub fn reset_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS book_sale;
         DROP TABLE IF EXISTS sale_transaction;
         DROP TABLE IF EXISTS book;
         DROP TABLE IF EXISTS genre;
         DROP TABLE IF EXISTS author;",
    )
    .context("Failed to drop tables")?;

    setup_database(conn)
}

// ============================================================================
// STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {:?}", path))?;
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one SQL transaction, rolling back if it fails
    pub fn batch<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.conn.execute_batch("BEGIN")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    warn!("Rollback failed after {:#}: {}", e, rollback);
                }
                Err(e)
            }
        }
    }

    pub fn genres(&self) -> Result<Vec<Genre>> {
        get_genres(&self.conn)
    }

    pub fn genre_names(&self) -> Result<HashMap<i64, String>> {
        Ok(self
            .genres()?
            .into_iter()
            .map(|genre| (genre.id, genre.name))
            .collect())
    }

    pub fn book_sale_count(&self) -> Result<i64> {
        count_rows(&self.conn, "book_sale")
    }

    pub fn transaction_count(&self) -> Result<i64> {
        count_rows(&self.conn, "sale_transaction")
    }

    /// Whole pipeline as one SQL statement
    pub fn sales_by_price_band(
        &self,
        start_date: NaiveDateTime,
        end_date: NaiveDateTime,
        config: &BandingConfig,
    ) -> BandingResult<Vec<AggregateRow>> {
        query_sales_by_price_band(&self.conn, start_date, end_date, config)
    }
}

impl SaleSource for SqliteStore {
    fn sales_for_period(
        &self,
        start_date: NaiveDateTime,
        end_date: NaiveDateTime,
    ) -> BandingResult<Vec<SaleFact>> {
        get_sales_for_period(&self.conn, start_date, end_date)
    }
}

impl SalesWriter for SqliteStore {
    fn add_author(&mut self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO author (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn add_genre(&mut self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO genre (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn add_book(
        &mut self,
        title: &str,
        author_id: Option<i64>,
        genre_id: Option<i64>,
        price: Option<i64>,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO book (title, author_id, genre_id, price) VALUES (?1, ?2, ?3, ?4)",
                params![title, author_id, genre_id, price],
            )
            .with_context(|| format!("Failed to insert book {:?}", title))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn add_transaction(&mut self, create_date: NaiveDateTime) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sale_transaction (create_date) VALUES (?1)",
            params![format_date(create_date)],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn add_book_sale(&mut self, book_id: i64, transaction_id: i64) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO book_sale (book_id, transaction_id) VALUES (?1, ?2)",
                params![book_id, transaction_id],
            )
            .with_context(|| {
                format!(
                    "Failed to record sale of book {} in transaction {}",
                    book_id, transaction_id
                )
            })?;
        Ok(self.conn.last_insert_rowid())
    }
}

// ============================================================================
// QUERIES
// ============================================================================

pub fn get_genres(conn: &Connection) -> Result<Vec<Genre>> {
    let mut stmt = conn.prepare("SELECT id, name FROM genre ORDER BY id")?;

    let genres = stmt
        .query_map([], |row| {
            Ok(Genre {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(genres)
}

pub fn find_genre_by_name(conn: &Connection, name: &str) -> Result<Option<Genre>> {
    let genre = conn
        .query_row(
            "SELECT id, name FROM genre WHERE name = ?1 ORDER BY id LIMIT 1",
            params![name],
            |row| {
                Ok(Genre {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;

    Ok(genre)
}

fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;

    Ok(count)
}

/// Sales joined with book price, genre and transaction date, inclusive range
const SALES_FOR_PERIOD_SQL: &str = "
    SELECT bs.book_id, b.price, b.genre_id, t.id AS transaction_id, t.create_date
    FROM book_sale bs
    JOIN book b ON b.id = bs.book_id
    JOIN genre g ON g.id = b.genre_id
    JOIN sale_transaction t ON t.id = bs.transaction_id
    WHERE b.price IS NOT NULL
      AND t.create_date BETWEEN ?1 AND ?2";

pub fn get_sales_for_period(
    conn: &Connection,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
) -> BandingResult<Vec<SaleFact>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY bs.id", SALES_FOR_PERIOD_SQL))?;

    let raw = stmt
        .query_map(
            params![format_date(start_date), format_date(end_date)],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let facts = raw
        .into_iter()
        .map(|(book_id, price, genre_id, transaction_id, date)| {
            Ok(SaleFact {
                book_id,
                price,
                genre_id,
                transaction_id,
                transaction_date: parse_date(&date)?,
            })
        })
        .collect::<BandingResult<Vec<_>>>()?;

    debug!("loaded {} sale facts from sqlite", facts.len());
    Ok(facts)
}

/// The banding pipeline composed as chained CTEs
///
/// Parameters: ?1 start, ?2 end, ?3 rounding unit, ?4 max band count.
/// SQLite's two-argument MAX/MIN are the scalar greatest/least; both yield
/// NULL for an empty period, which leaves the band series empty.
const SALES_BY_PRICE_BAND_SQL_TAIL: &str = "
    max_price AS (
        SELECT MAX(price) AS max_price FROM sales
    ),
    incr AS (
        SELECT MAX((max_price + (?3 * ?4 - 1)) / ?3 / ?4 * ?3, ?3) AS incr
        FROM max_price
    ),
    series(num) AS (
        SELECT 1 WHERE (SELECT max_price FROM max_price) > 0
        UNION ALL
        SELECT num + 1 FROM series
        WHERE num < MIN(
            ((SELECT max_price FROM max_price) + (SELECT incr FROM incr) - 1) / (SELECT incr FROM incr),
            ?4)
    ),
    price_bands AS (
        SELECT series.num AS num,
               (series.num - 1) * incr.incr + 1 AS from_price,
               series.num * incr.incr AS to_price
        FROM series, incr
    ),
    sales_in_bands AS (
        SELECT sales.*, pb.num AS price_band, pb.from_price, pb.to_price
        FROM sales
        JOIN price_bands pb ON sales.price BETWEEN pb.from_price AND pb.to_price
    )
    SELECT price_band, from_price, to_price, genre_id,
           SUM(price) AS total_value, COUNT(*) AS total_volume
    FROM sales_in_bands
    GROUP BY price_band, from_price, to_price, genre_id
    ORDER BY price_band, genre_id";

pub fn query_sales_by_price_band(
    conn: &Connection,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
    config: &BandingConfig,
) -> BandingResult<Vec<AggregateRow>> {
    config.validate()?;

    let sql = format!(
        "WITH RECURSIVE sales AS ({}), {}",
        SALES_FOR_PERIOD_SQL, SALES_BY_PRICE_BAND_SQL_TAIL
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(
            params![
                format_date(start_date),
                format_date(end_date),
                config.rounding_unit(),
                config.max_num_bands(),
            ],
            |row| {
                Ok(AggregateRow {
                    price_band: row.get(0)?,
                    from_price: row.get(1)?,
                    to_price: row.get(2)?,
                    genre_id: row.get(3)?,
                    total_value: row.get(4)?,
                    total_volume: row.get(5)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
