// Sales by Price Band - Core Library
// Exposes the banding pipeline, its stores and formatters for the CLI, the
// API server and tests

pub mod config;
pub mod error;
pub mod entities;
pub mod period;
pub mod banding;
pub mod aggregation;
pub mod pipeline;
pub mod db;
pub mod seed;
pub mod report;

// Re-export commonly used types
pub use config::{AppConfig, BandingConfig};
pub use error::BandingError;
pub use entities::{Author, Book, BookSale, Catalog, Genre, SaleTransaction, SalesWriter};
pub use period::{filter_period, max_price, parse_period_bound, SaleFact, SaleSource};
pub use banding::{bands_for_max_price, compute_increment, generate_bands, PriceBand};
pub use aggregation::{
    aggregate, assign_bands, find_band, AggregateKey, AggregateRow, BandAssignment, BandedSale,
};
pub use pipeline::{build_report, compute_sales_by_price_band, PriceBandReport};
pub use db::{query_sales_by_price_band, setup_database, SqliteStore};
pub use seed::{create_dummy_sales, SeedSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
