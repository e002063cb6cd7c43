// 🧾 Sale transactions and the books sold in them

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One checkout. Holds one or more BookSale rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTransaction {
    pub id: i64,
    pub create_date: NaiveDateTime,
}

/// One copy of a book sold within a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSale {
    pub id: i64,
    pub book_id: i64,
    pub transaction_id: i64,
}
