// 📚 Book, Author and Genre records

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// A title for sale
///
/// Author, genre and price are all optional in the shop's data. A book with
/// no genre or no price never shows up in price band reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author_id: Option<i64>,
    pub genre_id: Option<i64>,
    /// Price in minor currency units (pence)
    pub price: Option<i64>,
}

impl Book {
    /// True when the book carries everything a sale fact needs
    pub fn is_reportable(&self) -> bool {
        self.genre_id.is_some() && self.price.is_some()
    }
}
