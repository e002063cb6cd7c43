// 📝 Report formatting - text and CSV renditions of aggregate rows
//
// Rows carry genre ids only. Names are resolved through a lookup table
// supplied by the caller.

use crate::aggregation::AggregateRow;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;

/// Genre name for display, falling back to the id
pub fn genre_label(genres: &HashMap<i64, String>, genre_id: i64) -> String {
    genres
        .get(&genre_id)
        .cloned()
        .unwrap_or_else(|| format!("Genre #{}", genre_id))
}

/// Plain text report grouped by band
///
/// Expects rows in (price_band, genre_id) order, as the pipeline returns them.
pub fn render_text(rows: &[AggregateRow], genres: &HashMap<i64, String>) -> String {
    let mut out = String::new();
    let mut last_band = None;

    for row in rows {
        if last_band != Some(row.price_band) {
            last_band = Some(row.price_band);
            let _ = write!(
                out,
                "\n\nBand {} - books from {}p to {}p",
                row.price_band, row.from_price, row.to_price
            );
        }
        let _ = write!(
            out,
            "\n{}:\n  Value: {}p\n  Volume: {}",
            genre_label(genres, row.genre_id),
            row.total_value,
            row.total_volume
        );
    }

    out
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    price_band: i64,
    from_price: i64,
    to_price: i64,
    genre_id: i64,
    genre: &'a str,
    total_value: i64,
    total_volume: i64,
}

/// Write rows as CSV with a header line
pub fn write_csv<W: Write>(
    rows: &[AggregateRow],
    genres: &HashMap<i64, String>,
    writer: W,
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    for row in rows {
        let genre = genre_label(genres, row.genre_id);
        wtr.serialize(CsvRow {
            price_band: row.price_band,
            from_price: row.from_price,
            to_price: row.to_price,
            genre_id: row.genre_id,
            genre: &genre,
            total_value: row.total_value,
            total_volume: row.total_volume,
        })
        .context("Failed to write CSV row")?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}
