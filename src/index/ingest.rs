use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{Catalog, MovieRecord},
};

/// Source columns required to build a catalog, after header normalization
pub const REQUIRED_COLUMNS: [&str; 3] = ["title", "genre", "desc"];

/// Cell values treated as missing, matching the usual dataframe NA markers
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(value: &str) -> bool {
    NA_VALUES.contains(&value)
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Reads a CSV file into a catalog
///
/// Headers are trimmed and lowercased before matching `title`, `genre` and
/// `desc`. Rows missing any of the three values are dropped, and surviving
/// rows are indexed contiguously in file order.
pub fn read_catalog<P: AsRef<Path>>(path: P) -> AppResult<Catalog> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let catalog = read_catalog_from_reader(file)?;

    tracing::info!(
        path = %path.display(),
        movies = catalog.len(),
        "Loaded source catalog"
    );

    Ok(catalog)
}

/// Same as [`read_catalog`], over any reader
pub fn read_catalog_from_reader<R: Read>(reader: R) -> AppResult<Catalog> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();

    let mut positions = [0usize; 3];
    let mut missing = Vec::new();
    for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
        match headers.iter().position(|h| h == column) {
            Some(pos) => *slot = pos,
            None => missing.push(column.to_string()),
        }
    }
    if !missing.is_empty() {
        tracing::error!(columns = ?headers, missing = ?missing, "Source is missing required columns");
        return Err(AppError::MissingColumns(missing));
    }
    let [title_col, genre_col, desc_col] = positions;

    let mut movies = Vec::new();
    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record?;
        let field = |col: usize| record.get(col).filter(|value| !is_missing(value));

        match (field(title_col), field(genre_col), field(desc_col)) {
            (Some(title), Some(genre), Some(desc)) => {
                movies.push(MovieRecord::new(title, genre, desc));
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, kept = movies.len(), "Dropped rows with missing values");
    }

    Ok(Catalog::new(movies))
}
