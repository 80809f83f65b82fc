//! Movie catalog loading.
//!
//! The catalog is a comma-separated file with a header row and the columns
//! `movieId,title,genres`, where the title carries the release year as a ` (YYYY)` suffix and
//! genres are pipe-separated. Titles containing commas are double-quoted.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub type MovieId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    pub year: i32,
    pub genres: BTreeSet<String>,
    /// Reviews URL, attached once the movie has been resolved.
    pub resolved_url: Option<String>,
}

/// A catalog line that could not be turned into a [`MovieRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogError {
    pub line: usize,
    pub raw: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Catalog {
    /// Movies in file order.
    pub movies: Vec<MovieRecord>,
    pub errors: Vec<CatalogError>,
}

impl Catalog {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(Self::parse(&text))
    }

    /// Parses catalog text. Malformed rows and duplicate ids are collected in `errors` and skipped.
    pub fn parse(text: &str) -> Self {
        let mut catalog = Catalog::default();
        let mut seen = HashSet::new();

        // Line numbers are 1-based and the header is line 1.
        for (idx, line) in text.lines().enumerate().skip(1) {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            match parse_row(line_no, line) {
                Ok(movie) if !seen.insert(movie.id) => catalog.errors.push(CatalogError {
                    line: line_no,
                    raw: line.to_string(),
                    reason: format!("duplicate movie id {}", movie.id),
                }),
                Ok(movie) => catalog.movies.push(movie),
                Err(err) => catalog.errors.push(CatalogError {
                    line: line_no,
                    raw: line.to_string(),
                    reason: err.to_string(),
                }),
            }
        }
        catalog
    }
}

fn parse_row(line_no: usize, line: &str) -> Result<MovieRecord> {
    let bad = |reason: &str| Error::CatalogRow {
        line: line_no,
        reason: reason.to_string(),
    };

    let fields = split_record(line);
    let [id, title, genres] = fields.as_slice() else {
        return Err(bad(&format!("expected 3 fields, found {}", fields.len())));
    };
    let id = id.trim().parse().map_err(|_| bad("movie id is not an integer"))?;
    let (title, year) = split_title(title).ok_or_else(|| bad("title has no (YYYY) suffix"))?;
    let genres = genres
        .split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect();

    Ok(MovieRecord {
        id,
        title,
        year,
        genres,
        resolved_url: None,
    })
}

/// Splits `"Heat (1995)"` into `("Heat", 1995)`.
pub fn split_title(raw: &str) -> Option<(String, i32)> {
    let raw = raw.trim();
    let rest = raw.strip_suffix(')')?;
    let (title, year) = rest.rsplit_once('(')?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let title = title.trim_end();
    if title.is_empty() {
        return None;
    }
    Some((title.to_string(), year.parse().ok()?))
}

/// Splits one comma-separated line, honouring double quotes and `""` escapes.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::with_capacity(3);
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
