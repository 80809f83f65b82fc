//! Tabular output of scraped reviews.
//!
//! The flat form has one row per reviewer and movie. The wide form has one row per reviewer and
//! one column per movie, ordered by movie id, with `NA` where a reviewer has no review.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tokio::{fs::File, io::AsyncWriteExt};

use crate::catalog::MovieId;
use crate::index::ReviewerIndex;
use crate::{Error, Result};

pub const FLAT_HEADER: [&str; 9] = [
    "name",
    "movie id",
    "title",
    "year",
    "genres",
    "source",
    "score",
    "url",
    "original link",
];
pub const MISSING: &str = "NA";

const NAME_COLUMN: usize = 0;
const ID_COLUMN: usize = 1;
const TITLE_COLUMN: usize = 2;
const SCORE_COLUMN: usize = 6;

/// Renders the flat table, header included.
pub fn render_flat(reviewers: &ReviewerIndex) -> String {
    let mut out = FLAT_HEADER.join("\t");
    out.push('\n');

    for (name, movies) in reviewers.iter() {
        for (id, entry) in movies {
            let genres = entry
                .genres
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("|");
            let row = [
                clean_field(name),
                id.to_string(),
                clean_field(&entry.title),
                entry.year.to_string(),
                clean_field(&genres),
                clean_field(&entry.source),
                entry.score.as_ref().map(|s| clean_field(&s.to_string())).unwrap_or_default(),
                entry.resolved_url.as_deref().map(clean_field).unwrap_or_default(),
                entry.original_link.as_deref().map(clean_field).unwrap_or_default(),
            ];
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
    }
    out
}

/// Reviewer scores keyed by movie, plus the title of every movie seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreTable {
    titles: BTreeMap<MovieId, String>,
    /// Reviewers in order of first appearance.
    reviewers: Vec<(String, BTreeMap<MovieId, String>)>,
    positions: HashMap<String, usize>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `reviewer`'s score for a movie. Later calls overwrite the score and the title.
    pub fn insert(&mut self, reviewer: &str, id: MovieId, title: &str, score: &str) {
        self.titles.insert(id, title.to_string());
        let pos = match self.positions.get(reviewer) {
            Some(&pos) => pos,
            None => {
                self.reviewers.push((reviewer.to_string(), BTreeMap::new()));
                self.positions.insert(reviewer.to_string(), self.reviewers.len() - 1);
                self.reviewers.len() - 1
            }
        };
        self.reviewers[pos].1.insert(id, score.to_string());
    }

    /// Reads a flat table. A leading header row is skipped.
    pub fn parse_flat(text: &str) -> Result<Self> {
        let mut table = Self::new();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if idx == 0 && fields.get(ID_COLUMN) == Some(&FLAT_HEADER[ID_COLUMN]) {
                continue;
            }
            if fields.len() <= SCORE_COLUMN {
                return Err(Error::ReviewsRow {
                    line: line_no,
                    reason: format!(
                        "expected at least {} fields, found {}",
                        SCORE_COLUMN + 1,
                        fields.len()
                    ),
                });
            }
            let id = fields[ID_COLUMN]
                .trim()
                .parse()
                .map_err(|_| Error::ReviewsRow {
                    line: line_no,
                    reason: format!("movie id `{}` is not an integer", fields[ID_COLUMN]),
                })?;
            table.insert(
                fields[NAME_COLUMN],
                id,
                fields[TITLE_COLUMN],
                fields[SCORE_COLUMN],
            );
        }
        Ok(table)
    }

    pub fn movie_ids(&self) -> impl Iterator<Item = MovieId> + '_ {
        self.titles.keys().copied()
    }

    pub fn reviewer_count(&self) -> usize {
        self.reviewers.len()
    }

    /// Renders the wide matrix, header included.
    pub fn render_wide(&self) -> String {
        let mut header = vec!["reviewer"];
        header.extend(self.titles.values().map(String::as_str));
        let mut out = header.join("\t");
        out.push('\n');

        for (name, scores) in &self.reviewers {
            let mut row = vec![name.as_str()];
            row.extend(
                self.titles
                    .keys()
                    .map(|id| scores.get(id).map_or(MISSING, String::as_str)),
            );
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out
    }
}

impl From<&ReviewerIndex> for ScoreTable {
    fn from(reviewers: &ReviewerIndex) -> Self {
        let mut table = Self::new();
        for (name, movies) in reviewers.iter() {
            for (id, entry) in movies {
                let score = entry.score.as_ref().map(|s| s.to_string()).unwrap_or_default();
                table.insert(name, *id, &entry.title, &score);
            }
        }
        table
    }
}

pub async fn write_flat(path: impl AsRef<Path>, reviewers: &ReviewerIndex) -> Result<()> {
    write_text(path, &render_flat(reviewers)).await
}

/// Reads a flat table from `input` and writes its wide matrix to `output`.
pub async fn pivot_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<ScoreTable> {
    let text = tokio::fs::read_to_string(input).await?;
    let table = ScoreTable::parse_flat(&text)?;
    write_text(output, &table.render_wide()).await?;
    Ok(table)
}

pub(crate) async fn write_text(path: impl AsRef<Path>, text: &str) -> Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Tabs and line breaks would shift columns, so they become spaces.
pub(crate) fn clean_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}
