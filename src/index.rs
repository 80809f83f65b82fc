//! Accumulators for scraped reviews.
//!
//! [`ReviewIndex`] is keyed by movie and grows one movie at a time while scraping.
//! [`ReviewerIndex`] is the same data turned around, keyed by critic.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{MovieId, MovieRecord};
use crate::score::Score;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub critic_name: String,
    pub source: String,
    pub score: Option<Score>,
    pub original_link: Option<String>,
}

/// Reviews of one movie, at most one per critic.
pub type ReviewSet = BTreeMap<String, ReviewRecord>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieReviews {
    pub movie: MovieRecord,
    pub reviews: ReviewSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewIndex {
    movies: BTreeMap<MovieId, MovieReviews>,
}

impl ReviewIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the reviews for `movie`, replacing an earlier entry for the same id.
    pub fn insert(&mut self, movie: MovieRecord, reviews: ReviewSet) {
        self.movies.insert(movie.id, MovieReviews { movie, reviews });
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.movies.contains_key(&id)
    }

    pub fn get(&self, id: MovieId) -> Option<&MovieReviews> {
        self.movies.get(&id)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MovieId, &MovieReviews)> {
        self.movies.iter()
    }

    pub fn review_count(&self) -> usize {
        self.movies.values().map(|m| m.reviews.len()).sum()
    }
}

/// One critic's review of one movie, with the movie's catalog data attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewerEntry {
    pub title: String,
    pub year: i32,
    pub genres: BTreeSet<String>,
    pub source: String,
    pub score: Option<Score>,
    pub resolved_url: Option<String>,
    pub original_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewerIndex {
    reviewers: BTreeMap<String, BTreeMap<MovieId, ReviewerEntry>>,
}

impl ReviewerIndex {
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<MovieId, ReviewerEntry>)> {
        self.reviewers.iter()
    }

    pub fn get(&self, critic: &str) -> Option<&BTreeMap<MovieId, ReviewerEntry>> {
        self.reviewers.get(critic)
    }

    pub fn len(&self) -> usize {
        self.reviewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviewers.is_empty()
    }
}

impl From<&ReviewIndex> for ReviewerIndex {
    fn from(index: &ReviewIndex) -> Self {
        let mut reviewers: BTreeMap<String, BTreeMap<MovieId, ReviewerEntry>> = BTreeMap::new();
        for (id, MovieReviews { movie, reviews }) in index.iter() {
            for (critic, review) in reviews {
                let entry = ReviewerEntry {
                    title: movie.title.clone(),
                    year: movie.year,
                    genres: movie.genres.clone(),
                    source: review.source.clone(),
                    score: review.score.clone(),
                    resolved_url: movie.resolved_url.clone(),
                    original_link: review.original_link.clone(),
                };
                reviewers.entry(critic.clone()).or_default().insert(*id, entry);
            }
        }
        Self { reviewers }
    }
}
