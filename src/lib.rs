//! Critic review scraper.
//!
//! Resolves each movie of a catalog to its reviews page on the review site, collects one review
//! per critic, and writes the results either as a flat reviewer/movie table or as a wide
//! reviewer by movie score matrix.

mod error;
mod macros;

pub mod catalog;
pub mod checkpoint;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod index;
pub mod matrix;
pub mod process;
pub mod resolve;
pub mod reviews;
pub mod score;

pub use error::{Error, Result};

const SITE_URL: &str = "http://www.rottentomatoes.com";
const SEARCH_PATH: &str = "/search/?search=";
const REVIEWS_SEGMENT: &str = "reviews";
/// Review listing pages requested per movie. There is no last-page detection.
pub const REVIEW_PAGE_LIMIT: usize = 19;
const CHECKPOINT_FILE: &str = "recent_reviews.json";
const CHECKPOINT_EVERY: u32 = 3;
const PROGRESS_EVERY: usize = 20;
