use std::path::Path;

use chrono::Local;

use crate::catalog::{Catalog, CatalogError, MovieId, MovieRecord};
use crate::checkpoint::Checkpoint;
use crate::config::{FetchArgs, ScrapeConfig};
use crate::fetch::{Fetch, HttpFetcher};
use crate::index::{ReviewIndex, ReviewSet, ReviewerIndex};
use crate::matrix::{clean_field, write_flat, write_text};
use crate::resolve::resolve;
use crate::reviews::fetch_reviews;
use crate::{info_time, warn_time, Result, PROGRESS_EVERY};

/// A movie that was skipped because resolving it or fetching its reviews failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieError {
    pub id: MovieId,
    pub title: String,
    pub year: i32,
    pub detail: String,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub index: ReviewIndex,
    pub errors: Vec<MovieError>,
    /// Movies scraped during this run.
    pub processed: usize,
    /// Movies skipped because a resumed checkpoint already held them.
    pub resumed: usize,
}

/// Runs the resolve and aggregate steps over a catalog, one movie at a time.
pub struct Scraper<F> {
    fetcher: F,
    config: ScrapeConfig,
    checkpoint: Checkpoint,
}

impl<F: Fetch> Scraper<F> {
    pub fn new(fetcher: F, config: ScrapeConfig) -> Self {
        let checkpoint = Checkpoint::new(config.checkpoint_path.clone());
        Self {
            fetcher,
            config,
            checkpoint,
        }
    }

    /// Scrapes `movies` in order. Failures on one movie are recorded and the batch moves on.
    /// The checkpoint is rewritten every `checkpoint_every` scraped movies and once at the end.
    pub async fn run(&self, movies: &[MovieRecord]) -> Result<ScrapeReport> {
        let start_time = Local::now();
        let mut report = ScrapeReport::default();

        if self.config.resume {
            if let Some(index) = self.checkpoint.load().await? {
                info_time!(
                    "Resuming from {} with {} movies",
                    self.checkpoint.path().display(),
                    index.len()
                );
                report.index = index;
            }
        }

        info_time!("Starting review queries for {} movies", movies.len());
        for movie in movies {
            if report.index.contains(movie.id) {
                report.resumed += 1;
                continue;
            }

            let (scraped, reviews) = match self.scrape_movie(movie).await {
                Ok(done) => done,
                Err(err) => {
                    warn_time!("Movie {} ({} {}) failed: {err}", movie.id, movie.title, movie.year);
                    report.errors.push(MovieError {
                        id: movie.id,
                        title: movie.title.clone(),
                        year: movie.year,
                        detail: err.to_string(),
                    });
                    continue;
                }
            };
            report.index.insert(scraped, reviews);
            report.processed += 1;

            if report.processed % PROGRESS_EVERY == 1 {
                info_time!(start_time, "Processed {} movies...", report.processed);
            }
            if report.processed % self.config.checkpoint_every.max(1) == 0 {
                self.checkpoint.save(&report.index).await?;
            }
        }
        self.checkpoint.save(&report.index).await?;

        info_time!(
            start_time,
            "Done! Processed {} movies. Errored on {} movies",
            report.processed,
            report.errors.len()
        );
        Ok(report)
    }

    async fn scrape_movie(&self, movie: &MovieRecord) -> Result<(MovieRecord, ReviewSet)> {
        let url = resolve(&self.fetcher, &self.config.site_url, &movie.title, movie.year).await?;
        let movie = MovieRecord {
            resolved_url: url,
            ..movie.clone()
        };
        let reviews = fetch_reviews(&self.fetcher, movie.resolved_url.as_deref()).await?;
        Ok((movie, reviews))
    }
}

/// Full `fetch-reviews` run: load the catalog, scrape it over HTTP and write the results.
pub async fn process_catalog(args: &FetchArgs) -> Result<ScrapeReport> {
    let start_time = Local::now();

    info_time!("Loading {}...", args.input_file.display());
    let catalog = Catalog::load(&args.input_file).await?;
    info_time!(
        start_time,
        "Loaded {} movies ({} rows skipped)",
        catalog.movies.len(),
        catalog.errors.len()
    );

    let config = ScrapeConfig::from(args);
    let fetcher = HttpFetcher::new(config.timeout)?;
    let report = Scraper::new(fetcher, config).run(&catalog.movies).await?;

    for err in &catalog.errors {
        warn_time!("Catalog line {} skipped: {} ({})", err.line, err.reason, err.raw);
    }
    for err in &report.errors {
        warn_time!("Movie {} skipped: {}", err.id, err.detail);
    }

    let write_time = Local::now();
    let reviewers = ReviewerIndex::from(&report.index);
    write_flat(&args.output_file, &reviewers).await?;
    info_time!(
        write_time,
        "Wrote {} reviews by {} reviewers to {}",
        report.index.review_count(),
        reviewers.len(),
        args.output_file.display()
    );

    if let Some(error_file) = &args.error_file {
        write_errors(error_file, &catalog.errors, &report.errors).await?;
        info_time!("Wrote errors to {}", error_file.display());
    }

    Ok(report)
}

/// Writes skipped catalog rows and failed movies as tab-separated lines.
pub async fn write_errors(
    path: impl AsRef<Path>,
    catalog_errors: &[CatalogError],
    movie_errors: &[MovieError],
) -> Result<()> {
    let mut out = String::from("kind\tkey\titem\tdetail\n");
    for err in catalog_errors {
        out.push_str(&format!(
            "catalog\t{}\t{}\t{}\n",
            err.line,
            clean_field(&err.raw),
            clean_field(&err.reason)
        ));
    }
    for err in movie_errors {
        out.push_str(&format!(
            "movie\t{}\t{} ({})\t{}\n",
            err.id,
            clean_field(&err.title),
            err.year,
            clean_field(&err.detail)
        ));
    }
    write_text(path, &out).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;
    use crate::resolve::search_url;
    use std::collections::BTreeSet;

    const SITE: &str = "http://site.test";

    fn movie(id: MovieId, title: &str, year: i32) -> MovieRecord {
        MovieRecord {
            id,
            title: title.to_string(),
            year,
            genres: BTreeSet::new(),
            resolved_url: None,
        }
    }

    fn detail_redirect(fetcher: StaticFetcher, title: &str, slug: &str, critic: &str) -> StaticFetcher {
        fetcher
            .redirect(
                search_url(SITE, title),
                format!("{SITE}/m/{slug}/"),
                "<html><head><title>Movie</title></head></html>",
            )
            .page(
                format!("{SITE}/m/{slug}/reviews/?page=1&sort="),
                format!(
                    r#"<div class="row review_table_row">
                        <div class="critic_name"><a href="/c/">{critic}</a><em>Planet</em></div>
                        <div class="small subtle">Original Score: 4/5</div></div>"#
                ),
            )
    }

    fn config(dir: &Path, every: usize, resume: bool) -> ScrapeConfig {
        ScrapeConfig {
            site_url: SITE.to_string(),
            checkpoint_path: dir.join("checkpoint.json"),
            checkpoint_every: every,
            resume,
            timeout: None,
        }
    }

    #[tokio::test]
    async fn failed_movies_are_recorded_and_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fetcher = detail_redirect(StaticFetcher::new(), "Heat", "heat", "Jane Doe");
        let movies = [movie(1, "Heat", 1995), movie(2, "Missing", 2000)];

        let report = Scraper::new(fetcher, config(dir.path(), 3, false))
            .run(&movies)
            .await
            .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].id, 2);

        let heat = report.index.get(1).expect("heat indexed");
        assert_eq!(
            heat.movie.resolved_url.as_deref(),
            Some("http://site.test/m/heat/reviews")
        );
        assert!(heat.reviews.contains_key("Jane Doe"));
        assert!(!report.index.contains(2));
    }

    #[tokio::test]
    async fn checkpoint_is_written_and_resume_skips_saved_movies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fetcher = detail_redirect(StaticFetcher::new(), "Heat", "heat", "Jane Doe");
        Scraper::new(fetcher, config(dir.path(), 1, false))
            .run(&[movie(1, "Heat", 1995)])
            .await
            .unwrap();

        let saved = Checkpoint::new(dir.path().join("checkpoint.json"))
            .load()
            .await
            .unwrap()
            .expect("checkpoint written");
        assert!(saved.contains(1));

        // Heat's pages are gone, so only a resumed run can succeed on it.
        let fetcher = detail_redirect(StaticFetcher::new(), "Ronin", "ronin", "Sam Roe");
        let movies = [movie(1, "Heat", 1995), movie(2, "Ronin", 1998)];
        let report = Scraper::new(fetcher, config(dir.path(), 5, true))
            .run(&movies)
            .await
            .unwrap();

        assert_eq!(report.resumed, 1);
        assert_eq!(report.processed, 1);
        assert!(report.errors.is_empty());
        assert_eq!(report.index.len(), 2);
    }

    #[tokio::test]
    async fn unresolved_movie_is_stored_without_reviews() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fetcher = StaticFetcher::new().page(
            search_url(SITE, "Obscure"),
            r#"<html><head><title>Search Results</title></head>
               <body><h1 class="center noresults">none</h1></body></html>"#,
        );

        let report = Scraper::new(fetcher, config(dir.path(), 3, false))
            .run(&[movie(8, "Obscure", 1960)])
            .await
            .unwrap();

        let entry = report.index.get(8).expect("stored");
        assert_eq!(entry.movie.resolved_url, None);
        assert!(entry.reviews.is_empty());
    }

    #[tokio::test]
    async fn error_file_lists_both_kinds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("errors.tsv");
        let catalog_errors = [CatalogError {
            line: 4,
            raw: "x,y".into(),
            reason: "expected 3 fields, found 2".into(),
        }];
        let movie_errors = [MovieError {
            id: 2,
            title: "Heat".into(),
            year: 1995,
            detail: "Request to http://a failed with status 503".into(),
        }];

        write_errors(&path, &catalog_errors, &movie_errors).await.unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            text,
            "kind\tkey\titem\tdetail\n\
             catalog\t4\tx,y\texpected 3 fields, found 2\n\
             movie\t2\tHeat (1995)\tRequest to http://a failed with status 503\n"
        );
    }
}
