use url::Url;

use crate::extract::extract_reviews;
use crate::fetch::Fetch;
use crate::index::ReviewSet;
use crate::{info_time, warn_time, Result, REVIEW_PAGE_LIMIT};

/// Collects every critic review listed under `url`, one record per critic.
///
/// Pages `1..=REVIEW_PAGE_LIMIT` are requested in order. A failed page request ends the
/// listing early and is not an error. When a critic shows up more than once the last
/// occurrence wins.
pub async fn fetch_reviews<F: Fetch>(fetcher: &F, url: Option<&str>) -> Result<ReviewSet> {
    let mut reviews = ReviewSet::new();
    let Some(url) = url else {
        return Ok(reviews);
    };

    let mut base = Url::parse(url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    for page_num in 1..=REVIEW_PAGE_LIMIT {
        let page = match fetcher.fetch(&page_url(&base, page_num)).await {
            Ok(page) => page,
            Err(err) => {
                info_time!("Stopping at page {page_num} of {base}: {err}");
                break;
            }
        };

        for review in extract_reviews(page.html).await? {
            if review.score.as_ref().is_some_and(|s| s.is_out_of_range()) {
                warn_time!(
                    "Score out of range for {} on {base}: {}",
                    review.critic_name,
                    review.score.as_ref().map(|s| s.to_string()).unwrap_or_default()
                );
            }
            reviews.insert(review.critic_name.clone(), review);
        }
    }

    Ok(reviews)
}

fn page_url(base: &Url, page_num: usize) -> String {
    let mut url = base.clone();
    url.set_query(Some(&format!("page={page_num}&sort=")));
    url.into()
}
