use url::Url;

use crate::extract::{extract_search, SearchPage};
use crate::fetch::Fetch;
use crate::{info_time, Error, Result, REVIEWS_SEGMENT, SEARCH_PATH};

/// Characters dropped from titles before searching. Parentheses and apostrophes survive.
const STRIPPED_PUNCTUATION: &str = "!\"#$%&*+,-./:;<=>?@[\\]^_`{|}~";

/// Builds the search URL for a title: punctuation stripped, lower-cased, non-ASCII
/// characters percent-encoded, words joined with `+`.
pub fn search_url(site_url: &str, title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(*c))
        .flat_map(char::to_lowercase)
        .collect();

    let query = cleaned
        .split_whitespace()
        .map(encode_non_ascii)
        .collect::<Vec<_>>()
        .join("+");

    format!("{}{SEARCH_PATH}{query}", site_url.trim_end_matches('/'))
}

fn encode_non_ascii(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for c in word.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(&urlencoding::encode(c.encode_utf8(&mut [0; 4])));
        }
    }
    out
}

/// Finds the critic reviews URL for a movie, or `None` when the site has no matching entry.
///
/// On a result listing the first candidate released in exactly `year` wins. When the search
/// redirects straight to a movie page, that page is taken as is.
pub async fn resolve<F: Fetch>(
    fetcher: &F,
    site_url: &str,
    title: &str,
    year: i32,
) -> Result<Option<String>> {
    let site = Url::parse(site_url)?;
    let page = fetcher.fetch(&search_url(site_url, title)).await?;
    let page_url = page.url;

    let movie_url = match extract_search(page.html).await? {
        SearchPage::NoResults => None,
        SearchPage::Results(candidates) => candidates
            .into_iter()
            .filter(|c| c.year == Some(year))
            .find_map(|c| c.href)
            .map(|href| site.join(&href))
            .transpose()?,
        SearchPage::Detail => {
            let mut url = Url::parse(&page_url)?;
            url.set_query(None);
            url.set_fragment(None);
            Some(url)
        }
    };

    match movie_url {
        Some(url) => Ok(Some(reviews_url(url)?.to_string())),
        None => {
            info_time!("No search match for {title} ({year})");
            Ok(None)
        }
    }
}

fn reviews_url(mut movie_url: Url) -> Result<Url> {
    if movie_url.cannot_be_a_base() {
        return Err(Error::UrlNotABase(movie_url.to_string()));
    }
    if let Ok(mut segments) = movie_url.path_segments_mut() {
        segments.pop_if_empty().push(REVIEWS_SEGMENT);
    }
    Ok(movie_url)
}
