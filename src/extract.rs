//! Markup extraction for the review site.
//!
//! Everything that knows about the site's class names lives here. The rest of the crate only
//! sees [`SearchPage`] and [`ReviewRecord`] values.

use scraper::{ElementRef, Html, Selector};
use tokio::task::spawn_blocking;

use crate::index::ReviewRecord;
use crate::score::normalize;
use crate::{Error, Result};

const SCORE_LABEL: &str = "Original Score:";

/// What a search request landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPage {
    NoResults,
    /// A result listing, candidates in listed order.
    Results(Vec<Candidate>),
    /// The site redirected straight to a movie page.
    Detail,
}

/// One entry of a search result listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: Option<String>,
    /// `None` when the displayed year is missing or not a number.
    pub year: Option<i32>,
    /// Link as it appears in the markup, usually site-relative.
    pub href: Option<String>,
}

/// Parses a search response on the blocking pool.
pub async fn extract_search(html: String) -> Result<SearchPage> {
    spawn_blocking(move || parse_search_page(&html)).await?
}

/// Parses one review listing page on the blocking pool.
pub async fn extract_reviews(html: String) -> Result<Vec<ReviewRecord>> {
    spawn_blocking(move || parse_review_page(&html)).await?
}

pub fn parse_search_page(html: &str) -> Result<SearchPage> {
    let doc = Html::parse_document(html);

    let no_results_selector = create_selector(r#"h1[class="center noresults"]"#)?;
    if doc.select(&no_results_selector).next().is_some() {
        return Ok(SearchPage::NoResults);
    }

    let title_selector = create_selector("title")?;
    let title = doc
        .select(&title_selector)
        .next()
        .map(text_of)
        .ok_or(Error::ParseMissingElement("title"))?;
    if !title.to_lowercase().contains("search results") {
        return Ok(SearchPage::Detail);
    }

    let result_selector = create_selector(r#"li[class="media bottom_divider clearfix"]"#)?;
    let year_selector = create_selector(r#"span[class="movie_year"]"#)?;
    let link_selector = create_selector("a")?;
    let heading_selector = create_selector(r#"div[class="nomargin media-heading bold"] a"#)?;

    let candidates = doc
        .select(&result_selector)
        .map(|item| Candidate {
            title: item.select(&heading_selector).next().map(text_of),
            year: item
                .select(&year_selector)
                .next()
                .and_then(|span| parse_year(&text_of(span))),
            href: item
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string),
        })
        .collect();

    Ok(SearchPage::Results(candidates))
}

pub fn parse_review_page(html: &str) -> Result<Vec<ReviewRecord>> {
    let doc = Html::parse_document(html);

    let review_selector = create_selector(r#"div[class="row review_table_row"]"#)?;
    let critic_selector = create_selector(r#"div[class="critic_name"]"#)?;
    let source_selector = create_selector("em")?;
    let link_selector = create_selector("a")?;
    let meta_selector = create_selector(r#"div[class="small subtle"]"#)?;

    // A listing page holds at most 20 reviews.
    let mut reviews = Vec::with_capacity(20);
    for block in doc.select(&review_selector) {
        let byline = block
            .select(&critic_selector)
            .next()
            .ok_or(Error::ParseMissingElement("critic_name"))?;
        let meta = block
            .select(&meta_selector)
            .next()
            .ok_or(Error::ParseMissingElement("small subtle"))?;

        let source = byline
            .select(&source_selector)
            .next()
            .map(text_of)
            .ok_or(Error::ParseMissingElement("critic_name em"))?;
        let critic_name = byline
            .select(&link_selector)
            .next()
            .map(text_of)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| source.clone());

        let original_link = meta
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string);
        let meta_text = text_of(meta);
        let raw_score = meta_text
            .split_once(SCORE_LABEL)
            .map(|(_, score)| score.trim());

        reviews.push(ReviewRecord {
            critic_name,
            source,
            score: normalize(raw_score),
            original_link,
        });
    }
    Ok(reviews)
}

/// Reads `2005` out of a displayed year such as `(2005)`.
fn parse_year(text: &str) -> Option<i32> {
    let digits: String = text.trim().chars().skip(1).take(4).collect();
    if digits.len() != 4 {
        return None;
    }
    digits.parse().ok()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseInvalidSelector(sel_str.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Score;

    #[test]
    fn no_results_page() {
        let html = r#"<html><head><title>Search Results</title></head>
            <body><h1 class="center noresults">Sorry, no results found</h1></body></html>"#;
        assert_eq!(parse_search_page(html).unwrap(), SearchPage::NoResults);
    }

    #[test]
    fn detail_page_when_title_is_not_a_listing() {
        let html = "<html><head><title>Heat (1995) - Reviews</title></head><body></body></html>";
        assert_eq!(parse_search_page(html).unwrap(), SearchPage::Detail);
    }

    #[test]
    fn page_without_title_is_an_error() {
        let html = "<html><body><p>Service unavailable</p></body></html>";
        assert!(matches!(
            parse_search_page(html),
            Err(Error::ParseMissingElement("title"))
        ));
    }

    #[test]
    fn listing_candidates_keep_order_and_tolerate_bad_years() {
        let html = r#"<html><head><title>Search Results for heat</title></head><body><ul>
            <li class="media bottom_divider clearfix">
              <div class="nomargin media-heading bold"><a href="/m/heat_1995/">Heat</a></div>
              <span class="movie_year"> (1995)</span>
            </li>
            <li class="media bottom_divider clearfix">
              <div class="nomargin media-heading bold"><a href="/m/heat_tba/">Heat</a></div>
              <span class="movie_year">(TBA)</span>
            </li>
            <li class="media bottom_divider clearfix">
              <a href="/m/heat_x/">Heat</a>
            </li>
            </ul></body></html>"#;

        let SearchPage::Results(candidates) = parse_search_page(html).unwrap() else {
            panic!("expected a listing");
        };
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].year, Some(1995));
        assert_eq!(candidates[0].href.as_deref(), Some("/m/heat_1995/"));
        assert_eq!(candidates[0].title.as_deref(), Some("Heat"));
        assert_eq!(candidates[1].year, None);
        assert_eq!(candidates[2].year, None);
        assert_eq!(candidates[2].title, None);
    }

    #[test]
    fn review_blocks_fall_back_to_publication_name() {
        let html = r#"<html><body>
            <div class="row review_table_row">
              <div class="critic_name"><a href="/critic/jane-doe/">Jane Doe</a><br><em>Daily Planet</em></div>
              <div class="small subtle"><a href="http://planet.example/heat">Full Review</a> | Original Score: 3/4</div>
            </div>
            <div class="row review_table_row">
              <div class="critic_name"><em>Gazette</em></div>
              <div class="small subtle">Full Review (Not available) | Original Score: B+</div>
            </div>
            <div class="row review_table_row">
              <div class="critic_name"><a href="/critic/sam/">Sam Roe</a><em>Herald</em></div>
              <div class="small subtle"><a href="http://herald.example/heat">Full Review</a></div>
            </div>
            </body></html>"#;

        let reviews = parse_review_page(html).unwrap();
        assert_eq!(reviews.len(), 3);

        assert_eq!(reviews[0].critic_name, "Jane Doe");
        assert_eq!(reviews[0].source, "Daily Planet");
        assert_eq!(reviews[0].score, Some(Score::Value(0.75)));
        assert_eq!(
            reviews[0].original_link.as_deref(),
            Some("http://planet.example/heat")
        );

        assert_eq!(reviews[1].critic_name, "Gazette");
        assert_eq!(reviews[1].score, Some(Score::Value(0.7)));
        assert_eq!(reviews[1].original_link, None);

        assert_eq!(reviews[2].critic_name, "Sam Roe");
        assert_eq!(reviews[2].score, None);
    }

    #[test]
    fn review_block_without_byline_is_an_error() {
        let html = r#"<div class="row review_table_row"><div class="small subtle"></div></div>"#;
        assert!(matches!(
            parse_review_page(html),
            Err(Error::ParseMissingElement("critic_name"))
        ));
    }

    #[test]
    fn parse_year_reads_parenthesised_year() {
        assert_eq!(parse_year("(2005)"), Some(2005));
        assert_eq!(parse_year(" (2005) "), Some(2005));
        assert_eq!(parse_year("()"), None);
        assert_eq!(parse_year(""), None);
    }
}
