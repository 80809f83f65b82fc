use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;

use crate::{Error, Result};

/// A fetched page: the final URL after redirects and its HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub html: String,
}

/// Page transport used by the resolver and the review aggregator.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<Page>;
}

/// Fetches pages over HTTP. Non-success statuses are errors.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl From<Client> for HttpFetcher {
    fn from(client: Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Page> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let url = res.url().to_string();
        let html = res.text().await?;
        Ok(Page { url, html })
    }
}

/// Serves captured pages from memory, for offline runs against saved HTML.
/// Unknown URLs fail the same way a missing remote page would.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Page>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` for `url`.
    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        let page = Page {
            url: url.clone(),
            html: html.into(),
        };
        self.pages.insert(url, page);
        self
    }

    /// Serves `html` for `url` as if the request had been redirected to `final_url`.
    pub fn redirect(
        mut self,
        url: impl Into<String>,
        final_url: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        let page = Page {
            url: final_url.into(),
            html: html.into(),
        };
        self.pages.insert(url.into(), page);
        self
    }
}

impl Fetch for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Page> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::PageNotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::reviews::fetch_reviews;

    fn response(status: &str, headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n{headers}\r\n{body}",
            body.len()
        )
    }

    fn review_page(critic: &str) -> String {
        format!(
            r#"<div class="row review_table_row">
                <div class="critic_name"><a href="/c/">{critic}</a><em>Planet</em></div>
                <div class="small subtle">Original Score: 3/4</div></div>"#
        )
    }

    fn route(path: &str) -> String {
        match path {
            "/moved" => response("302 Found", "Location: /landing?from=search\r\n", ""),
            "/landing?from=search" => response("200 OK", "", "<html>landing</html>"),
            "/m/heat/reviews/?page=1&sort=" => response("200 OK", "", &review_page("Jane Doe")),
            "/m/heat/reviews/?page=3&sort=" => response("200 OK", "", &review_page("Sam Roe")),
            _ => response("404 Not Found", "", "gone"),
        }
    }

    /// Serves `route` over plain HTTP on a local port and returns the base URL.
    async fn serve() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let mut read = 0;
                    while read < buf.len() {
                        match stream.read(&mut buf[read..]).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => read += n,
                        }
                        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    let request = String::from_utf8_lossy(&buf[..read]).to_string();
                    let path = request.split_whitespace().nth(1).unwrap_or("/");
                    let _ = stream.write_all(route(path).as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        format!("http://{addr}")
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::from(Client::builder().no_proxy().build().expect("client"))
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let base = serve().await;
        let err = fetcher()
            .fetch(&format!("{base}/missing"))
            .await
            .expect_err("404 must fail");
        assert!(
            matches!(err, Error::HttpStatus { status: 404, .. }),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn page_url_is_the_final_url_after_redirects() {
        let base = serve().await;
        let page = fetcher().fetch(&format!("{base}/moved")).await.expect("fetch");
        assert_eq!(page.url, format!("{base}/landing?from=search"));
        assert_eq!(page.html, "<html>landing</html>");
    }

    #[tokio::test]
    async fn review_pagination_stops_at_first_missing_page() {
        let base = serve().await;
        let url = format!("{base}/m/heat/reviews");
        let reviews = fetch_reviews(&fetcher(), Some(&url)).await.expect("reviews");

        assert_eq!(reviews.len(), 1);
        assert!(reviews.contains_key("Jane Doe"));
        assert!(!reviews.contains_key("Sam Roe"));
    }
}
