//! Fetching a webpage and reducing it to readable text.
//!
//! [`WebPageFetcher`] downloads a page, drops boilerplate (scripts, navigation,
//! headers, footers, forms, and elements whose `class`/`id`/`role` carries an
//! ad, cookie-notice or sidebar token) and flattens the remaining DOM to plain
//! text with paragraph breaks preserved. Elements that are or contain the page's
//! `main`/`article` content are never dropped for their attributes.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::error::ToolError;

/// Maximum length of extracted page text, in characters.
pub const MAX_PAGE_CHARS: usize = 40_000;

/// Request timeout applied to page fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Maximum number of response body bytes read from a page.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "template", "nav", "header", "footer",
    "aside", "form", "button", "select",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "table", "h1", "h2", "h3", "h4", "h5", "h6",
    "blockquote", "pre", "ul", "ol", "dl", "figure", "tr", "hr",
];

/// Whole `class`/`id`/`role` tokens that mark an element as boilerplate.
const BOILERPLATE_TOKENS: &[&str] = &[
    "ad",
    "ads",
    "advert",
    "adverts",
    "advertisement",
    "advertising",
    "ad-slot",
    "ad-container",
    "ad-wrapper",
    "ad-banner",
    "banner-ad",
    "sponsored",
    "cookie-banner",
    "cookie-notice",
    "cookie-consent",
    "consent-banner",
    "sidebar",
    "popup",
    "newsletter-signup",
    "social-share",
    "complementary",
];

static CONTENT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main, article").expect("valid selector"));

static HORIZONTAL_WS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("valid regex"));

static MULTILINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Fetches a URL and returns its cleaned text content.
#[async_trait]
pub trait PageFetcher: Send + Sync + fmt::Debug {
    /// Fetch `url` and return the cleaned page text.
    async fn fetch(&self, url: &str) -> Result<String, ToolError>;
}

/// [`PageFetcher`] over HTTP(S) with HTML cleanup.
#[derive(Debug, Clone)]
pub struct WebPageFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_output_length: usize,
    max_body_bytes: usize,
}

impl Default for WebPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl WebPageFetcher {
    /// Create a fetcher with the default timeout and output limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: FETCH_TIMEOUT,
            max_output_length: MAX_PAGE_CHARS,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the maximum output length.
    #[must_use]
    pub const fn with_max_output_length(mut self, max: usize) -> Self {
        self.max_output_length = max;
        self
    }

    /// Override the cap on response body bytes.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Truncate on a char boundary, appending a marker when anything was cut.
    fn truncate_content(&self, content: &str) -> String {
        match content.char_indices().nth(self.max_output_length) {
            None => content.to_owned(),
            Some((cut, _)) => format!(
                "{}\n..._This content has been truncated to stay below {} characters_...\n",
                &content[..cut],
                self.max_output_length
            ),
        }
    }
}

#[async_trait]
impl PageFetcher for WebPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ToolError> {
        let parsed = url::Url::parse(url.trim())
            .map_err(|e| ToolError::invalid_args(format!("Invalid URL '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ToolError::invalid_args(
                "URL must start with http:// or https://",
            ));
        }

        let response = self
            .client
            .get(parsed)
            .timeout(self.timeout)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::execution("Request timed out. Please try again later.")
                } else {
                    ToolError::execution(format!("Error fetching webpage: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(ToolError::execution(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let declared_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_none_or(|ct| ct.contains("html"));

        let bytes = read_capped(response, self.max_body_bytes).await?;
        let body = String::from_utf8_lossy(&bytes);

        let text = if declared_html || looks_like_html(&body) {
            html_to_text(&body)
        } else {
            normalize_whitespace(&body)
        };
        debug!(url, chars = text.chars().count(), "Fetched page");
        Ok(self.truncate_content(&text))
    }
}

/// Read at most `cap` bytes of the response body.
async fn read_capped(mut response: reqwest::Response, cap: usize) -> Result<Vec<u8>, ToolError> {
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ToolError::execution(format!("Failed to read response: {e}")))?
    {
        let room = cap.saturating_sub(body.len());
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            debug!(cap, "Page body truncated");
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Whether a body served under a non-HTML content type is actually markup.
fn looks_like_html(body: &str) -> bool {
    let head: String = body
        .trim_start()
        .chars()
        .take(15)
        .flat_map(char::to_lowercase)
        .collect();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Reduce an HTML document to readable text, prefixed by its title.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut output = String::new();

    let title = Selector::parse("title")
        .ok()
        .and_then(|s| document.select(&s).next())
        .map(|t| t.text().collect::<String>())
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty());
    if let Some(title) = title {
        output.push_str(&title);
        output.push_str("\n\n");
    }

    let body = Selector::parse("body")
        .ok()
        .and_then(|s| document.select(&s).next())
        .unwrap_or_else(|| document.root_element());
    collect_text(body, &mut output);

    normalize_whitespace(&output)
}

fn is_boilerplate(element: ElementRef<'_>) -> bool {
    let el = element.value();
    if matches!(el.name(), "main" | "article" | "body") {
        return false;
    }
    let marked = SKIPPED_TAGS.contains(&el.name())
        || ["class", "id", "role"]
            .iter()
            .filter_map(|attr| el.attr(attr))
            .flat_map(str::split_whitespace)
            .any(|token| {
                BOILERPLATE_TOKENS
                    .iter()
                    .any(|b| token.eq_ignore_ascii_case(b))
            });
    marked && element.select(&CONTENT_SELECTOR).next().is_none()
}

fn collect_text(element: ElementRef<'_>, output: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let mut words = text.text.split_whitespace().peekable();
                if words.peek().is_some() {
                    output.push_str(&words.collect::<Vec<_>>().join(" "));
                    output.push(' ');
                }
            }
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_boilerplate(child_el) {
                    continue;
                }
                match el.name() {
                    "br" => output.push('\n'),
                    "li" | "dt" => {
                        output.push_str("\n- ");
                        collect_text(child_el, output);
                    }
                    tag if BLOCK_TAGS.contains(&tag) => {
                        output.push_str("\n\n");
                        collect_text(child_el, output);
                        output.push_str("\n\n");
                    }
                    _ => collect_text(child_el, output),
                }
            }
            _ => {}
        }
    }
}

/// Collapse runs of horizontal whitespace, trim lines and squeeze blank lines.
fn normalize_whitespace(text: &str) -> String {
    let collapsed = HORIZONTAL_WS_RE.replace_all(text, " ");
    let trimmed_lines = collapsed
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    MULTILINE_RE
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<!doctype html>
<html>
  <head><title>  Rust   Release Notes </title><style>body { color: red }</style></head>
  <body>
    <header><a href="/">Home</a> | <a href="/blog">Blog</a></header>
    <nav><ul><li>Docs</li><li>Install</li></ul></nav>
    <div class="ad-slot">Buy now!</div>
    <div id="cookie-banner">We use cookies</div>
    <main>
      <h1>Rust 1.80</h1>
      <p>The   Rust team is happy
         to announce a new version.</p>
      <ul><li>LazyLock</li><li>Exclusive ranges</li></ul>
      <script>track()</script>
    </main>
    <aside>Related posts</aside>
    <footer>Copyright</footer>
  </body>
</html>"#;

    #[test]
    fn test_html_to_text_strips_boilerplate() {
        let text = html_to_text(PAGE);

        assert!(text.starts_with("Rust Release Notes\n\n"));
        assert!(text.contains("Rust 1.80"));
        assert!(text.contains("The Rust team is happy to announce a new version."));
        assert!(text.contains("- LazyLock"));
        assert!(text.contains("- Exclusive ranges"));

        for noise in [
            "Home",
            "Docs",
            "Buy now",
            "cookies",
            "track()",
            "color: red",
            "Related posts",
            "Copyright",
        ] {
            assert!(!text.contains(noise), "unexpected {noise:?} in {text:?}");
        }
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn test_boilerplate_pattern_avoids_substrings() {
        let text = html_to_text(
            r#"<body><div class="read-more shadow">kept</div><div class="ads">dropped</div></body>"#,
        );
        assert_eq!(text, "kept");
    }

    #[test]
    fn test_layout_wrappers_keep_article_text() {
        let text = html_to_text(
            r#"<html><head><title>Post</title></head><body>
            <div class="site-content has-sidebar"><main><h1>Heading</h1>
            <p>The actual article text.</p></main><aside>links</aside></div>
            </body></html>"#,
        );
        assert!(text.contains("Heading"), "{text:?}");
        assert!(text.contains("The actual article text."), "{text:?}");
        assert!(!text.contains("links"));

        let text = html_to_text(
            r#"<body><article class="promotion-news"><p>Company announces results.</p></article></body>"#,
        );
        assert_eq!(text, "Company announces results.");
    }

    #[test]
    fn test_boilerplate_wrapper_around_main_is_kept() {
        let text = html_to_text(
            r#"<body><div class="sidebar"><main><p>Body copy</p></main></div>
            <div class="sidebar">Trending</div></body>"#,
        );
        assert_eq!(text, "Body copy");
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("\n  <!DOCTYPE html><html></html>"));
        assert!(looks_like_html("<HTML><body>x</body></HTML>"));
        assert!(!looks_like_html("line <b>two</b>"));
        assert!(!looks_like_html(""));
    }

    #[test]
    fn test_truncate_content_on_char_boundary() {
        let fetcher = WebPageFetcher::new().with_max_output_length(3);
        assert_eq!(fetcher.truncate_content("héé"), "héé");
        let cut = fetcher.truncate_content("héllo");
        assert!(cut.starts_with("hél\n..._This content has been truncated"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_urls() {
        let fetcher = WebPageFetcher::new();
        for url in ["", "not a url", "ftp://example.com/file", "file:///etc/passwd"] {
            let err = fetcher.fetch(url).await.unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments(_)), "{url}: {err}");
        }
    }

    #[tokio::test]
    async fn test_fetch_cleans_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes"))
            .and(header_exists("user-agent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(PAGE, "text/html; charset=utf-8"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let text = WebPageFetcher::new()
            .fetch(&format!("{}/notes", server.uri()))
            .await
            .unwrap();
        assert!(text.contains("Rust 1.80"));
        assert!(!text.contains("Buy now"));
    }

    #[tokio::test]
    async fn test_fetch_plain_text_passthrough() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("line one   \n\n\n\nline <b>two</b>"),
            )
            .mount(&server)
            .await;

        let text = WebPageFetcher::new().fetch(&server.uri()).await.unwrap();
        assert_eq!(text, "line one\n\nline <b>two</b>");
    }

    #[tokio::test]
    async fn test_fetch_sniffs_mislabeled_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/plain"))
            .mount(&server)
            .await;

        let text = WebPageFetcher::new().fetch(&server.uri()).await.unwrap();
        assert!(text.starts_with("Rust Release Notes"));
        assert!(!text.contains("<main>"));
        assert!(!text.contains("Buy now"));
    }

    #[tokio::test]
    async fn test_fetch_caps_body_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("a".repeat(10_000), "text/plain"),
            )
            .mount(&server)
            .await;

        let text = WebPageFetcher::new()
            .with_max_body_bytes(64)
            .fetch(&server.uri())
            .await
            .unwrap();
        assert_eq!(text, "a".repeat(64));
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = WebPageFetcher::new().fetch(&server.uri()).await.unwrap_err();
        assert!(err.to_string().contains("HTTP error: 404"));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = WebPageFetcher::new()
            .with_timeout(Duration::from_millis(50))
            .fetch(&server.uri())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
