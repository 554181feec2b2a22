//! Built-in tool handlers.
//!
//! - [`WebSearch`] backs `search_web` through a [`SearchProvider`] (Brave).
//! - [`WebPageFetcher`] backs `get_url_raw_content` through the [`PageFetcher`] seam.

mod page_content;
mod web_search;

pub use page_content::{FETCH_TIMEOUT, MAX_PAGE_CHARS, PageFetcher, WebPageFetcher, html_to_text};
pub use web_search::{
    BRAVE_API_BASE_URL, BoxedSearchProvider, BraveProvider, MAX_SEARCH_RESULTS, SEARCH_TIMEOUT,
    SearchProvider, SearchResult, WebSearch,
};
