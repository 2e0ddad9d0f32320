use std::time::Duration;

use sb_core::error::AppError;
use serde::Deserialize;

use super::{ImageResolver, ResolvedImage};

pub const COMMONS_API_URL: &str = "https://commons.wikimedia.org/w/api.php";
const USER_AGENT: &str = concat!(
    "SourcebookGenerator/",
    env!("CARGO_PKG_VERSION"),
    " (educational tool)"
);
/// Search hits inspected per keyword.
const SEARCH_LIMIT: &str = "15";

/// Wikimedia Commons file search. One request per keyword, no retry.
#[derive(Debug, Clone)]
pub struct WikimediaImages {
    api_url: String,
    timeout: Duration,
}

impl Default for WikimediaImages {
    fn default() -> Self {
        Self::new(COMMONS_API_URL)
    }
}

impl WikimediaImages {
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    pages: Vec<SearchPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPage {
    #[serde(default)]
    title: String,
    /// Rank in the search results.
    #[serde(default)]
    index: u32,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ImageInfo {
    #[serde(default)]
    url: String,
    #[serde(default)]
    mime: String,
}

/// Highest-ranked hit that is an actual image with a usable URL.
fn pick_image(resp: SearchResponse) -> Option<ResolvedImage> {
    let mut pages = resp.query?.pages;
    pages.sort_by_key(|p| p.index);
    pages.into_iter().find_map(|page| {
        let info = page
            .imageinfo
            .into_iter()
            .find(|i| !i.url.is_empty() && i.mime.starts_with("image/"))?;
        let title = page
            .title
            .strip_prefix("File:")
            .unwrap_or(&page.title)
            .to_string();
        Some(ResolvedImage {
            url: info.url,
            title,
        })
    })
}

impl ImageResolver for WikimediaImages {
    fn find_image(&self, query: &str) -> Result<Option<ResolvedImage>, AppError> {
        if query.trim().is_empty() {
            return Ok(None);
        }
        log::info!("Searching Wikimedia Commons for {:?}", query);

        let resp = ureq::get(&self.api_url)
            .timeout(self.timeout)
            .set("User-Agent", USER_AGENT)
            .query("action", "query")
            .query("format", "json")
            .query("formatversion", "2")
            .query("generator", "search")
            .query("gsrsearch", query)
            .query("gsrnamespace", "6")
            .query("gsrlimit", SEARCH_LIMIT)
            .query("prop", "imageinfo")
            .query("iiprop", "url|mime")
            .call();

        match resp {
            Ok(r) => {
                let v: SearchResponse = r.into_json().map_err(|e| {
                    AppError::new("IMAGE_LOOKUP_FAILED", "Failed to decode image search response")
                        .with_details(e.to_string())
                })?;
                Ok(pick_image(v))
            }
            Err(ureq::Error::Status(status, _)) => Err(AppError::new(
                "IMAGE_LOOKUP_FAILED",
                "Image search request failed",
            )
            .with_details(format!("status={status}"))),
            Err(e) => Err(AppError::new(
                "IMAGE_LOOKUP_FAILED",
                "Failed to reach Wikimedia Commons",
            )
            .with_details(e.to_string())),
        }
    }
}
