//! Archive directory listings
//!
//! Every node of the archive tree (product, year, day-of-year) is served as a
//! JSON object whose `content` array lists the children. Year and day nodes
//! are named by their number; file entries additionally carry `md5sum`.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::laads;
use crate::errors::{CrawlError, CrawlResult, FetchError, FetchResult};

/// One child of a listing node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// Year, zero-padded day-of-year or file name
    pub name: String,
    /// Where to descend to, possibly with escaped slashes
    #[serde(rename = "downloadsLink", default)]
    pub downloads_link: Option<String>,
    /// Archive checksum, present on file entries
    #[serde(default)]
    pub md5sum: Option<String>,
    /// Size in bytes, present on file entries
    #[serde(default)]
    pub size: Option<u64>,
}

/// A listing node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
    #[serde(default)]
    pub content: Vec<ListingEntry>,
}

impl DirectoryListing {
    /// Parse a listing body
    pub fn parse(url: &str, body: &[u8]) -> CrawlResult<Self> {
        serde_json::from_slice(body).map_err(|source| CrawlError::MalformedListing {
            url: url.to_string(),
            source,
        })
    }
}

/// Make sure a node URL asks for its JSON rendering
pub fn listing_url(url: &str) -> String {
    if url.ends_with(laads::LISTING_SUFFIX) {
        url.to_string()
    } else {
        format!("{}{}", url, laads::LISTING_SUFFIX)
    }
}

/// Strip the escaping backslashes the archive puts in links
pub fn clean_link(link: &str) -> String {
    link.replace('\\', "")
}

/// URL of a child node
///
/// Absolute links are used as-is, relative ones are resolved against the
/// parent node, and a missing link falls back to `<parent>/<name>`.
pub fn child_url(parent: &str, entry: &ListingEntry) -> FetchResult<String> {
    let invalid = |e: url::ParseError| FetchError::InvalidUrl {
        url: parent.to_string(),
        error: e.to_string(),
    };

    match entry.downloads_link.as_deref().map(clean_link) {
        Some(link) if !link.is_empty() => match Url::parse(&link) {
            Ok(url) => Ok(url.to_string()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                // Trailing slash so a bare name resolves below the parent
                let parent_dir = format!(
                    "{}/",
                    parent
                        .trim_end_matches(laads::LISTING_SUFFIX)
                        .trim_end_matches('/')
                );
                let base = Url::parse(&parent_dir).map_err(invalid)?;
                Ok(base.join(&link).map_err(invalid)?.to_string())
            }
            Err(e) => Err(invalid(e)),
        },
        _ => Ok(format!(
            "{}/{}",
            parent
                .trim_end_matches(laads::LISTING_SUFFIX)
                .trim_end_matches('/'),
            entry.name
        )),
    }
}

/// Product node URL under the archive root
pub fn product_url(base_url: &str, archive_set: &str, product: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), archive_set, product)
}

/// Remote URL of a data file
pub fn file_url(
    base_url: &str,
    archive_set: &str,
    product: &str,
    year: &str,
    doy: &str,
    filename: &str,
) -> String {
    format!(
        "{}/{}/{}/{}",
        product_url(base_url, archive_set, product),
        year,
        doy,
        filename
    )
}
