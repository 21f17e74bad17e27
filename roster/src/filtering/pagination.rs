use axum::http::header::HeaderMap;
use serde::Serialize;

use super::request::FilterValue;
use super::rules::ValidatedFilters;

/// Rows per listing page unless configured otherwise
pub const DEFAULT_PER_PAGE: u64 = 15;

/// Page number from the raw `page` parameter; anything unusable is page 1
#[must_use]
pub fn parse_page(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// Number of pages needed for `total` rows; an empty listing still has page 1
#[must_use]
pub fn last_page(total: u64, per_page: u64) -> u64 {
    total.div_ceil(per_page.max(1)).max(1)
}

/// Query pairs that keep the active filters alive across page links.
///
/// Arrays are written as repeated `key[]` pairs. `page` is never included;
/// `extra` carries pass-through parameters that have no filter rule.
#[must_use]
pub fn pagination_query(filters: &ValidatedFilters, extra: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut query = Vec::new();

    for (name, value) in filters.iter() {
        if name == "page" {
            continue;
        }
        match value {
            FilterValue::Single(v) => query.push((name.to_string(), v.clone())),
            FilterValue::Many(values) => {
                let key = format!("{name}[]");
                query.extend(values.iter().map(|v| (key.clone(), v.clone())));
            }
        }
    }

    for (name, value) in extra {
        if *name != "page" && !value.is_empty() {
            query.push(((*name).to_string(), (*value).to_string()));
        }
    }

    query
}

/// Builds page URLs carrying a fixed set of query pairs
#[derive(Debug, Clone)]
pub struct PageLinks {
    base_url: String,
    query: Vec<(String, String)>,
}

impl PageLinks {
    #[must_use]
    pub fn new(base_url: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self {
            base_url: base_url.into(),
            query,
        }
    }

    #[must_use]
    pub fn url(&self, page: u64) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.query {
            serializer.append_pair(key, value);
        }
        serializer.append_pair("page", &page.to_string());
        format!("{}?{}", self.base_url, serializer.finish())
    }
}

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub current_page: u64,
    pub per_page: u64,
    pub total: u64,
    pub last_page: u64,
    pub previous_page_url: Option<String>,
    pub next_page_url: Option<String>,
}

impl<T> Paginated<T> {
    #[must_use]
    pub fn new(items: Vec<T>, current_page: u64, per_page: u64, total: u64, links: &PageLinks) -> Self {
        let last_page = last_page(total, per_page);
        let previous_page_url = (current_page > 1).then(|| links.url(current_page - 1));
        let next_page_url = (current_page < last_page).then(|| links.url(current_page + 1));

        Self {
            items,
            current_page,
            per_page,
            total,
            last_page,
            previous_page_url,
            next_page_url,
        }
    }

    /// Zero-based offset of the first item on this page
    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.current_page - 1).saturating_mul(self.per_page)
    }
}

/// Sanitize resource name by removing control characters for HTTP headers
fn sanitize_resource_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii() && !c.is_ascii_control()).collect()
}

/// Generate the Content-Range header for a page of results.
///
/// # Arguments
///
/// * `offset` - The starting point of the range.
/// * `count` - The number of items actually returned.
/// * `total_count` - The total number of items available.
/// * `resource_name` - The name of the resource being paginated.
///
/// Control characters are stripped from `resource_name`; an empty page is
/// reported as `*/total`.
#[must_use]
pub fn calculate_content_range(
    offset: u64,
    count: u64,
    total_count: u64,
    resource_name: &str,
) -> HeaderMap {
    let safe_name = sanitize_resource_name(resource_name);

    let content_range = if count == 0 {
        format!("{safe_name} */{total_count}")
    } else {
        let last = offset.saturating_add(count - 1);
        format!("{safe_name} {offset}-{last}/{total_count}")
    };

    let mut headers = HeaderMap::new();
    if let Ok(value) = content_range.parse() {
        headers.insert("Content-Range", value);
    }
    headers
}
