//! Limit/offset pagination with absolute `next`/`previous` links.
//!
//! Links keep every non-pagination query pair of the original request
//! (repeated `course` filters included) and append `limit`/`offset`.

use serde::Serialize;
use url::Url;

pub const LIMIT_PARAM: &str = "limit";
pub const OFFSET_PARAM: &str = "offset";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub limit: usize,
    pub offset: usize,
}

impl PageParams {
    /// Read `limit`/`offset` from decoded query pairs.
    ///
    /// Unparseable values fall back to the defaults; `limit` is clamped to
    /// `1..=max_limit`. The last occurrence of a key wins.
    pub fn from_query(pairs: &[(String, String)], default_limit: usize, max_limit: usize) -> Self {
        let last = |name: &str| {
            pairs
                .iter()
                .rev()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        };
        let max_limit = max_limit.max(1);
        let limit = last(LIMIT_PARAM)
            .filter(|l| *l > 0)
            .unwrap_or(default_limit)
            .clamp(1, max_limit);
        let offset = last(OFFSET_PARAM).unwrap_or(0);
        Self { limit, offset }
    }
}

/// Paginated response body: `{count, next, previous, results}`.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

fn link(base: &Url, query: &[(String, String)], limit: usize, offset: Option<usize>) -> String {
    let mut url = base.clone();
    url.set_query(None);
    {
        let mut q = url.query_pairs_mut();
        for (k, v) in query
            .iter()
            .filter(|(k, _)| k != LIMIT_PARAM && k != OFFSET_PARAM)
        {
            q.append_pair(k, v);
        }
        q.append_pair(LIMIT_PARAM, &limit.to_string());
        if let Some(o) = offset {
            q.append_pair(OFFSET_PARAM, &o.to_string());
        }
    }
    url.into()
}

/// Slice `items` into the page described by `params`.
///
/// `base` is the absolute request URL (its query is ignored); `query` holds
/// the decoded pairs of the original request.
pub fn paginate<T>(items: Vec<T>, params: PageParams, base: &Url, query: &[(String, String)]) -> Page<T> {
    let count = items.len();
    let PageParams { limit, offset } = params;

    let next = (offset.saturating_add(limit) < count)
        .then(|| link(base, query, limit, Some(offset + limit)));

    let previous = (offset > 0).then(|| {
        if offset <= limit {
            link(base, query, limit, None)
        } else {
            link(base, query, limit, Some(offset - limit))
        }
    });

    let results = items.into_iter().skip(offset).take(limit).collect();
    Page { count, next, previous, results }
}
