use std::str::FromStr;

use serde_json::{Value, json};

use dreambook_core::DomainError;
use dreambook_infra::{DynStore, Store};

use crate::app::errors::ApiError;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Parse a path or body identifier; failures are 400 `invalid_id`.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::Domain(DomainError::invalid_id(format!("invalid {what} id"))))
}

/// Load a record or fail with 404.
pub async fn fetch<K, V>(store: &DynStore<K, V>, key: &K, what: &str) -> Result<V, ApiError>
where
    K: Send + Sync + 'static,
    V: Send + 'static,
{
    store
        .get(key)
        .await?
        .ok_or_else(|| ApiError::not_found(what))
}

/// Page-number pagination in the `{count, results, next, previous}` shape.
///
/// `page` is 1-based; `next`/`previous` are relative links on `path`.
pub fn paginate(
    items: Vec<Value>,
    page: Option<usize>,
    page_size: Option<usize>,
    path: &str,
) -> Result<Value, ApiError> {
    let page = page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::bad_request("invalid_page", "page must be at least 1"));
    }
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let count = items.len();
    let pages = count.div_ceil(page_size).max(1);
    if page > pages {
        return Err(ApiError::not_found("page"));
    }

    let link = |p: usize| format!("{path}?page={p}&page_size={page_size}");
    let results: Vec<Value> = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Ok(json!({
        "count": count,
        "results": results,
        "next": (page < pages).then(|| link(page + 1)),
        "previous": (page > 1).then(|| link(page - 1)),
    }))
}
