use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use tokio::task::JoinSet;
use tracing::debug;

use crate::error::{ChangelogError, Result};

pub const PAGE_SIZE: u8 = 100;

/// One page of a listing and the number of the last page in the listing.
#[derive(Debug)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub last_page: u32,
}

/// Fetches every page of a paginated listing and merges the items by identity.
///
/// Page 1 is fetched first to learn the page count; the remaining pages are
/// fetched concurrently. The first error aborts all in-flight pages and is
/// returned alone. The merged map carries no ordering.
pub async fn fetch_all_pages<T, K, F, Fut>(
    what: &str,
    fetch_page: F,
    key: impl Fn(&T) -> K,
) -> Result<HashMap<K, T>>
where
    T: Send + 'static,
    K: Eq + Hash,
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<Paged<T>>> + Send + 'static,
{
    let mut merged = HashMap::new();

    debug!("Fetching {} page 1 ...", what);
    let first = fetch_page(1).await?;
    for item in first.items {
        merged.insert(key(&item), item);
    }

    let mut pages = JoinSet::new();
    for page in 2..=first.last_page {
        debug!("Fetching {} page {} ...", what, page);
        pages.spawn(fetch_page(page));
    }

    while let Some(joined) = pages.join_next().await {
        match joined {
            Ok(Ok(paged)) => {
                for item in paged.items {
                    merged.insert(key(&item), item);
                }
            }
            Ok(Err(err)) => {
                pages.abort_all();
                return Err(err);
            }
            Err(err) if err.is_cancelled() => continue,
            Err(err) => {
                pages.abort_all();
                return Err(ChangelogError::Task(err));
            }
        }
    }

    debug!("Fetched {} {} across {} page(s)", merged.len(), what, first.last_page.max(1));
    Ok(merged)
}

/// Runs one task per item concurrently and collects the results.
///
/// The first failing task aborts its siblings; results of the others are discarded.
pub async fn fan_out<I, T, F, Fut>(items: I, task: F) -> Result<Vec<T>>
where
    I: IntoIterator,
    T: Send + 'static,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for item in items {
        tasks.spawn(task(item));
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(err)) => {
                tasks.abort_all();
                return Err(err);
            }
            Err(err) if err.is_cancelled() => continue,
            Err(err) => {
                tasks.abort_all();
                return Err(ChangelogError::Task(err));
            }
        }
    }

    Ok(results)
}
