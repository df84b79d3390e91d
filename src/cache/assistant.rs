//! Assistant lookup by identifier or name.

use crate::cache::entity::EntityCache;
use crate::cache::error::CacheError;
use crate::conversation::{Assistant, AssistantDirectory};
use std::time::Duration;

/// How long a resolved assistant stays cached.
pub const DEFAULT_ASSISTANT_TTL: Duration = Duration::from_secs(15 * 60);

const ASSISTANT_ID_PREFIX: &str = "asst_";

/// Cache key for an assistant identifier or name.
#[must_use]
pub fn assistant_cache_key(id_or_name: &str) -> String {
    format!("openai:assistant:{}", id_or_name)
}

/// Finds an assistant without consulting any cache.
///
/// Values that look like identifiers are retrieved directly. If that
/// misses, or the value is a plain name, every listing page is scanned for
/// an assistant with exactly that name.
///
/// # Errors
///
/// Returns a not found `CacheError` once the scan is exhausted, or an
/// upstream error if the service fails.
pub async fn find_assistant<D>(directory: &D, id_or_name: &str) -> Result<Assistant, CacheError>
where
    D: AssistantDirectory + ?Sized,
{
    if id_or_name.starts_with(ASSISTANT_ID_PREFIX) {
        match directory.retrieve_assistant(id_or_name).await {
            Ok(assistant) => return Ok(assistant),
            Err(e) if e.is_not_found() => {
                tracing::debug!(id_or_name, "Assistant id not found, searching by name");
            }
            Err(e) => return Err(CacheError::upstream(e)),
        }
    }

    let mut after: Option<String> = None;
    let mut pages = 0usize;
    loop {
        let page = directory.list_assistants(after.as_deref()).await?;
        pages += 1;
        if let Some(found) = page
            .data
            .iter()
            .find(|a| a.name.as_deref() == Some(id_or_name))
        {
            tracing::debug!(id_or_name, assistant_id = %found.id, pages, "Assistant found by name");
            return Ok(found.clone());
        }
        if !page.has_more {
            break;
        }
        let next = page
            .last_id
            .or_else(|| page.data.last().map(|a| a.id.clone()));
        if next.is_none() || next == after {
            break;
        }
        after = next;
    }

    Err(CacheError::not_found("assistant", id_or_name))
}

/// Resolves an assistant, memoized under [`assistant_cache_key`].
///
/// Without a cache every call goes to the service.
///
/// # Errors
///
/// See [`find_assistant`].
pub async fn ensure_assistant<D>(
    directory: &D,
    id_or_name: &str,
    cache: Option<&EntityCache>,
    ttl: Duration,
    force: bool,
) -> Result<Assistant, CacheError>
where
    D: AssistantDirectory + ?Sized,
{
    match cache {
        Some(cache) => {
            cache
                .ensure(
                    &assistant_cache_key(id_or_name),
                    || find_assistant(directory, id_or_name),
                    ttl,
                    force,
                )
                .await
        }
        None => find_assistant(directory, id_or_name).await,
    }
}
