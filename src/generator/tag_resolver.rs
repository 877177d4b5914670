use tracing::{debug, info};

use crate::changelog::Release;
use crate::config::types::TagsConfig;
use crate::error::{ChangelogError, Result};
use crate::remote::{Tag, Tags};

/// Picks the tags that need a new release section.
///
/// `sorted` must be most-recent-first. Tags already released in the changelog
/// are dropped, the result is narrowed to the `from`/`to` window, and a future
/// tag built by `future_tag` is prepended when one is requested.
pub fn resolve_tags(
    sorted: &Tags,
    existing: &[Release],
    window: &TagsConfig,
    future_tag: impl FnOnce(&str) -> Tag,
) -> Result<Tags> {
    debug!("Resolving new tags for changelog ...");

    let mut new_tags = sorted
        .clone()
        .retain(|t| !existing.iter().any(|r| r.tag_name == t.name));

    if let Some(from) = window.from.as_deref() {
        let i = new_tags.index(from).ok_or_else(|| ChangelogError::UnknownTag {
            kind: "from-tag",
            name: from.to_string(),
            choices: new_tags.names(),
        })?;
        new_tags = new_tags.truncate_to(i + 1);
    }

    if let Some(to) = window.to.as_deref() {
        let i = new_tags.index(to).ok_or_else(|| ChangelogError::UnknownTag {
            kind: "to-tag",
            name: to.to_string(),
            choices: new_tags.names(),
        })?;
        new_tags = new_tags.skip(i);
    }

    if let Some(future) = window.future.as_deref() {
        if sorted.find(future).is_some() {
            return Err(ChangelogError::FutureTagCollision(future.to_string()));
        }
        new_tags = new_tags.prepend(future_tag(future));
    }

    info!("Resolved new tags for changelog: [{}]", new_tags.names().join(", "));
    Ok(new_tags)
}
