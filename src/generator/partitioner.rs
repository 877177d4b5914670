use std::collections::HashMap;
use tracing::debug;

use super::revision_index::CommitIndex;
use crate::remote::{Issue, Merge, Tag, Tags};

/// Changes keyed by the name of the tag they are released in.
/// A tag is present only if at least one change was attributed to it.
pub type Partition<T> = HashMap<String, Vec<T>>;

/// Attributes each issue to the least recent tag created at or after its close time.
///
/// `sorted` must be most-recent-first. Issues closed after every tag go to
/// `future` if given and are dropped otherwise. Item order is preserved per tag.
pub fn partition_issues(issues: Vec<Issue>, sorted: &Tags, future: Option<&Tag>) -> Partition<Issue> {
    let mut partition = Partition::new();

    for issue in issues {
        let tag = sorted
            .last_matching(|t| issue.change.time <= t.time)
            .or(future)
            .map(|t| t.name.clone());

        match tag {
            Some(name) => partition.entry(name).or_insert_with(Vec::new).push(issue),
            None => debug!("Issue #{} is not released yet", issue.change.number),
        }
    }

    partition
}

/// Attributes each merge to the first release containing its landing commit.
///
/// Merges reachable only from the branch go to `future` if given. Merges whose
/// commit is not indexed at all are dropped.
pub fn partition_merges(merges: Vec<Merge>, index: &CommitIndex, future: Option<&Tag>) -> Partition<Merge> {
    let mut partition = Partition::new();

    for merge in merges {
        let Some(membership) = index.get(&merge.commit.hash) else {
            debug!("Merge #{} landed on an unknown commit {}", merge.change.number, merge.commit);
            continue;
        };

        let tag = membership
            .introduced_by()
            .map(String::from)
            .or_else(|| future.map(|t| t.name.clone()));

        match tag {
            Some(name) => partition.entry(name).or_insert_with(Vec::new).push(merge),
            None => debug!("Merge #{} is not released yet", merge.change.number),
        }
    }

    partition
}
