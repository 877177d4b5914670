use std::collections::HashMap;
use tracing::debug;

use crate::error::Result;
use crate::remote::{Branch, RemoteRepository, Tags};

/// Which branch and which tags reach a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionMembership {
    pub branch: Option<String>,
    /// Most recent tag first; the last entry is the release that introduced the commit.
    pub tags: Vec<String>,
}

impl RevisionMembership {
    pub fn introduced_by(&self) -> Option<&str> {
        self.tags.last().map(String::as_str)
    }
}

pub type CommitIndex = HashMap<String, RevisionMembership>;

/// Indexes every commit reachable from the branch head or any tag.
///
/// `sorted` must be most-recent-first. Tags without a commit contribute nothing.
pub async fn build_index<R>(remote: &R, branch: &Branch, sorted: &Tags) -> Result<CommitIndex>
where
    R: RemoteRepository + ?Sized,
{
    let mut index = CommitIndex::new();

    for commit in remote.fetch_parent_commits(&branch.commit.hash).await? {
        index.entry(commit.hash).or_default().branch = Some(branch.name.clone());
    }

    for tag in sorted.iter().filter(|t| !t.commit.is_zero()) {
        for commit in remote.fetch_parent_commits(&tag.commit.hash).await? {
            index.entry(commit.hash).or_default().tags.push(tag.name.clone());
        }
    }

    debug!("Indexed {} commits across {} tags", index.len(), sorted.len());
    Ok(index)
}
