use async_trait::async_trait;
use std::collections::HashSet;
use tracing::debug;

use super::Commit;
use crate::error::Result;

/// A commit together with the hashes of its parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitNode {
    pub commit: Commit,
    pub parents: Vec<String>,
}

/// Source of commit nodes, usually a remote backed by a fetch cache.
#[async_trait]
pub trait CommitGraph: Send + Sync {
    async fn commit_node(&self, hash: &str) -> Result<CommitNode>;
}

/// Computes the ancestor set of `start`, inclusive, in depth-first order.
///
/// Traversal uses an explicit stack and a visited set, so depth is not bounded
/// by the call stack and a malformed graph with cycles still terminates.
/// Any lookup error aborts the traversal.
pub async fn ancestors<G>(graph: &G, start: &str) -> Result<Vec<Commit>>
where
    G: CommitGraph + ?Sized,
{
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack = vec![start.to_string()];
    let mut commits = Vec::new();

    while let Some(hash) = stack.pop() {
        if !visited.insert(hash.clone()) {
            continue;
        }

        let node = graph.commit_node(&hash).await?;
        // Reversed so the first parent is visited first
        for parent in node.parents.iter().rev() {
            if !visited.contains(parent) {
                stack.push(parent.clone());
            }
        }
        commits.push(node.commit);
    }

    debug!("Resolved {} ancestor commits of {}", commits.len(), start);
    Ok(commits)
}
