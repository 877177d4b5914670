use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

use crate::changelog::{Changelog, Processor};
use crate::error::{ChangelogError, Result};
use crate::remote::ancestry::{ancestors, tests::MemoryGraph};
use crate::remote::{Branch, Commit, Issue, Merge, RemoteRepository, Tag, Tags};

/// In-memory remote repository over a fixed commit graph.
#[derive(Default)]
pub(crate) struct MemoryRemote {
    pub graph: MemoryGraph,
    pub first_commit: Commit,
    pub branch: Branch,
    pub tags: Vec<Tag>,
    pub issues: Vec<Issue>,
    pub merges: Vec<Merge>,
    pub denied: bool,
    /// The `since` argument of every issue fetch.
    pub since: Arc<Mutex<Vec<Option<DateTime<Utc>>>>>,
}

impl MemoryRemote {
    pub fn with_graph(edges: &[(&str, &str)]) -> Self {
        Self {
            graph: MemoryGraph::new(edges),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RemoteRepository for MemoryRemote {
    fn future_tag(&self, name: &str) -> Tag {
        Tag {
            name: name.to_string(),
            time: Utc::now(),
            commit: Commit::default(),
            web_url: format!("https://example.com/tree/{}", name),
        }
    }

    fn compare_url(&self, base: &str, head: &str) -> String {
        format!("https://example.com/compare/{}...{}", base, head)
    }

    async fn check_permissions(&self) -> Result<()> {
        if self.denied {
            return Err(ChangelogError::PermissionDenied("memory".to_string()));
        }
        Ok(())
    }

    async fn fetch_first_commit(&self) -> Result<Commit> {
        Ok(self.first_commit.clone())
    }

    async fn fetch_branch(&self, name: &str) -> Result<Branch> {
        Ok(Branch {
            name: name.to_string(),
            commit: self.branch.commit.clone(),
        })
    }

    async fn fetch_default_branch(&self) -> Result<Branch> {
        Ok(self.branch.clone())
    }

    async fn fetch_tags(&self) -> Result<Tags> {
        // Unordered, like a merged paginated fetch
        Ok(self.tags.iter().rev().cloned().collect())
    }

    async fn fetch_issues_and_merges(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<(Vec<Issue>, Vec<Merge>)> {
        if let Ok(mut calls) = self.since.lock() {
            calls.push(since);
        }
        let after = |t: DateTime<Utc>| since.map_or(true, |s| t >= s);
        Ok((
            self.issues.iter().filter(|i| after(i.change.time)).cloned().collect(),
            self.merges.iter().filter(|m| after(m.change.time)).cloned().collect(),
        ))
    }

    async fn fetch_parent_commits(&self, hash: &str) -> Result<Vec<Commit>> {
        ancestors(&self.graph, hash).await
    }
}

/// Processor returning a fixed changelog and capturing what it is asked to render.
#[derive(Default, Clone)]
pub(crate) struct MemoryProcessor {
    pub existing: Changelog,
    pub rendered: Arc<Mutex<Option<Changelog>>>,
}

impl Processor for MemoryProcessor {
    fn parse(&mut self) -> Result<Changelog> {
        Ok(self.existing.clone())
    }

    fn render(&mut self, changelog: &Changelog) -> Result<String> {
        if let Ok(mut rendered) = self.rendered.lock() {
            *rendered = Some(changelog.clone());
        }
        let names: Vec<&str> = changelog.new.iter().map(|r| r.tag_name.as_str()).collect();
        Ok(names.join("\n"))
    }
}
