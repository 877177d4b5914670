pub mod ancestry;
pub mod fetch;
pub mod store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub username: String,
    pub web_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub time: DateTime<Utc>,
}

impl Commit {
    /// A zero commit stands for a revision that has not been created yet.
    pub fn is_zero(&self) -> bool {
        self.hash.is_empty()
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: Commit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub time: DateTime<Utc>,
    pub commit: Commit,
    pub web_url: String,
}

// Tags are identified by name only.
impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Tag {}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Commit[{}]", self.name, self.commit.hash)
    }
}

/// A collection of tags, most recent first once sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<Tag>);

impl Tags {
    pub fn new(tags: Vec<Tag>) -> Self {
        Tags(tags)
    }

    /// Sorts by tag time from the most recent to the least recent.
    /// Tags sharing a time, such as several tags on one commit, are ordered
    /// by name descending, so the order does not depend on the input order.
    pub fn sorted(mut self) -> Self {
        self.0
            .sort_by(|a, b| b.time.cmp(&a.time).then_with(|| b.name.cmp(&a.name)));
        self
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|t| t.name == name)
    }

    pub fn find(&self, name: &str) -> Option<&Tag> {
        self.0.iter().find(|t| t.name == name)
    }

    /// Returns the last tag satisfying the predicate, scanning from the end.
    pub fn last_matching(&self, f: impl Fn(&Tag) -> bool) -> Option<&Tag> {
        self.0.iter().rev().find(|t| f(t))
    }

    pub fn retain(mut self, f: impl Fn(&Tag) -> bool) -> Self {
        self.0.retain(|t| f(t));
        self
    }

    pub fn exclude(self, names: &[String]) -> Self {
        self.retain(|t| !names.contains(&t.name))
    }

    pub fn exclude_regex(self, re: &Regex) -> Self {
        self.retain(|t| !re.is_match(&t.name))
    }

    pub fn truncate_to(mut self, end: usize) -> Self {
        self.0.truncate(end);
        self
    }

    pub fn skip(mut self, start: usize) -> Self {
        self.0.drain(..start.min(self.0.len()));
        self
    }

    pub fn prepend(mut self, tag: Tag) -> Self {
        self.0.insert(0, tag);
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|t| t.name.clone()).collect()
    }
}

impl Deref for Tags {
    type Target = [Tag];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Tag> for Tags {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Tags(iter.into_iter().collect())
    }
}

impl IntoIterator for Tags {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels(pub Vec<String>);

impl Labels {
    /// True if any label equals any of the given names.
    pub fn any(&self, names: &[String]) -> bool {
        self.0.iter().any(|l| names.contains(l))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

/// Fields shared by issues and merges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub number: u64,
    pub title: String,
    pub labels: Labels,
    pub milestone: Option<String>,
    pub time: DateTime<Utc>,
    pub author: User,
    pub web_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub change: Change,
    pub closer: User,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merge {
    pub change: Change,
    pub merger: User,
    pub commit: Commit,
}

/// Common view over issues and merges for filtering, partitioning and grouping.
pub trait Changeable {
    fn change(&self) -> &Change;
}

impl Changeable for Issue {
    fn change(&self) -> &Change {
        &self.change
    }
}

impl Changeable for Merge {
    fn change(&self) -> &Change {
        &self.change
    }
}

/// Sorts changes from the most recent to the least recent.
pub fn sort_changes<T: Changeable>(items: &mut [T]) {
    items.sort_by(|a, b| b.change().time.cmp(&a.change().time));
}

/// Distinct milestones in order of first appearance.
pub fn milestones<T: Changeable>(items: &[T]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for item in items {
        if let Some(milestone) = &item.change().milestone {
            if !milestone.is_empty() && !found.contains(milestone) {
                found.push(milestone.clone());
            }
        }
    }
    found
}

/// The capability a remote hosting provider must offer to build a changelog.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// A tag that does not exist yet.
    fn future_tag(&self, name: &str) -> Tag;

    fn compare_url(&self, base: &str, head: &str) -> String;

    /// Ensures the credential has the scopes the other calls need.
    async fn check_permissions(&self) -> Result<()>;

    async fn fetch_first_commit(&self) -> Result<Commit>;

    async fn fetch_branch(&self, name: &str) -> Result<Branch>;

    async fn fetch_default_branch(&self) -> Result<Branch>;

    async fn fetch_tags(&self) -> Result<Tags>;

    /// Closed issues and merged changes since the given time, most recent first.
    async fn fetch_issues_and_merges(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<(Vec<Issue>, Vec<Merge>)>;

    /// The full ancestor set of a commit, inclusive.
    async fn fetch_parent_commits(&self, hash: &str) -> Result<Vec<Commit>>;
}
