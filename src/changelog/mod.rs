pub mod markdown;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Reads an existing changelog and renders an updated one.
pub trait Processor: Send + Sync {
    fn parse(&mut self) -> Result<Changelog>;
    fn render(&mut self, changelog: &Changelog) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changelog {
    pub title: String,
    /// Releases computed in this run, most recent first.
    pub new: Vec<Release>,
    /// Releases already recorded in the changelog, most recent first.
    pub existing: Vec<Release>,
}

impl Default for Changelog {
    fn default() -> Self {
        Changelog {
            title: "Changelog".to_string(),
            new: vec![],
            existing: vec![],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub tag_url: String,
    pub tag_time: DateTime<Utc>,
    pub release_url: String,
    pub compare_url: String,
    pub issue_groups: Vec<IssueGroup>,
    pub merge_groups: Vec<MergeGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueGroup {
    pub title: String,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub opened_by: User,
    pub closed_by: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeGroup {
    pub title: String,
    pub merges: Vec<Merge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub opened_by: User,
    pub merged_by: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub username: String,
    pub url: String,
}

impl From<&crate::remote::User> for User {
    fn from(u: &crate::remote::User) -> Self {
        User {
            name: u.name.clone(),
            username: u.username.clone(),
            url: u.web_url.clone(),
        }
    }
}
