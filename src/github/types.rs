use chrono::{DateTime, Utc};
use octocrab::models::repos::Tag;
use serde::{Deserialize, Serialize};

use crate::remote::{self, Change, Labels};

// Repositories and tags use the octocrab models. Users, commits, issues and
// events keep local types since the octocrab ones require fields the
// responses used here can leave out.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetails {
    pub committer: Option<Signature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitDetails,
    #[serde(default)]
    pub parents: Vec<CommitRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: Commit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
}

/// Links present only when the issue is a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestLinks {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub milestone: Option<Milestone>,
    pub user: User,
    pub html_url: String,
    pub closed_at: Option<DateTime<Utc>>,
    pub pull_request: Option<PullRequestLinks>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event: String,
    pub actor: Option<User>,
    pub commit_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Commit {
    pub fn parent_hashes(&self) -> Vec<String> {
        self.parents.iter().map(|p| p.sha.clone()).collect()
    }
}

pub fn to_user(u: &User) -> remote::User {
    remote::User {
        name: u.name.clone().unwrap_or_default(),
        email: u.email.clone().unwrap_or_default(),
        username: u.login.clone(),
        web_url: u.html_url.clone(),
    }
}

pub fn to_commit(c: &Commit) -> remote::Commit {
    remote::Commit {
        hash: c.sha.clone(),
        time: c
            .commit
            .committer
            .as_ref()
            .and_then(|s| s.date)
            .unwrap_or_default(),
    }
}

pub fn to_branch(b: &Branch) -> remote::Branch {
    remote::Branch {
        name: b.name.clone(),
        commit: to_commit(&b.commit),
    }
}

/// Tags are timed by the committer time of the commit they point to.
pub fn to_tag(t: &Tag, c: &Commit, owner: &str, repo: &str) -> remote::Tag {
    let commit = to_commit(c);
    remote::Tag {
        name: t.name.clone(),
        time: commit.time,
        commit,
        web_url: format!("https://github.com/{}/{}/tree/{}", owner, repo, t.name),
    }
}

fn to_change(i: &Issue, time: DateTime<Utc>, author: &User) -> Change {
    Change {
        number: i.number,
        title: i.title.clone(),
        labels: Labels(i.labels.iter().map(|l| l.name.clone()).collect()),
        milestone: i.milestone.as_ref().map(|m| m.title.clone()),
        time,
        author: to_user(author),
        web_url: i.html_url.clone(),
    }
}

pub fn to_issue(i: &Issue, e: &Event, author: &User, closer: &User) -> remote::Issue {
    // closed_at and the closing event carry the same time
    let time = i.closed_at.unwrap_or(e.created_at);
    remote::Issue {
        change: to_change(i, time, author),
        closer: to_user(closer),
    }
}

/// The committer time of the merge commit is the actual time the merge landed.
pub fn to_merge(i: &Issue, c: &Commit, author: &User, merger: &User) -> remote::Merge {
    let commit = to_commit(c);
    remote::Merge {
        change: to_change(i, commit.time, author),
        merger: to_user(merger),
        commit,
    }
}
