use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use octocrab::models::repos::Tag;
use octocrab::models::Repository;
use octocrab::{Octocrab, Page};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use super::types::{self, to_branch, to_commit, to_issue, to_merge, to_tag};
use crate::error::{ChangelogError, Result};
use crate::remote::ancestry::{self, CommitGraph, CommitNode};
use crate::remote::fetch::{fan_out, fetch_all_pages, Paged, PAGE_SIZE};
use crate::remote::store::FetchCache;
use crate::remote::{self, sort_changes, Branch, RemoteRepository, Tags};

pub type GitHubCache = FetchCache<types::Commit, types::User>;

/// GitHub implementation of [`RemoteRepository`].
///
/// Clones share the octocrab client and the per-run fetch cache.
#[derive(Clone)]
pub struct GitHubRepo {
    client: Octocrab,
    owner: String,
    repo: String,
    cache: Arc<GitHubCache>,
}

impl GitHubRepo {
    /// Creates a repository client for an `owner/name` path with a fresh cache.
    pub fn new(token: String, path: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token)
            .build()
            .map_err(|e| ChangelogError::remote("building GitHub client", e))?;
        Self::with_client(client, path, Arc::new(GitHubCache::new()))
    }

    pub fn with_client(client: Octocrab, path: &str, cache: Arc<GitHubCache>) -> Result<Self> {
        let (owner, repo) = match path.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                (owner.to_string(), repo.to_string())
            }
            _ => return Err(ChangelogError::InvalidRepository(path.to_string())),
        };

        Ok(Self {
            client,
            owner,
            repo,
            cache,
        })
    }

    fn route(&self, suffix: &str) -> String {
        format!("/repos/{}/{}{}", self.owner, self.repo, suffix)
    }

    async fn get<T: DeserializeOwned>(&self, route: &str) -> Result<T> {
        self.client
            .get(route, None::<&()>)
            .await
            .map_err(|e| ChangelogError::remote(format!("GET {}", route), e))
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        route: &str,
        page: u32,
        params: &[(&str, String)],
    ) -> Result<Paged<T>> {
        let mut query = vec![("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())];
        query.extend(params.iter().map(|(k, v)| (*k, v.clone())));

        let mut result: Page<T> = self
            .client
            .get(route, Some(&query))
            .await
            .map_err(|e| ChangelogError::remote(format!("GET {} page {}", route, page), e))?;

        Ok(Paged {
            last_page: result.number_of_pages().unwrap_or(page),
            items: result.take_items(),
        })
    }

    async fn get_user(&self, login: &str) -> Result<types::User> {
        if let Some(user) = self.cache.users.load(login) {
            return Ok(user);
        }

        let user: types::User = self.get(&format!("/users/{}", login)).await?;
        self.cache.users.save(user.login.clone(), user.clone());

        Ok(user)
    }

    async fn get_commit(&self, hash: &str) -> Result<types::Commit> {
        if let Some(commit) = self.cache.commits.load(hash) {
            return Ok(commit);
        }

        let commit: types::Commit = self.get(&self.route(&format!("/commits/{}", hash))).await?;
        self.cache.commits.save(commit.sha.clone(), commit.clone());

        Ok(commit)
    }

    /// Scans the events of an issue page by page for the first event with the given name.
    async fn find_event(&self, number: u64, name: &str) -> Result<Option<types::Event>> {
        let route = self.route(&format!("/issues/{}/events", number));

        let mut page = 1;
        loop {
            let events: Paged<types::Event> = self.get_page(&route, page, &[]).await?;
            if let Some(event) = events.items.into_iter().find(|e| e.event == name) {
                debug!("Found {} event for issue {}", name, number);
                return Ok(Some(event));
            }
            if page >= events.last_page {
                return Ok(None);
            }
            page += 1;
        }
    }

    /// The event that closed an issue or merged a pull request.
    /// A pull request without a merged event was closed without merging.
    async fn closing_event(&self, issue: &types::Issue) -> Result<Option<types::Event>> {
        if !issue.is_pull_request() {
            return self.find_event(issue.number, "closed").await;
        }

        let event = self.find_event(issue.number, "merged").await?;
        match event {
            Some(e) => match e.commit_id.as_deref() {
                Some(sha) => {
                    self.get_commit(sha).await?;
                    Ok(Some(e))
                }
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    async fn fetch_branch_commit(&self, name: &str) -> Result<Branch> {
        let b: types::Branch = self.get(&self.route(&format!("/branches/{}", name))).await?;
        self.cache.commits.save(b.commit.sha.clone(), b.commit.clone());
        Ok(to_branch(&b))
    }
}

#[async_trait]
impl CommitGraph for GitHubRepo {
    async fn commit_node(&self, hash: &str) -> Result<CommitNode> {
        let c = self.get_commit(hash).await?;
        Ok(CommitNode {
            commit: to_commit(&c),
            parents: c.parent_hashes(),
        })
    }
}

#[async_trait]
impl RemoteRepository for GitHubRepo {
    fn future_tag(&self, name: &str) -> remote::Tag {
        remote::Tag {
            name: name.to_string(),
            time: Utc::now(),
            commit: remote::Commit::default(),
            web_url: format!("https://github.com/{}/{}/tree/{}", self.owner, self.repo, name),
        }
    }

    fn compare_url(&self, base: &str, head: &str) -> String {
        format!(
            "https://github.com/{}/{}/compare/{}...{}",
            self.owner, self.repo, base, head
        )
    }

    async fn check_permissions(&self) -> Result<()> {
        let route = self.route("");
        let repository: Repository = match self.client.get(&route, None::<&()>).await {
            Ok(repository) => repository,
            Err(octocrab::Error::GitHub { source, .. })
                if source.message.contains("Bad credentials") || source.message.contains("Not Found") =>
            {
                return Err(ChangelogError::PermissionDenied(format!(
                    "{}/{}: {}",
                    self.owner, self.repo, source.message
                )));
            }
            Err(e) => return Err(ChangelogError::remote(format!("GET {}", route), e)),
        };

        match repository.permissions {
            Some(p) if p.pull => {
                debug!("GitHub token can read {}/{}", self.owner, self.repo);
                Ok(())
            }
            _ => Err(ChangelogError::PermissionDenied(format!(
                "token cannot read {}/{}",
                self.owner, self.repo
            ))),
        }
    }

    async fn fetch_first_commit(&self) -> Result<remote::Commit> {
        debug!("Fetching the first GitHub commit ...");

        let route = self.route("/commits");
        let mut commits: Paged<types::Commit> = self.get_page(&route, 1, &[]).await?;
        if commits.last_page > 1 {
            commits = self.get_page(&route, commits.last_page, &[]).await?;
        }

        for c in &commits.items {
            self.cache.commits.save(c.sha.clone(), c.clone());
        }

        let first = commits
            .items
            .last()
            .map(to_commit)
            .ok_or_else(|| ChangelogError::remote(route, "repository has no commits"))?;

        debug!("Fetched the first GitHub commit: {}", first);
        Ok(first)
    }

    async fn fetch_branch(&self, name: &str) -> Result<Branch> {
        let branch = self.fetch_branch_commit(name).await?;
        debug!("Fetched GitHub branch: {}", branch.name);
        Ok(branch)
    }

    async fn fetch_default_branch(&self) -> Result<Branch> {
        let route = self.route("");
        let repository: Repository = self.get(&route).await?;
        let name = repository
            .default_branch
            .ok_or_else(|| ChangelogError::remote(route, "repository has no default branch"))?;
        let branch = self.fetch_branch_commit(&name).await?;
        debug!("Fetched GitHub default branch: {}", branch.name);
        Ok(branch)
    }

    async fn fetch_tags(&self) -> Result<Tags> {
        debug!("Fetching GitHub tags ...");

        let this = self.clone();
        let route = self.route("/tags");
        let tags = fetch_all_pages(
            "tags",
            move |page| {
                let this = this.clone();
                let route = route.clone();
                async move { this.get_page::<Tag>(&route, page, &[]).await }
            },
            |t: &Tag| t.name.clone(),
        )
        .await?;

        debug!("Fetching GitHub commits for {} tags ...", tags.len());

        let shas: HashSet<String> = tags.values().map(|t| t.commit.sha.clone()).collect();
        fan_out(shas, |sha| {
            let this = self.clone();
            async move { this.get_commit(&sha).await.map(|_| ()) }
        })
        .await?;

        let tags: Tags = tags
            .values()
            .filter_map(|t| {
                self.cache
                    .commits
                    .load(t.commit.sha.as_str())
                    .map(|c| to_tag(t, &c, &self.owner, &self.repo))
            })
            .collect();

        debug!("GitHub tags are fetched: {}", tags.len());
        Ok(tags)
    }

    async fn fetch_issues_and_merges(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<(Vec<remote::Issue>, Vec<remote::Merge>)> {
        let mut filter = vec![("state", "closed".to_string())];
        match since {
            Some(since) => {
                info!("Fetching GitHub issues since {} ...", since.to_rfc3339());
                filter.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
            }
            None => info!("Fetching GitHub issues since the beginning ..."),
        }

        let this = self.clone();
        let route = self.route("/issues");
        let issues = fetch_all_pages(
            "issues",
            move |page| {
                let this = this.clone();
                let route = route.clone();
                let filter = filter.clone();
                async move { this.get_page::<types::Issue>(&route, page, &filter).await }
            },
            |i: &types::Issue| i.number,
        )
        .await?;

        debug!("Fetched GitHub issues: {}", issues.len());
        debug!("Fetching GitHub events and commits for issues and pull requests ...");

        let events = fan_out(issues.values().cloned(), |issue| {
            let this = self.clone();
            async move { this.closing_event(&issue).await.map(|e| (issue.number, e)) }
        })
        .await?;

        let events: HashMap<u64, Option<types::Event>> = events.into_iter().collect();

        debug!("Fetching GitHub users for issues and pull requests ...");

        let mut logins: HashSet<String> = HashSet::new();
        for issue in issues.values() {
            if let Some(event) = events.get(&issue.number) {
                if event.is_some() || !issue.is_pull_request() {
                    logins.insert(issue.user.login.clone());
                }
                if let Some(actor) = event.as_ref().and_then(|e| e.actor.as_ref()) {
                    logins.insert(actor.login.clone());
                }
            }
        }

        fan_out(logins, |login| {
            let this = self.clone();
            async move { this.get_user(&login).await.map(|_| ()) }
        })
        .await?;

        let user = |login: &str| self.cache.users.load(login).unwrap_or_default();

        let mut resolved_issues = Vec::new();
        let mut resolved_merges = Vec::new();

        for issue in issues.values() {
            let event = events.get(&issue.number).cloned().flatten();
            let author = user(&issue.user.login);
            let actor = event
                .as_ref()
                .and_then(|e| e.actor.as_ref())
                .map(|a| user(&a.login))
                .unwrap_or_default();

            if !issue.is_pull_request() {
                let closing = event.unwrap_or_else(|| types::Event {
                    event: "closed".to_string(),
                    actor: None,
                    commit_id: None,
                    created_at: issue.closed_at.unwrap_or_default(),
                });
                resolved_issues.push(to_issue(issue, &closing, &author, &actor));
                continue;
            }

            let commit = event
                .as_ref()
                .and_then(|e| e.commit_id.as_deref())
                .and_then(|sha| self.cache.commits.load(sha));
            if let Some(commit) = commit {
                resolved_merges.push(to_merge(issue, &commit, &author, &actor));
            }
        }

        sort_changes(&mut resolved_issues);
        sort_changes(&mut resolved_merges);

        info!(
            "All GitHub issues ({}) and pull requests ({}) are fetched",
            resolved_issues.len(),
            resolved_merges.len()
        );
        Ok((resolved_issues, resolved_merges))
    }

    async fn fetch_parent_commits(&self, hash: &str) -> Result<Vec<remote::Commit>> {
        debug!("Fetching all GitHub parent commits for {} ...", hash);
        let commits = ancestry::ancestors(self, hash).await?;
        debug!("All GitHub parent commits for {} are fetched", hash);
        Ok(commits)
    }
}

impl std::fmt::Debug for GitHubRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubRepo")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("cached_commits", &self.cache.commits.len())
            .field("cached_users", &self.cache.users.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn repo_for(server: &ServerGuard) -> GitHubRepo {
        let client = Octocrab::builder()
            .base_uri(server.url())
            .unwrap()
            .personal_token("token".to_string())
            .build()
            .unwrap();
        GitHubRepo::with_client(client, "octocat/hello", Arc::new(GitHubCache::new())).unwrap()
    }

    fn commit_json(sha: &str, date: &str, parents: &[&str]) -> serde_json::Value {
        json!({
            "sha": sha,
            "commit": { "committer": { "date": date } },
            "parents": parents.iter().map(|p| json!({ "sha": p })).collect::<Vec<_>>(),
        })
    }

    async fn mock_json(
        server: &mut ServerGuard,
        path: &str,
        body: serde_json::Value,
    ) -> mockito::Mock {
        server
            .mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// One page of a paged listing. Pages before the last carry a `last` link.
    async fn mock_page(
        server: &mut ServerGuard,
        path: &str,
        page: u32,
        last: u32,
        body: serde_json::Value,
    ) -> mockito::Mock {
        let mut mock = server
            .mock("GET", path)
            .match_query(Matcher::UrlEncoded("page".into(), page.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json");
        if last > 1 {
            let link = format!(
                r#"<{}{}?per_page=100&page={}>; rel="last""#,
                server.url(),
                path,
                last
            );
            mock = mock.with_header("link", &link);
        }
        mock.with_body(body.to_string()).create_async().await
    }

    fn repository_json(default_branch: &str, pull: bool) -> serde_json::Value {
        json!({
            "id": 1296269,
            "name": "hello",
            "url": "https://api.github.com/repos/octocat/hello",
            "default_branch": default_branch,
            "permissions": { "admin": false, "push": false, "pull": pull },
        })
    }

    fn tag_json(name: &str, sha: &str) -> serde_json::Value {
        json!({
            "name": name,
            "commit": { "sha": sha, "url": format!("https://api.github.com/repos/octocat/hello/commits/{}", sha) },
            "zipball_url": format!("https://api.github.com/repos/octocat/hello/zipball/{}", name),
            "tarball_url": format!("https://api.github.com/repos/octocat/hello/tarball/{}", name),
            "node_id": format!("tag-{}", name),
        })
    }

    fn event_json(event: &str, commit_id: Option<&str>, created_at: &str) -> serde_json::Value {
        json!({ "event": event, "actor": { "login": "octocat" }, "commit_id": commit_id, "created_at": created_at })
    }

    #[tokio::test]
    async fn rejects_malformed_repository_path() {
        let client = Octocrab::builder().build().unwrap();
        for path in ["octocat", "octocat/", "/hello", "a/b/c"] {
            let res = GitHubRepo::with_client(client.clone(), path, Arc::new(GitHubCache::new()));
            assert!(matches!(res, Err(ChangelogError::InvalidRepository(_))), "{}", path);
        }
    }

    #[tokio::test]
    async fn urls() {
        let server = Server::new_async().await;
        let repo = repo_for(&server);

        assert_eq!(
            repo.compare_url("v0.1.0", "v0.2.0"),
            "https://github.com/octocat/hello/compare/v0.1.0...v0.2.0"
        );

        let future = repo.future_tag("v1.0.0");
        assert_eq!(future.web_url, "https://github.com/octocat/hello/tree/v1.0.0");
        assert!(future.commit.is_zero());
    }

    #[tokio::test]
    async fn check_permissions_requires_read_access() {
        let mut server = Server::new_async().await;
        mock_json(
            &mut server,
            "/repos/octocat/hello",
            repository_json("main", false),
        )
        .await;

        let res = repo_for(&server).check_permissions().await;
        assert!(matches!(res, Err(ChangelogError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn check_permissions_ok() {
        let mut server = Server::new_async().await;
        mock_json(
            &mut server,
            "/repos/octocat/hello",
            repository_json("main", true),
        )
        .await;

        assert!(repo_for(&server).check_permissions().await.is_ok());
    }

    #[tokio::test]
    async fn fetch_default_branch() {
        let mut server = Server::new_async().await;
        mock_json(&mut server, "/repos/octocat/hello", repository_json("main", true)).await;
        mock_json(
            &mut server,
            "/repos/octocat/hello/branches/main",
            json!({ "name": "main", "commit": commit_json("c2", "2020-10-12T10:00:00Z", &["c1"]) }),
        )
        .await;

        let branch = repo_for(&server).fetch_default_branch().await.unwrap();
        assert_eq!(branch.name, "main");
        assert_eq!(branch.commit.hash, "c2");
    }

    #[tokio::test]
    async fn fetch_tags_resolves_commits_through_cache() {
        let mut server = Server::new_async().await;
        mock_json(
            &mut server,
            "/repos/octocat/hello/tags",
            json!([tag_json("v0.1.0", "c1"), tag_json("v0.2.0", "c2")]),
        )
        .await;
        let c1 = mock_json(
            &mut server,
            "/repos/octocat/hello/commits/c1",
            commit_json("c1", "2020-10-10T10:00:00Z", &[]),
        )
        .await;
        let c2 = mock_json(
            &mut server,
            "/repos/octocat/hello/commits/c2",
            commit_json("c2", "2020-10-12T10:00:00Z", &["c1"]),
        )
        .await;

        let repo = repo_for(&server);
        let tags = repo.fetch_tags().await.unwrap().sorted();
        assert_eq!(tags.names(), vec!["v0.2.0", "v0.1.0"]);
        assert_eq!(tags[0].commit.hash, "c2");
        assert_eq!(tags[0].web_url, "https://github.com/octocat/hello/tree/v0.2.0");

        // Ancestry of a tagged commit is served from the cache
        let parents = repo.fetch_parent_commits("c2").await.unwrap();
        let hashes: Vec<_> = parents.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(hashes, vec!["c2", "c1"]);

        c1.assert_async().await;
        c2.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_tags_fails_on_page_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/octocat/hello/tags")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "Server Error"}"#)
            .create_async()
            .await;

        let res = repo_for(&server).fetch_tags().await;
        assert!(matches!(res, Err(ChangelogError::RemoteFetchFailure { .. })));
    }

    #[tokio::test]
    async fn fetch_tags_merges_all_pages() {
        let mut server = Server::new_async().await;
        let path = "/repos/octocat/hello/tags";
        let page1 = mock_page(
            &mut server,
            path,
            1,
            2,
            json!([tag_json("v0.2.0", "c2"), tag_json("stable", "c2")]),
        )
        .await;
        let page2 = mock_page(
            &mut server,
            path,
            2,
            2,
            json!([tag_json("v0.1.0", "c1"), tag_json("v0.2.0-rc.1", "c2")]),
        )
        .await;
        mock_json(
            &mut server,
            "/repos/octocat/hello/commits/c1",
            commit_json("c1", "2020-10-10T10:00:00Z", &[]),
        )
        .await;
        let c2 = mock_json(
            &mut server,
            "/repos/octocat/hello/commits/c2",
            commit_json("c2", "2020-10-12T10:00:00Z", &["c1"]),
        )
        .await;

        let tags = repo_for(&server).fetch_tags().await.unwrap().sorted();
        // Tags on one commit share its time and are ordered by name
        assert_eq!(tags.names(), vec!["v0.2.0-rc.1", "v0.2.0", "stable", "v0.1.0"]);

        page1.assert_async().await;
        page2.assert_async().await;
        c2.assert_async().await;
    }

    #[tokio::test]
    async fn closing_event_is_found_on_a_later_page() {
        let mut server = Server::new_async().await;
        let path = "/repos/octocat/hello/issues/1/events";
        mock_page(
            &mut server,
            path,
            1,
            2,
            json!([
                event_json("labeled", None, "2020-10-10T10:00:00Z"),
                event_json("reopened", None, "2020-10-10T11:00:00Z"),
            ]),
        )
        .await;
        let page2 = mock_page(
            &mut server,
            path,
            2,
            2,
            json!([event_json("closed", None, "2020-10-11T10:00:00Z")]),
        )
        .await;

        let event = repo_for(&server).find_event(1, "closed").await.unwrap().unwrap();
        assert_eq!(event.event, "closed");
        assert_eq!(event.created_at.to_rfc3339(), "2020-10-11T10:00:00+00:00");
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn missing_event_scans_every_page() {
        let mut server = Server::new_async().await;
        let path = "/repos/octocat/hello/issues/2/events";
        for page in 1..=3 {
            mock_page(
                &mut server,
                path,
                page,
                3,
                json!([event_json("closed", None, "2020-10-11T10:00:00Z")]),
            )
            .await;
        }

        let event = repo_for(&server).find_event(2, "merged").await.unwrap();
        assert!(event.is_none());
    }

    #[tokio::test]
    async fn fetch_first_commit_reads_the_last_page() {
        let mut server = Server::new_async().await;
        let path = "/repos/octocat/hello/commits";
        mock_page(
            &mut server,
            path,
            1,
            3,
            json!([commit_json("c9", "2020-10-19T10:00:00Z", &["c8"])]),
        )
        .await;
        let last = mock_page(
            &mut server,
            path,
            3,
            3,
            json!([
                commit_json("c2", "2020-10-11T10:00:00Z", &["c1"]),
                commit_json("c1", "2020-10-10T10:00:00Z", &[]),
            ]),
        )
        .await;

        let repo = repo_for(&server);
        let first = repo.fetch_first_commit().await.unwrap();
        assert_eq!(first.hash, "c1");
        last.assert_async().await;

        // Commits of the last page are cached
        let parents = repo.fetch_parent_commits("c2").await.unwrap();
        let hashes: Vec<_> = parents.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(hashes, vec!["c2", "c1"]);
    }

    #[tokio::test]
    async fn fetch_first_commit_of_a_single_page() {
        let mut server = Server::new_async().await;
        let page1 = mock_page(
            &mut server,
            "/repos/octocat/hello/commits",
            1,
            1,
            json!([
                commit_json("c2", "2020-10-11T10:00:00Z", &["c1"]),
                commit_json("c1", "2020-10-10T10:00:00Z", &[]),
            ]),
        )
        .await;

        let first = repo_for(&server).fetch_first_commit().await.unwrap();
        assert_eq!(first.hash, "c1");
        page1.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_issues_and_merges_across_pages() {
        let mut server = Server::new_async().await;
        let path = "/repos/octocat/hello/issues";
        let issue = |number: u64, closed_at: &str| {
            json!({
                "number": number,
                "title": format!("Issue {}", number),
                "labels": [],
                "milestone": null,
                "user": { "login": "octocat" },
                "html_url": format!("https://github.com/octocat/hello/issues/{}", number),
                "closed_at": closed_at,
            })
        };
        let page1 = mock_page(&mut server, path, 1, 2, json!([issue(1, "2020-10-11T10:00:00Z")])).await;
        let page2 = mock_page(&mut server, path, 2, 2, json!([issue(2, "2020-10-12T10:00:00Z")])).await;
        for (number, closed_at) in [(1, "2020-10-11T10:00:00Z"), (2, "2020-10-12T10:00:00Z")] {
            mock_json(
                &mut server,
                &format!("/repos/octocat/hello/issues/{}/events", number),
                json!([event_json("closed", None, closed_at)]),
            )
            .await;
        }
        mock_json(
            &mut server,
            "/users/octocat",
            json!({ "login": "octocat", "name": "The Octocat", "html_url": "https://github.com/octocat" }),
        )
        .await;

        let (issues, merges) = repo_for(&server).fetch_issues_and_merges(None).await.unwrap();
        let numbers: Vec<_> = issues.iter().map(|i| i.change.number).collect();
        assert_eq!(numbers, vec![2, 1]);
        assert!(merges.is_empty());

        page1.assert_async().await;
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_issues_and_merges() {
        let mut server = Server::new_async().await;
        mock_json(
            &mut server,
            "/repos/octocat/hello/issues",
            json!([
                {
                    "number": 1,
                    "title": "Found a bug",
                    "labels": [{ "name": "bug" }],
                    "milestone": { "title": "v1.0" },
                    "user": { "login": "octocat" },
                    "html_url": "https://github.com/octocat/hello/issues/1",
                    "closed_at": "2020-10-11T10:00:00Z"
                },
                {
                    "number": 2,
                    "title": "Add a feature",
                    "labels": [],
                    "milestone": null,
                    "user": { "login": "octodog" },
                    "html_url": "https://github.com/octocat/hello/pull/2",
                    "closed_at": "2020-10-12T10:00:00Z",
                    "pull_request": { "url": "https://api.github.com/repos/octocat/hello/pulls/2" }
                },
                {
                    "number": 3,
                    "title": "Rejected change",
                    "labels": [],
                    "milestone": null,
                    "user": { "login": "octodog" },
                    "html_url": "https://github.com/octocat/hello/pull/3",
                    "closed_at": "2020-10-13T10:00:00Z",
                    "pull_request": { "url": "https://api.github.com/repos/octocat/hello/pulls/3" }
                }
            ]),
        )
        .await;
        mock_json(
            &mut server,
            "/repos/octocat/hello/issues/1/events",
            json!([
                { "event": "labeled", "actor": { "login": "octocat" }, "commit_id": null, "created_at": "2020-10-10T10:00:00Z" },
                { "event": "closed", "actor": { "login": "octocat" }, "commit_id": null, "created_at": "2020-10-11T10:00:00Z" }
            ]),
        )
        .await;
        mock_json(
            &mut server,
            "/repos/octocat/hello/issues/2/events",
            json!([
                { "event": "merged", "actor": { "login": "octocat" }, "commit_id": "m2", "created_at": "2020-10-12T10:00:00Z" }
            ]),
        )
        .await;
        mock_json(
            &mut server,
            "/repos/octocat/hello/issues/3/events",
            json!([
                { "event": "closed", "actor": { "login": "octocat" }, "commit_id": null, "created_at": "2020-10-13T10:00:00Z" }
            ]),
        )
        .await;
        mock_json(
            &mut server,
            "/repos/octocat/hello/commits/m2",
            commit_json("m2", "2020-10-12T10:00:05Z", &["c1"]),
        )
        .await;
        mock_json(
            &mut server,
            "/users/octocat",
            json!({ "login": "octocat", "name": "The Octocat", "html_url": "https://github.com/octocat" }),
        )
        .await;
        mock_json(
            &mut server,
            "/users/octodog",
            json!({ "login": "octodog", "name": "The Octodog", "html_url": "https://github.com/octodog" }),
        )
        .await;

        let (issues, merges) = repo_for(&server).fetch_issues_and_merges(None).await.unwrap();

        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.change.number, 1);
        assert_eq!(issue.change.labels.0, vec!["bug"]);
        assert_eq!(issue.change.milestone.as_deref(), Some("v1.0"));
        assert_eq!(issue.change.author.name, "The Octocat");
        assert_eq!(issue.closer.username, "octocat");

        assert_eq!(merges.len(), 1);
        let merge = &merges[0];
        assert_eq!(merge.change.number, 2);
        assert_eq!(merge.commit.hash, "m2");
        assert_eq!(merge.change.time, merge.commit.time);
        assert_eq!(merge.change.author.username, "octodog");
        assert_eq!(merge.merger.web_url, "https://github.com/octocat");
    }
}
