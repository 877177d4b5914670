pub mod change_filter;
pub mod partitioner;
pub mod release_assembler;
pub mod revision_index;
pub mod tag_resolver;

#[cfg(test)]
pub(crate) mod testing;

use regex::Regex;
use tracing::{debug, info};

use crate::changelog::Processor;
use crate::config::Config;
use crate::error::Result;
use crate::remote::{RemoteRepository, Tags};
use partitioner::{partition_issues, partition_merges};
use release_assembler::ReleaseAssembler;
use revision_index::build_index;
use tag_resolver::resolve_tags;

/// Drives a changelog update from a remote repository.
pub struct Generator {
    remote: Box<dyn RemoteRepository>,
    processor: Box<dyn Processor>,
}

impl Generator {
    pub fn new(remote: Box<dyn RemoteRepository>, processor: Box<dyn Processor>) -> Self {
        Self { remote, processor }
    }

    pub async fn check_permissions(&self) -> Result<()> {
        self.remote.check_permissions().await
    }

    /// Tags of the remote repository, most recent first, without excluded tags.
    pub async fn sorted_tags(&self, config: &Config) -> Result<Tags> {
        let tags = self.remote.fetch_tags().await?;

        debug!("Sorting and filtering {} tags ...", tags.len());
        let mut sorted = tags.sorted().exclude(&config.tags.exclude);
        if let Some(pattern) = config.tags.exclude_regex.as_deref() {
            sorted = sorted.exclude_regex(&Regex::new(pattern)?);
        }

        Ok(sorted)
    }

    /// Adds release sections for new tags and returns the rendered changelog.
    ///
    /// Returns an empty string and leaves the changelog untouched when there is
    /// no new tag to release.
    pub async fn generate(&mut self, config: &Config) -> Result<String> {
        let mut changelog = self.processor.parse()?;

        self.remote.check_permissions().await?;

        let branch = match config.merges.branch.as_deref() {
            Some(name) => self.remote.fetch_branch(name).await?,
            None => self.remote.fetch_default_branch().await?,
        };

        let sorted = self.sorted_tags(config).await?;

        let new_tags = resolve_tags(&sorted, &changelog.existing, &config.tags, |name| {
            self.remote.future_tag(name)
        })?;
        if new_tags.is_empty() {
            info!("Changelog is up-to-date (no new tag or future tag)");
            return Ok(String::new());
        }

        let base_rev = match changelog.existing.first() {
            Some(release) => release.tag_name.clone(),
            None => self.remote.fetch_first_commit().await?.hash,
        };
        debug!("Base revision for new releases: {}", base_rev);

        let index = build_index(self.remote.as_ref(), &branch, &sorted).await?;

        let since = changelog.existing.first().map(|r| r.tag_time);
        let (issues, merges) = self.remote.fetch_issues_and_merges(since).await?;

        let issue_rules = config.issues.rules();
        let merge_rules = config.merges.rules();
        let issues = change_filter::select(issues, &issue_rules);
        let merges = change_filter::select(merges, &merge_rules);
        info!(
            "Selected issues ({}) and merges ({}) by labels",
            issues.len(),
            merges.len()
        );

        // Only a synthesized future tag collects unreleased changes
        let future = config.tags.future.as_ref().and(new_tags.first());
        let issues = partition_issues(issues, &sorted, future);
        let merges = partition_merges(merges, &index, future);
        info!("Partitioned issues and merges by tag");

        let assembler = ReleaseAssembler {
            issues: issue_rules,
            merges: merge_rules,
            content: &config.content,
        };
        changelog.new = assembler.assemble(self.remote.as_ref(), &new_tags, &base_rev, &issues, &merges);
        info!("Assembled {} new releases", changelog.new.len());

        let content = self.processor.render(&changelog)?;
        if config.general.print {
            print!("{}", content);
        }

        Ok(content)
    }
}
