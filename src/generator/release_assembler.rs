use tracing::debug;

use super::partitioner::Partition;
use crate::changelog::{self, IssueGroup, MergeGroup, Release};
use crate::config::types::ContentConfig;
use crate::config::{ChangeRules, Grouping};
use crate::remote::{self, milestones, Changeable, RemoteRepository, Tags};

pub const ISSUES_CATCH_ALL: &str = "Closed Issues";
pub const MERGES_CATCH_ALL: &str = "Merged Changes";

/// Moves the changes matching `f` out of `unselected` into a new group.
fn take<T>(groups: &mut Vec<(String, Vec<T>)>, unselected: &mut Vec<T>, title: String, f: impl Fn(&T) -> bool) {
    let (selected, rest): (Vec<T>, Vec<T>) = unselected.drain(..).partition(|i| f(i));
    *unselected = rest;
    if !selected.is_empty() {
        groups.push((title, selected));
    }
}

/// Splits changes into titled groups following the grouping rules.
///
/// Milestone and label groups come first, in discovery and rule order.
/// Each change lands in exactly one group; changes no group claims end up
/// in a final `catch_all` group. Empty groups are never emitted.
pub fn group<T: Changeable + Clone>(items: &[T], rules: &ChangeRules, catch_all: &str) -> Vec<(String, Vec<T>)> {
    let mut groups = Vec::new();
    let mut unselected: Vec<T> = items.to_vec();

    match rules.grouping {
        Grouping::Simple => {}
        Grouping::Milestone => {
            for milestone in milestones(items) {
                let title = format!("Milestone {}", milestone);
                take(&mut groups, &mut unselected, title, |i| {
                    i.change().milestone.as_deref() == Some(milestone.as_str())
                });
            }
        }
        Grouping::Label => {
            for label_group in &rules.label_groups {
                take(&mut groups, &mut unselected, label_group.title.clone(), |i| {
                    i.change().labels.any(&label_group.labels)
                });
            }
        }
    }

    if !unselected.is_empty() {
        groups.push((catch_all.to_string(), unselected));
    }

    groups
}

impl From<&remote::Issue> for changelog::Issue {
    fn from(i: &remote::Issue) -> Self {
        changelog::Issue {
            number: i.change.number,
            title: i.change.title.clone(),
            url: i.change.web_url.clone(),
            opened_by: (&i.change.author).into(),
            closed_by: (&i.closer).into(),
        }
    }
}

impl From<&remote::Merge> for changelog::Merge {
    fn from(m: &remote::Merge) -> Self {
        changelog::Merge {
            number: m.change.number,
            title: m.change.title.clone(),
            url: m.change.web_url.clone(),
            opened_by: (&m.change.author).into(),
            merged_by: (&m.merger).into(),
        }
    }
}

/// Builds release sections from partitioned changes.
pub struct ReleaseAssembler<'a> {
    pub issues: ChangeRules,
    pub merges: ChangeRules,
    pub content: &'a ContentConfig,
}

impl<'a> ReleaseAssembler<'a> {
    /// One release per tag in `new_tags`, most recent first.
    ///
    /// Each release is compared against the next older new tag, and the
    /// oldest against `base_rev`.
    pub fn assemble<R>(
        &self,
        remote: &R,
        new_tags: &Tags,
        base_rev: &str,
        issues: &Partition<remote::Issue>,
        merges: &Partition<remote::Merge>,
    ) -> Vec<Release>
    where
        R: RemoteRepository + ?Sized,
    {
        new_tags
            .iter()
            .enumerate()
            .map(|(i, tag)| {
                let base = new_tags.get(i + 1).map(|t| t.name.as_str()).unwrap_or(base_rev);

                let issue_groups = issues
                    .get(&tag.name)
                    .map(|items| {
                        debug!("Grouping {} issues of {} by {}", items.len(), tag.name, self.issues.grouping);
                        group(items, &self.issues, ISSUES_CATCH_ALL)
                            .into_iter()
                            .map(|(title, items)| IssueGroup {
                                title,
                                issues: items.iter().map(Into::into).collect(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                let merge_groups = merges
                    .get(&tag.name)
                    .map(|items| {
                        debug!("Grouping {} merges of {} by {}", items.len(), tag.name, self.merges.grouping);
                        group(items, &self.merges, MERGES_CATCH_ALL)
                            .into_iter()
                            .map(|(title, items)| MergeGroup {
                                title,
                                merges: items.iter().map(Into::into).collect(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                Release {
                    tag_name: tag.name.clone(),
                    tag_url: tag.web_url.clone(),
                    tag_time: tag.time,
                    release_url: self.content.release_url(&tag.name),
                    compare_url: remote.compare_url(base, &tag.name),
                    issue_groups,
                    merge_groups,
                }
            })
            .collect()
    }
}
