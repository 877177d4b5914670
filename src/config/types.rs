use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub tags: TagsConfig,
    pub issues: IssuesConfig,
    pub merges: MergesConfig,
    pub content: ContentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub file: PathBuf,
    pub base: Option<PathBuf>,
    pub print: bool,
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            file: PathBuf::from("CHANGELOG.md"),
            base: None,
            print: false,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    /// Only settable from the command line.
    #[serde(skip)]
    pub from: Option<String>,
    #[serde(skip)]
    pub to: Option<String>,
    #[serde(skip)]
    pub future: Option<String>,
    pub exclude: Vec<String>,
    pub exclude_regex: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    None,
    All,
    Labeled,
}

impl FromStr for Selection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Selection::None),
            "all" => Ok(Selection::All),
            "labeled" => Ok(Selection::Labeled),
            _ => Err(format!("Unknown selection: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    Simple,
    Milestone,
    Label,
}

impl FromStr for Grouping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(Grouping::Simple),
            "milestone" => Ok(Grouping::Milestone),
            "label" => Ok(Grouping::Label),
            _ => Err(format!("Unknown grouping: {}", s)),
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grouping::Simple => write!(f, "simple"),
            Grouping::Milestone => write!(f, "milestone"),
            Grouping::Label => write!(f, "label"),
        }
    }
}

/// A titled group of changes characterized by a set of labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGroup {
    pub title: String,
    pub labels: Vec<String>,
}

/// Selection and grouping rules for one kind of change, shared by issues and merges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRules {
    pub selection: Selection,
    pub include_labels: Vec<String>,
    pub exclude_labels: Vec<String>,
    pub grouping: Grouping,
    pub label_groups: Vec<LabelGroup>,
}

const GROUP_TITLES: [&str; 8] = [
    "Release Summary",
    "Removed",
    "Breaking Changes",
    "Deprecated",
    "New Features",
    "Enhancements",
    "Fixed Bugs",
    "Security Fixes",
];

const ISSUE_LABELS: [&[&str]; 8] = [
    &["summary", "release-summary"],
    &["removed"],
    &["breaking", "backward-incompatible"],
    &["deprecated"],
    &["feature"],
    &["enhancement"],
    &["bug"],
    &["security"],
];

const MERGE_LABELS: [&[&str]; 8] = [&[]; 8];

/// Labels of each label group, in `[issues]` or `[merges]`.
///
/// A list left out of the config file falls back to the defaults of its
/// change kind, so setting one list keeps the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelLists {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breaking_labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated_labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhancement_labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bug_labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_labels: Option<Vec<String>>,
}

impl LabelLists {
    /// Label groups in rendering order; groups without labels are left out.
    fn groups(&self, defaults: &[&[&str]; 8]) -> Vec<LabelGroup> {
        let lists = [
            &self.summary_labels,
            &self.removed_labels,
            &self.breaking_labels,
            &self.deprecated_labels,
            &self.feature_labels,
            &self.enhancement_labels,
            &self.bug_labels,
            &self.security_labels,
        ];

        GROUP_TITLES
            .iter()
            .zip(lists)
            .zip(defaults)
            .map(|((title, list), default)| LabelGroup {
                title: title.to_string(),
                labels: list.clone().unwrap_or_else(|| labels(default)),
            })
            .filter(|group| !group.labels.is_empty())
            .collect()
    }

    fn rules(
        &self,
        selection: Selection,
        include_labels: &[String],
        exclude_labels: &[String],
        grouping: Grouping,
        defaults: &[&[&str]; 8],
    ) -> ChangeRules {
        ChangeRules {
            selection,
            include_labels: include_labels.to_vec(),
            exclude_labels: exclude_labels.to_vec(),
            grouping,
            label_groups: self.groups(defaults),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuesConfig {
    pub selection: Selection,
    pub include_labels: Vec<String>,
    pub exclude_labels: Vec<String>,
    pub grouping: Grouping,
    #[serde(flatten)]
    pub labels: LabelLists,
}

impl IssuesConfig {
    pub fn rules(&self) -> ChangeRules {
        self.labels.rules(
            self.selection,
            &self.include_labels,
            &self.exclude_labels,
            self.grouping,
            &ISSUE_LABELS,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergesConfig {
    pub selection: Selection,
    /// Branch the merges land on; the default branch when unset.
    pub branch: Option<String>,
    pub include_labels: Vec<String>,
    pub exclude_labels: Vec<String>,
    pub grouping: Grouping,
    #[serde(flatten)]
    pub labels: LabelLists,
}

impl MergesConfig {
    pub fn rules(&self) -> ChangeRules {
        self.labels.rules(
            self.selection,
            &self.include_labels,
            &self.exclude_labels,
            self.grouping,
            &MERGE_LABELS,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// External release URL with a `{tag}` placeholder.
    pub release_url: Option<String>,
}

impl ContentConfig {
    pub fn release_url(&self, tag: &str) -> String {
        self.release_url
            .as_deref()
            .map(|url| url.replacen("{tag}", tag, 1))
            .unwrap_or_default()
    }
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl Default for IssuesConfig {
    fn default() -> Self {
        IssuesConfig {
            selection: Selection::All,
            include_labels: vec![],
            exclude_labels: labels(&["duplicate", "invalid", "question", "wontfix"]),
            grouping: Grouping::Label,
            labels: LabelLists::default(),
        }
    }
}

impl Default for MergesConfig {
    fn default() -> Self {
        MergesConfig {
            selection: Selection::All,
            branch: None,
            include_labels: vec![],
            exclude_labels: vec![],
            grouping: Grouping::Simple,
            labels: LabelLists::default(),
        }
    }
}
