use chrono::{NaiveDate, TimeZone, Utc};
use handlebars::Handlebars;
use regex::Regex;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, info};

use super::{Changelog, Processor, Release, User};
use crate::error::Result;

const TEMPLATE_NAME: &str = "changelog";

const NOTICE: &str = "**DO NOT MODIFY THIS FILE!**\n*This changelog is automatically generated by changelog-generator*\n";

/// Markdown changelog file reader and writer.
pub struct MarkdownProcessor {
    changelog_file: PathBuf,
    base_file: Option<PathBuf>,
    /// Raw content of the changelog file as last parsed.
    content: String,
    template_engine: Handlebars<'static>,
    title_re: Regex,
    release_re: Regex,
}

impl MarkdownProcessor {
    pub fn new(changelog_file: PathBuf, base_file: Option<PathBuf>) -> Result<Self> {
        let mut template_engine = Handlebars::new();
        template_engine.register_escape_fn(handlebars::no_escape);
        template_engine.set_strict_mode(false);
        template_engine
            .register_template_string(TEMPLATE_NAME, include_str!("../../templates/changelog.md.hbs"))?;

        Ok(Self {
            changelog_file,
            base_file,
            content: String::new(),
            template_engine,
            title_re: Regex::new(r"(?m)^# (.+?)\s*$")?,
            release_re: Regex::new(r"(?m)^## \[([^\]]+)\]\(([^)]*)\) \((\d{4}-\d{2}-\d{2})\)\s*$")?,
        })
    }

    fn parse_content(&self, content: &str) -> Changelog {
        let mut changelog = Changelog::default();

        if let Some(cap) = self.title_re.captures(content) {
            changelog.title = cap[1].to_string();
        }

        for cap in self.release_re.captures_iter(content) {
            let tag_time = NaiveDate::parse_from_str(&cap[3], "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt))
                .unwrap_or_default();

            changelog.existing.push(Release {
                tag_name: cap[1].to_string(),
                tag_url: cap[2].to_string(),
                tag_time,
                ..Default::default()
            });
        }

        changelog
    }

    /// Everything from the first release heading onwards, kept as written.
    fn existing_section(&self) -> &str {
        match self.release_re.find(&self.content) {
            Some(m) => &self.content[m.start()..],
            None => "",
        }
    }

    fn render_releases(&self, releases: &[Release]) -> Result<String> {
        let data = json!({
            "releases": releases.iter().map(release_data).collect::<Vec<_>>(),
        });
        Ok(self.template_engine.render(TEMPLATE_NAME, &data)?)
    }
}

fn user_link(user: &User) -> String {
    if user.url.is_empty() {
        user.username.clone()
    } else {
        format!("[{}]({})", user.username, user.url)
    }
}

fn users_data(users: &[&User]) -> String {
    let mut seen: Vec<&str> = Vec::new();
    let mut links = Vec::new();
    for user in users {
        if user.username.is_empty() || seen.contains(&user.username.as_str()) {
            continue;
        }
        seen.push(&user.username);
        links.push(user_link(user));
    }
    links.join(", ")
}

fn release_data(release: &Release) -> Value {
    let mut groups: Vec<Value> = Vec::new();

    for group in &release.issue_groups {
        groups.push(json!({
            "title": group.title,
            "items": group.issues.iter().map(|i| json!({
                "title": i.title,
                "number": i.number,
                "url": i.url,
                "users": users_data(&[&i.opened_by, &i.closed_by]),
            })).collect::<Vec<_>>(),
        }));
    }

    for group in &release.merge_groups {
        groups.push(json!({
            "title": group.title,
            "items": group.merges.iter().map(|m| json!({
                "title": m.title,
                "number": m.number,
                "url": m.url,
                "users": users_data(&[&m.opened_by, &m.merged_by]),
            })).collect::<Vec<_>>(),
        }));
    }

    json!({
        "tag_name": release.tag_name,
        "tag_url": release.tag_url,
        "date": release.tag_time.format("%Y-%m-%d").to_string(),
        "release_url": release.release_url,
        "compare_url": release.compare_url,
        "groups": groups,
    })
}

/// Collapses blank-line runs and drops blank lines between list items.
fn tidy(rendered: &str) -> String {
    let lines: Vec<&str> = rendered.lines().collect();
    let is_item = |l: &str| l.starts_with("  - ");
    let mut out: Vec<&str> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            let prev = out.last().copied();
            let next = lines[i + 1..].iter().find(|l| !l.trim().is_empty()).copied();
            let between_items = matches!((prev, next), (Some(p), Some(n)) if is_item(p) && is_item(n));
            if prev.map_or(true, |p| p.is_empty()) || between_items {
                continue;
            }
            out.push("");
        } else {
            out.push(line);
        }
    }

    let mut result = out.join("\n");
    result.push('\n');
    result
}

impl Processor for MarkdownProcessor {
    fn parse(&mut self) -> Result<Changelog> {
        if !self.changelog_file.exists() {
            debug!("No changelog at {}, starting a new one", self.changelog_file.display());
            self.content.clear();
            return Ok(Changelog::default());
        }

        self.content = std::fs::read_to_string(&self.changelog_file)?;
        let changelog = self.parse_content(&self.content);

        info!(
            "Parsed {}: {} existing release(s)",
            self.changelog_file.display(),
            changelog.existing.len()
        );
        Ok(changelog)
    }

    fn render(&mut self, changelog: &Changelog) -> Result<String> {
        let releases = self.render_releases(&changelog.new)?;

        let previous = if self.content.is_empty() {
            match &self.base_file {
                Some(base) if base.exists() => std::fs::read_to_string(base)?,
                _ => String::new(),
            }
        } else {
            self.existing_section().to_string()
        };

        // Only the generated part is tidied; earlier sections are kept as written
        let header = format!("# {}\n\n{}\n\n{}", changelog.title, NOTICE, releases);
        let mut output = tidy(&header).trim_end().to_string();
        output.push('\n');
        if !previous.is_empty() {
            output.push('\n');
            output.push_str(&previous);
        }

        std::fs::write(&self.changelog_file, &output)?;
        self.content = output.clone();

        info!("Changelog written to {}", self.changelog_file.display());
        Ok(output)
    }
}
