use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod changelog;
mod config;
mod error;
mod generator;
mod github;
mod remote;

use changelog::markdown::MarkdownProcessor;
use config::{Config, Grouping, Selection, DEFAULT_CONFIG_FILE};
use generator::Generator;

#[derive(Parser)]
#[command(name = "changelog-generator")]
#[command(about = "Generate a changelog from the tags, issues and merges of a repository")]
struct Cli {
    /// Access token (can also be set via GITHUB_TOKEN env var)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Repository path as owner/name
    #[arg(short, long, env = "GITHUB_REPOSITORY")]
    repo: String,

    /// Hosting platform of the repository
    #[arg(long, default_value = github::PLATFORM)]
    platform: String,

    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add release sections for new tags to the changelog
    Generate(GenerateArgs),

    /// Check the access token can read the repository
    Check,

    /// List tags most recent first, without excluded tags
    Tags,
}

/// Flags overriding the config file.
#[derive(Args)]
struct GenerateArgs {
    /// Changelog file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// File appended to a new changelog
    #[arg(long)]
    base: Option<PathBuf>,

    /// Print the changelog to stdout
    #[arg(short, long)]
    print: bool,

    /// Show debug logs
    #[arg(short, long)]
    verbose: bool,

    /// Oldest tag of the releases to add
    #[arg(long)]
    from_tag: Option<String>,

    /// Most recent tag of the releases to add
    #[arg(long)]
    to_tag: Option<String>,

    /// Name of a tag to be created for unreleased changes
    #[arg(long)]
    future_tag: Option<String>,

    /// Comma-separated list of tags to leave out
    #[arg(long, value_delimiter = ',')]
    exclude_tags: Vec<String>,

    /// Regex matching tags to leave out
    #[arg(long)]
    exclude_tags_regex: Option<String>,

    /// Issue selection (none, all, labeled)
    #[arg(long)]
    issues_selection: Option<Selection>,

    /// Issue grouping (simple, milestone, label)
    #[arg(long)]
    issues_grouping: Option<Grouping>,

    /// Merge selection (none, all, labeled)
    #[arg(long)]
    merges_selection: Option<Selection>,

    /// Merge grouping (simple, milestone, label)
    #[arg(long)]
    merges_grouping: Option<Grouping>,

    /// Branch the merges land on (default branch if not specified)
    #[arg(long)]
    merges_branch: Option<String>,

    /// Release URL with a {tag} placeholder
    #[arg(long)]
    release_url: Option<String>,
}

impl GenerateArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(file) = &self.file {
            config.general.file = file.clone();
        }
        if self.base.is_some() {
            config.general.base = self.base.clone();
        }
        config.general.print |= self.print;
        config.general.verbose |= self.verbose;

        config.tags.from = self.from_tag.clone();
        config.tags.to = self.to_tag.clone();
        config.tags.future = self.future_tag.clone();
        if !self.exclude_tags.is_empty() {
            config.tags.exclude = self.exclude_tags.clone();
        }
        if self.exclude_tags_regex.is_some() {
            config.tags.exclude_regex = self.exclude_tags_regex.clone();
        }

        if let Some(selection) = self.issues_selection {
            config.issues.selection = selection;
        }
        if let Some(grouping) = self.issues_grouping {
            config.issues.grouping = grouping;
        }
        if let Some(selection) = self.merges_selection {
            config.merges.selection = selection;
        }
        if let Some(grouping) = self.merges_grouping {
            config.merges.grouping = grouping;
        }
        if self.merges_branch.is_some() {
            config.merges.branch = self.merges_branch.clone();
        }
        if self.release_url.is_some() {
            config.content.release_url = self.release_url.clone();
        }
    }
}

fn init_logging(config: &Config) {
    let level = if config.general.verbose {
        "debug"
    } else if config.general.print {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Commands::Generate(args) = &cli.command {
        args.apply(&mut config);
    }
    init_logging(&config);

    let remote = github::remote_for(&cli.platform, cli.token, &cli.repo)?;
    let processor = MarkdownProcessor::new(config.general.file.clone(), config.general.base.clone())?;
    let mut generator = Generator::new(remote, Box::new(processor));

    match &cli.command {
        Commands::Generate(_) => {
            let content = generator.generate(&config).await?;
            if content.is_empty() {
                info!("No changes to {}", config.general.file.display());
            } else {
                info!("Changelog written to {}", config.general.file.display());
            }
        }
        Commands::Check => {
            generator.check_permissions().await?;
            println!("✓ {}: access token can read the repository", cli.repo);
        }
        Commands::Tags => {
            let tags = generator.sorted_tags(&config).await?;
            if tags.is_empty() {
                println!("No tags found");
            }
            for tag in tags.iter() {
                println!("{}\t{}\t{}", tag.name, tag.time.format("%Y-%m-%d"), tag.commit.hash);
            }
        }
    }

    Ok(())
}
