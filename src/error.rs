use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ChangelogError {
    #[error("{kind} can be one of [{}]", choices.join(", "))]
    UnknownTag {
        kind: &'static str,
        name: String,
        choices: Vec<String>,
    },

    #[error("future tag cannot be same as an existing tag: {0}")]
    FutureTagCollision(String),

    #[error("remote fetch failed ({context}): {source}")]
    RemoteFetchFailure {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid repository path {0:?}: expected owner/name")]
    InvalidRepository(String),

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("invalid tag exclusion regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ChangelogError {
    pub fn remote(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ChangelogError::RemoteFetchFailure {
            context: context.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChangelogError>;
