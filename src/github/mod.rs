pub mod client;
pub mod types;

pub use client::GitHubRepo;

use crate::error::{ChangelogError, Result};
use crate::remote::RemoteRepository;

pub const PLATFORM: &str = "github";

/// Builds the remote repository client for a hosting platform.
pub fn remote_for(platform: &str, token: String, path: &str) -> Result<Box<dyn RemoteRepository>> {
    match platform.to_lowercase().as_str() {
        PLATFORM => Ok(Box::new(GitHubRepo::new(token, path)?)),
        _ => Err(ChangelogError::UnsupportedPlatform(platform.to_string())),
    }
}
