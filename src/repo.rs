//! Repository references: `OWNER/REPO`, `HOST/OWNER/REPO`, and git remote URLs.

use std::fmt;

use url::Url;

use crate::error::{PullpoError, Result};
use crate::instance::{self, DEFAULT_HOST};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    host: String,
    owner: String,
    name: String,
}

impl RepoRef {
    pub fn new(owner: &str, name: &str) -> Self {
        Self::with_host(owner, name, DEFAULT_HOST)
    }

    pub fn with_host(owner: &str, name: &str, host: &str) -> Self {
        Self {
            host: instance::normalize_hostname(host),
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parse `[HOST/]OWNER/REPO`, a URL, or an scp-style SSH remote, using
    /// the public host when none is given.
    pub fn from_full_name(input: &str) -> Result<Self> {
        Self::from_full_name_with_host(input, DEFAULT_HOST)
    }

    pub fn from_full_name_with_host(input: &str, default_host: &str) -> Result<Self> {
        if input.contains("://") {
            let url = Url::parse(input).map_err(|e| PullpoError::InvalidRepo(e.to_string()))?;
            return Self::from_url(&url);
        }
        if let Some(url) = scp_like_url(input) {
            return Self::from_url(&url);
        }

        let format_error =
            || PullpoError::InvalidRepo(format!(r#"expected the "[HOST/]OWNER/REPO" format, got "{input}""#));

        let parts: Vec<&str> = input.split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(format_error());
        }
        match parts.as_slice() {
            [owner, name] => Ok(Self::with_host(owner, name, default_host)),
            [host, owner, name] => Ok(Self::with_host(owner, name, host)),
            _ => Err(format_error()),
        }
    }

    pub fn from_url(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| PullpoError::InvalidRepo("no hostname detected".to_string()))?;

        let trimmed = url.path().trim_start_matches('/').trim_end_matches('/');
        let parts: Vec<&str> = trimmed.splitn(3, '/').collect();
        match parts.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(Self::with_host(
                owner,
                name.strip_suffix(".git").unwrap_or(name),
                host,
            )),
            _ => Err(PullpoError::InvalidRepo(format!("invalid path: {}", url.path()))),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host == DEFAULT_HOST {
            write!(f, "{}/{}", self.owner, self.name)
        } else {
            write!(f, "{}/{}/{}", self.host, self.owner, self.name)
        }
    }
}

/// `git@host:OWNER/REPO.git` → `ssh://git@host/OWNER/REPO.git`
fn scp_like_url(input: &str) -> Option<Url> {
    let (user_host, path) = input.split_once(':')?;
    if user_host.contains('/') || !user_host.contains('@') {
        return None;
    }
    Url::parse(&format!("ssh://{user_host}/{path}")).ok()
}
