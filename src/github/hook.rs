use serde::Deserialize;

use crate::error::HookError;

/// Header GitHub uses to name the event type.
pub const EVENT_HEADER: &str = "X-GitHub-Event";

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// A hook request sent by GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hook {
    Push(Push),
    Ping,
}

/// A push hook from GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Push {
    #[serde(rename = "ref")]
    pub ref_: String,
    pub before: String,
    pub after: String,
    /// Set when the push deleted the ref
    #[serde(default)]
    pub deleted: bool,
    pub repository: Repository,
    pub pusher: Pusher,
}

/// The person who pushed the changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pusher {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Owner,
}

/// GitHub fills `name` for push payloads and `login` elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Owner {
    #[serde(alias = "login")]
    pub name: String,
}

impl Push {
    /// The pushed ref with `refs/heads/` removed. Tags and other refs are
    /// returned untouched.
    pub fn branch(&self) -> &str {
        self.ref_
            .strip_prefix(BRANCH_REF_PREFIX)
            .unwrap_or(&self.ref_)
    }

    /// Human readable reason passed along to Jenkins.
    pub fn cause(&self) -> String {
        let short_sha = self.after.get(..7).unwrap_or(&self.after);
        format!(
            "Push by {} to {}/{} {} ({})",
            self.pusher.name,
            self.repository.owner.name,
            self.repository.name,
            self.branch(),
            short_sha
        )
    }
}

/// Parses a hook body according to its event header value.
///
/// # Errors
///
/// Returns an error for events other than `push` and `ping`, or for a push
/// body that does not decode.
pub fn parse(event: &str, body: &[u8]) -> Result<Hook, HookError> {
    match event {
        "push" => Ok(Hook::Push(serde_json::from_slice(body)?)),
        "ping" => Ok(Hook::Ping),
        other => Err(HookError::UnsupportedEvent(other.to_string())),
    }
}
