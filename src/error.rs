use thiserror::Error;

/// Which of a job's two patterns failed to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    Branch,
    Diff,
}

impl std::fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Branch => f.write_str("branch-matcher"),
            Self::Diff => f.write_str("diff-matcher"),
        }
    }
}

/// Raised while compiling the raw configuration. Always fatal to startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {matcher} for job '{job}': {source}")]
    InvalidPattern {
        job: String,
        matcher: MatcherKind,
        #[source]
        source: regex::Error,
    },

    #[error("Token with key '{key}' not found for job '{job}'")]
    MissingSecret { job: String, key: String },

    #[error("Invalid parameters for job '{job}': {reason}")]
    InvalidParameters { job: String, reason: String },

    #[error("GitHub token with key '{0}' not found in secrets")]
    MissingGitHubToken(String),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Timeout for {0} must be at least one second")]
    InvalidTimeout(&'static str),

    #[error("Failed to read TLS certificate {path}: {reason}")]
    TlsCertificate { path: String, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LookupError {
    #[error("Repository {0} is not registered")]
    UnknownRepository(String),
}

/// Failure of a single trigger call. Captured per job, never propagated.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Received error response status {status} for job '{job}'")]
    BadResponseStatus { job: String, status: u16 },

    #[error("Cannot build trigger URL for job '{0}'")]
    InvalidUrl(String),
}

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Bad response from compare API: {0}")]
    BadResponseStatus(u16),

    #[error("Cannot build compare URL from API URL {0}")]
    InvalidUrl(String),
}

#[derive(Error, Debug)]
pub enum HookError {
    #[error("Unrecognised hook type: {0}")]
    UnsupportedEvent(String),

    #[error("Malformed push payload: {0}")]
    Json(#[from] serde_json::Error),
}
