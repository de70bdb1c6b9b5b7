use log::warn;
use regex::Regex;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::config::{RawConfig, RawJob, RawProject, RawRepository};
use crate::error::{ConfigError, MatcherKind};
use crate::parameters::Parameters;
use crate::secrets::Secrets;

/// Validated configuration with secrets resolved and patterns compiled.
///
/// Immutable once built. Share it behind an `Arc` between requests.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub jenkins: JenkinsSettings,
    pub github: GitHubSettings,
    pub listen: SocketAddr,
    pub repositories: Vec<Repository>,
}

#[derive(Debug, Clone)]
pub struct JenkinsSettings {
    pub url: Url,
    pub tls_cert: Option<PathBuf>,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct GitHubSettings {
    pub api_url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Repository {
    pub name: String,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone)]
pub struct Project {
    /// Literal prefix of the changed file paths owned by this project
    pub path: String,
    pub jobs: Vec<Job>,
}

/// A Jenkins job together with the conditions under which it fires.
#[derive(Clone)]
pub struct Job {
    pub name: String,
    pub parameters: Parameters,
    /// Resolved trigger token, never the secret key
    pub token: String,
    /// Anchored at both ends, must match the whole ref
    pub branch_matcher: Regex,
    /// Searched for anywhere in each project relative path
    pub diff_matcher: Regex,
}

impl Job {
    /// The branch pattern as written in the configuration.
    pub fn branch_pattern(&self) -> &str {
        let anchored = self.branch_matcher.as_str();
        anchored
            .strip_prefix("^(?:")
            .and_then(|rest| rest.strip_suffix(")$"))
            .unwrap_or(anchored)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("token", &"<redacted>")
            .field("branch_matcher", &self.branch_matcher.as_str())
            .field("diff_matcher", &self.diff_matcher.as_str())
            .finish()
    }
}

impl fmt::Debug for GitHubSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubSettings")
            .field("api_url", &self.api_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CompiledConfig {
    /// Compiles the raw configuration, failing on the first invalid job.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A job's token key is absent from `secrets`
    /// - A branch or diff pattern is not a valid regex
    /// - A parameter expression is malformed
    /// - The Jenkins or GitHub URL cannot be parsed
    /// - A timeout is zero
    pub fn compile(raw: &RawConfig, secrets: &Secrets) -> Result<Self, ConfigError> {
        let repositories = raw
            .repositories
            .iter()
            .map(|repo| compile_repository(repo, secrets))
            .collect::<Result<Vec<_>, _>>()?;

        let github_token = match &raw.github.token_key {
            Some(key) => Some(
                secrets
                    .get(key)
                    .ok_or_else(|| ConfigError::MissingGitHubToken(key.clone()))?
                    .to_string(),
            ),
            None => None,
        };

        Ok(Self {
            jenkins: JenkinsSettings {
                url: parse_url(&raw.jenkins.url)?,
                tls_cert: raw.jenkins.tls_cert.clone(),
                timeout: parse_timeout("jenkins", raw.jenkins.timeout_secs)?,
            },
            github: GitHubSettings {
                api_url: parse_url(&raw.github.api_url)?,
                token: github_token,
                timeout: parse_timeout("github", raw.github.timeout_secs)?,
            },
            listen: raw.server.listen,
            repositories,
        })
    }

    /// Exact, case-sensitive repository lookup.
    pub fn lookup(&self, name: &str) -> Option<&Repository> {
        self.repositories.iter().find(|repo| repo.name == name)
    }

    pub fn job_count(&self) -> usize {
        self.repositories
            .iter()
            .flat_map(|repo| &repo.projects)
            .map(|project| project.jobs.len())
            .sum()
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

fn parse_timeout(section: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidTimeout(section));
    }
    Ok(Duration::from_secs(secs))
}

fn compile_repository(raw: &RawRepository, secrets: &Secrets) -> Result<Repository, ConfigError> {
    warn_overlapping_projects(raw);

    let projects = raw
        .projects
        .iter()
        .map(|project| compile_project(project, secrets))
        .collect::<Result<_, _>>()?;

    Ok(Repository {
        name: raw.name.clone(),
        projects,
    })
}

fn compile_project(raw: &RawProject, secrets: &Secrets) -> Result<Project, ConfigError> {
    let jobs = raw
        .jobs
        .iter()
        .map(|job| compile_job(job, secrets))
        .collect::<Result<_, _>>()?;

    Ok(Project {
        path: raw.path.clone(),
        jobs,
    })
}

fn compile_job(raw: &RawJob, secrets: &Secrets) -> Result<Job, ConfigError> {
    let branch_matcher =
        Regex::new(&format!("^(?:{})$", raw.branch_matcher)).map_err(|source| {
            ConfigError::InvalidPattern {
                job: raw.name.clone(),
                matcher: MatcherKind::Branch,
                source,
            }
        })?;

    let diff_matcher =
        Regex::new(&raw.diff_matcher).map_err(|source| ConfigError::InvalidPattern {
            job: raw.name.clone(),
            matcher: MatcherKind::Diff,
            source,
        })?;

    let token = secrets
        .get(&raw.token_key)
        .ok_or_else(|| ConfigError::MissingSecret {
            job: raw.name.clone(),
            key: raw.token_key.clone(),
        })?
        .to_string();

    let parameters =
        Parameters::try_from(&raw.parameters).map_err(|reason| ConfigError::InvalidParameters {
            job: raw.name.clone(),
            reason,
        })?;

    Ok(Job {
        name: raw.name.clone(),
        parameters,
        token,
        branch_matcher,
        diff_matcher,
    })
}

/// Overlapping prefixes are allowed, a single file may then fire jobs in
/// several projects. Worth a warning since it is rarely intended.
fn warn_overlapping_projects(raw: &RawRepository) {
    for (i, outer) in raw.projects.iter().enumerate() {
        for inner in raw.projects.iter().skip(i + 1) {
            if outer.path.starts_with(&inner.path) || inner.path.starts_with(&outer.path) {
                warn!(
                    "Projects '{}' and '{}' in repository {} overlap, a change may trigger jobs in both",
                    outer.path, inner.path, raw.name
                );
            }
        }
    }
}
