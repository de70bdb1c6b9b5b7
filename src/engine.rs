use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::classify::classify;
use crate::error::LookupError;
use crate::jenkins::{Dispatcher, TriggerOutcome};
use crate::matcher::matches;
use crate::model::{CompiledConfig, Job, Repository};

/// Every job of `repository` that fires for a push to `ref_`.
///
/// Each project sees only its own slice of `changed_files`; jobs from several
/// projects may fire for the same push. Order follows the configuration.
pub fn matching_jobs<'a>(
    repository: &'a Repository,
    ref_: &str,
    changed_files: &[String],
) -> Vec<&'a Job> {
    repository
        .projects
        .iter()
        .flat_map(|project| {
            let relative_files = classify(project, changed_files);
            project.jobs.iter().filter(move |job| {
                let fires = matches(job, ref_, &relative_files);
                debug!(
                    "Job {} in project '{}': {}",
                    job.name,
                    project.path,
                    if fires { "fires" } else { "skipped" }
                );
                fires
            })
        })
        .collect()
}

/// What happened to one push.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub repository: String,
    #[serde(rename = "ref")]
    pub ref_: String,
    pub triggered_at: DateTime<Utc>,
    pub outcomes: Vec<TriggerOutcome>,
}

impl DispatchReport {
    /// True when no trigger failed, including when nothing matched.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.succeeded)
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|outcome| !outcome.succeeded).count()
    }
}

/// Looks up, classifies, matches and dispatches a single push.
#[derive(Debug, Clone)]
pub struct TriggerEngine {
    config: Arc<CompiledConfig>,
    dispatcher: Dispatcher,
}

impl TriggerEngine {
    pub fn new(config: Arc<CompiledConfig>, dispatcher: Dispatcher) -> Self {
        Self { config, dispatcher }
    }

    pub fn config(&self) -> &CompiledConfig {
        &self.config
    }

    /// Jobs that would fire, without triggering anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is not configured.
    pub fn plan(
        &self,
        repository: &str,
        ref_: &str,
        changed_files: &[String],
    ) -> Result<Vec<&Job>, LookupError> {
        let repo = self
            .config
            .lookup(repository)
            .ok_or_else(|| LookupError::UnknownRepository(repository.to_string()))?;

        Ok(matching_jobs(repo, ref_, changed_files))
    }

    /// Triggers every matching job and reports each outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is not configured, in which case
    /// nothing is triggered.
    pub async fn trigger(
        &self,
        repository: &str,
        ref_: &str,
        changed_files: &[String],
        cause: &str,
    ) -> Result<DispatchReport, LookupError> {
        let jobs = self
            .plan(repository, ref_, changed_files)
            .inspect_err(|e| warn!("{e}"))?;

        info!(
            "Push to {repository} {ref_} changed {} files, {} jobs matched",
            changed_files.len(),
            jobs.len()
        );

        let outcomes = self.dispatcher.dispatch(&jobs, cause).await;

        Ok(DispatchReport {
            repository: repository.to_string(),
            ref_: ref_.to_string(),
            triggered_at: Utc::now(),
            outcomes,
        })
    }
}
