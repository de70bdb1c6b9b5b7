use log::{info, warn};
use serde::Serialize;

use super::client::{JenkinsClient, TriggerJobRequest};
use crate::error::DispatchError;
use crate::model::Job;

/// Result of one trigger attempt.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerOutcome {
    pub job: String,
    pub succeeded: bool,
    /// Present iff the trigger failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TriggerOutcome {
    fn from_result(job: &Job, result: Result<(), DispatchError>) -> Self {
        match result {
            Ok(()) => Self {
                job: job.name.clone(),
                succeeded: true,
                error: None,
            },
            Err(e) => Self {
                job: job.name.clone(),
                succeeded: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Fires matched jobs against Jenkins.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: JenkinsClient,
}

impl Dispatcher {
    pub fn new(client: JenkinsClient) -> Self {
        Self { client }
    }

    /// Triggers every job concurrently and waits for all of them.
    ///
    /// Outcomes come back in the order of `jobs`. A failing job never stops
    /// or cancels its siblings, and nothing is retried.
    pub async fn dispatch(&self, jobs: &[&Job], cause: &str) -> Vec<TriggerOutcome> {
        let futures: Vec<_> = jobs.iter().map(|job| self.trigger(job, cause)).collect();

        futures::future::join_all(futures).await
    }

    async fn trigger(&self, job: &Job, cause: &str) -> TriggerOutcome {
        let request = TriggerJobRequest {
            job_name: &job.name,
            cause,
            token: &job.token,
            parameters: &job.parameters,
        };

        let result = self.client.trigger_job(&request).await;
        match &result {
            Ok(()) => info!("Triggered job {}", job.name),
            Err(e) => warn!("Failed to trigger job {}: {e}", job.name),
        }

        TriggerOutcome::from_result(job, result)
    }
}
