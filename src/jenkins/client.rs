use log::debug;
use reqwest::{Certificate, Client};
use std::time::Duration;
use url::Url;

use crate::error::{ConfigError, DispatchError};
use crate::model::JenkinsSettings;
use crate::parameters::Parameters;

const BUILD: &str = "build";
const BUILD_WITH_PARAMETERS: &str = "buildWithParameters";

/// Everything needed to trigger one job.
#[derive(Debug, Clone, Copy)]
pub struct TriggerJobRequest<'a> {
    pub job_name: &'a str,
    pub cause: &'a str,
    pub token: &'a str,
    pub parameters: &'a Parameters,
}

/// Issues remote trigger requests to a Jenkins instance.
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl JenkinsClient {
    /// Wraps an already configured HTTP client.
    pub fn new(client: Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }

    /// Builds the HTTP client from settings, trusting the extra root
    /// certificate if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate cannot be read or parsed, or the
    /// client cannot be built.
    pub fn from_settings(settings: &JenkinsSettings) -> Result<Self, ConfigError> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));

        if let Some(path) = &settings.tls_cert {
            let tls_error = |reason: String| ConfigError::TlsCertificate {
                path: path.display().to_string(),
                reason,
            };
            let pem = std::fs::read(path).map_err(|e| tls_error(e.to_string()))?;
            let certificate = Certificate::from_pem(&pem).map_err(|e| tls_error(e.to_string()))?;
            builder = builder.add_root_certificate(certificate);
        }

        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self::new(client, settings.url.clone(), settings.timeout))
    }

    /// Builds `{base}/job/{name}/{build|buildWithParameters}?token=..&cause=..[&k=v..]`.
    ///
    /// A job name containing `/` addresses a job inside Jenkins folders,
    /// `team/api` becomes `job/team/job/api`.
    pub fn trigger_url(&self, request: &TriggerJobRequest<'_>) -> Result<Url, DispatchError> {
        let action = if request.parameters.is_empty() {
            BUILD
        } else {
            BUILD_WITH_PARAMETERS
        };

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| DispatchError::InvalidUrl(request.job_name.to_string()))?
            .pop_if_empty()
            .extend(
                request
                    .job_name
                    .split('/')
                    .flat_map(|segment| ["job", segment]),
            )
            .push(action);

        {
            let mut query = url.query_pairs_mut();
            query
                .clear()
                .append_pair("token", request.token)
                .append_pair("cause", request.cause);
            for (key, value) in request.parameters.iter() {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Triggers a single job. The response body is ignored.
    ///
    /// Transport errors carry no URL, the query holds the job token.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout or a non-2xx status.
    pub async fn trigger_job(&self, request: &TriggerJobRequest<'_>) -> Result<(), DispatchError> {
        let url = self.trigger_url(request)?;
        debug!("Triggering job {} at {}", request.job_name, url.path());

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::BadResponseStatus {
                job: request.job_name.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}
