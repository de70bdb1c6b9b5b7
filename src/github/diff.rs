use log::debug;
use regex::Regex;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

use super::hook::Push;
use crate::error::{ConfigError, DiffError};
use crate::model::GitHubSettings;

const DIFF_MEDIA_TYPE: &str = "application/vnd.github.VERSION.diff";

fn diff_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^diff --git ").expect("valid diff header regex"))
}

fn changed_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s[ab]/(\S+)").expect("valid changed file regex"))
}

/// Fetches push diffs from the GitHub compare API.
#[derive(Clone)]
pub struct DiffClient {
    client: Client,
    api_url: Url,
    token: Option<String>,
    timeout: Duration,
}

impl DiffClient {
    pub fn new(client: Client, api_url: Url, token: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            api_url,
            token,
            timeout,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_settings(settings: &GitHubSettings) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self::new(
            client,
            settings.api_url.clone(),
            settings.token.clone(),
            settings.timeout,
        ))
    }

    fn compare_url(&self, push: &Push) -> Result<Url, DiffError> {
        let range = format!("{}...{}", push.before, push.after);
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| DiffError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend([
                "repos",
                push.repository.owner.name.as_str(),
                push.repository.name.as_str(),
                "compare",
                range.as_str(),
            ]);
        Ok(url)
    }

    /// Lists the files changed between `before` and `after` of the push,
    /// deduplicated, in the order they appear in the diff.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn changed_files(&self, push: &Push) -> Result<Vec<String>, DiffError> {
        let url = self.compare_url(push)?;
        debug!("Requesting diff from {url}");

        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, DIFF_MEDIA_TYPE)
            .timeout(self.timeout);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiffError::BadResponseStatus(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(extract_changed_files(&body))
    }
}

/// Pulls both sides of every `diff --git a/X b/Y` header line.
pub fn extract_changed_files(diff: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut changed_files = Vec::new();

    for line in diff.lines().filter(|l| diff_header_regex().is_match(l)) {
        for captures in changed_file_regex().captures_iter(line) {
            let file = &captures[1];
            if seen.insert(file.to_string()) {
                changed_files.push(file.to_string());
            }
        }
    }

    changed_files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::hook::tests::PUSH_BODY;
    use crate::github::hook::{parse, Hook};

    const DIFF: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
index 83db48f..bf269f4 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,3 +1,3 @@
-a
+b
diff --git a/docs/old.md b/docs/new.md
similarity index 90%
rename from docs/old.md
rename to docs/new.md
diff --git a/src/lib.rs b/src/lib.rs
";

    fn push() -> Push {
        match parse("push", PUSH_BODY.as_bytes()).unwrap() {
            Hook::Push(push) => push,
            Hook::Ping => panic!("expected push hook"),
        }
    }

    fn client(base_url: &str, token: Option<&str>) -> DiffClient {
        DiffClient::new(
            Client::new(),
            Url::parse(base_url).unwrap(),
            token.map(ToString::to_string),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_extract_changed_files() {
        assert_eq!(
            extract_changed_files(DIFF),
            vec!["src/lib.rs", "docs/old.md", "docs/new.md"]
        );
    }

    #[test]
    fn test_extract_ignores_other_lines() {
        assert!(extract_changed_files("--- a/src/lib.rs\n+++ b/src/lib.rs\n").is_empty());
        assert!(extract_changed_files("").is_empty());
    }

    #[test]
    fn test_compare_url() {
        let url = client("https://github.example.com/api/v3", None)
            .compare_url(&push())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.example.com/api/v3/repos/owner/repo/compare/9049f1265b7d61be4a8904a9a27120d2064dab3b...0d1a26e67d8f5eaf1f6ba5c57fc3c7d91ac0fd1c"
        );
    }

    #[tokio::test]
    async fn test_changed_files_success() {
        let mut server = mockito::Server::new_async().await;
        let push = push();
        let path = format!("/repos/owner/repo/compare/{}...{}", push.before, push.after);
        let mock = server
            .mock("GET", path.as_str())
            .match_header("accept", DIFF_MEDIA_TYPE)
            .match_header("authorization", "Bearer gh-token")
            .with_status(200)
            .with_body(DIFF)
            .create_async()
            .await;

        let files = client(&server.url(), Some("gh-token"))
            .changed_files(&push)
            .await
            .unwrap();

        assert_eq!(files, vec!["src/lib.rs", "docs/old.md", "docs/new.md"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_changed_files_bad_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let err = client(&server.url(), None)
            .changed_files(&push())
            .await
            .unwrap_err();

        assert!(matches!(err, DiffError::BadResponseStatus(404)));
    }
}
