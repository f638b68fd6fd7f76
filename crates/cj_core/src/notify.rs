use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;
use url::Url;
use crate::{Error, Result};

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("covid_ju/", env!("CARGO_PKG_VERSION"));

/// Signals downstream consumers that a run has completed.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self) -> Result<()>;
}

/// Credentials and target for a GitHub `repository_dispatch` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub user: String,
    pub token: String,
    /// `owner/name`
    pub repo: String,
}

pub struct GitHubDispatch {
    client: reqwest::Client,
    config: DispatchConfig,
    endpoint: Url,
}

impl GitHubDispatch {
    pub fn new(config: DispatchConfig) -> Result<Self> {
        Self::with_base_url(config, GITHUB_API)
    }

    /// Targets a GitHub-compatible API other than api.github.com.
    pub fn with_base_url(config: DispatchConfig, base_url: &str) -> Result<Self> {
        let endpoint = dispatch_endpoint(base_url, &config.repo)?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, config, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

pub fn dispatch_endpoint(base_url: &str, repo: &str) -> Result<Url> {
    let repo = repo.trim().trim_matches('/');
    if repo.split('/').filter(|part| !part.is_empty()).count() != 2 {
        return Err(Error::Config(format!("Expected repository as owner/name, got {:?}", repo)));
    }
    Ok(Url::parse(&format!("{}/repos/{}/dispatches", base_url.trim_end_matches('/'), repo))?)
}

pub fn dispatch_payload() -> Value {
    json!({ "event_type": "update" })
}

#[async_trait]
impl Notifier for GitHubDispatch {
    fn name(&self) -> &str {
        "GitHub dispatch"
    }

    async fn notify(&self) -> Result<()> {
        let response = self.client
            .post(self.endpoint.clone())
            .basic_auth(&self.config.user, Some(&self.config.token))
            .json(&dispatch_payload())
            .send()
            .await
            .map_err(|e| Error::Notification(format!("Failed to reach {}: {}", self.endpoint, e)))?;

        // The status is reported, not enforced.
        info!("📣 {} responded with {}", self.endpoint, response.status());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn config(repo: &str) -> DispatchConfig {
        DispatchConfig {
            user: "bot".to_string(),
            token: "secret".to_string(),
            repo: repo.to_string(),
        }
    }

    #[test]
    fn test_dispatch_endpoint() {
        let url = dispatch_endpoint(GITHUB_API, "openZH/covid_19").unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/repos/openZH/covid_19/dispatches");
    }

    #[test]
    fn test_dispatch_endpoint_rejects_bare_name() {
        assert!(matches!(dispatch_endpoint(GITHUB_API, "covid_19"), Err(Error::Config(_))));
        assert!(matches!(dispatch_endpoint(GITHUB_API, "a/b/c"), Err(Error::Config(_))));
    }

    #[test]
    fn test_dispatch_payload() {
        assert_eq!(dispatch_payload().to_string(), r#"{"event_type":"update"}"#);
    }

    #[test]
    fn test_new_builds_endpoint() {
        let dispatch = GitHubDispatch::new(config("/owner/repo/")).unwrap();
        assert_eq!(dispatch.endpoint().path(), "/repos/owner/repo/dispatches");
        assert_eq!(dispatch.name(), "GitHub dispatch");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let url = dispatch_endpoint("http://localhost:8080/", "owner/repo").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/repos/owner/repo/dispatches");
    }

    #[tokio::test]
    async fn test_notify_posts_dispatch_event() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/owner/repo/dispatches")
                    .header("authorization", "Basic Ym90OnNlY3JldA==")
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({ "event_type": "update" }));
                then.status(204);
            })
            .await;

        let dispatch = GitHubDispatch::with_base_url(config("owner/repo"), &server.base_url()).unwrap();
        dispatch.notify().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_notify_tolerates_error_status() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/repos/owner/missing/dispatches");
                then.status(404).body(r#"{"message":"Not Found"}"#);
            })
            .await;

        let dispatch = GitHubDispatch::with_base_url(config("owner/missing"), &server.base_url()).unwrap();
        assert!(dispatch.notify().await.is_ok());
        mock.assert_async().await;
    }
}
