use crate::domain::model::ImageTag;
use crate::domain::ports::Registry;
use crate::utils::error::{ComposeError, Result};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use url::Url;

pub const DOCKER_HUB_TAGS_URL: &str =
    "https://hub.docker.com/v2/repositories/lshift/timetracker-web/tags";
pub const DEFAULT_PAGE_SIZE: usize = 10000;

#[derive(Debug, Deserialize)]
struct TagPage {
    results: Vec<ImageTag>,
    #[serde(default)]
    next: Option<String>,
}

/// Docker Hub v2 tag listing, authenticated with the JWT from a prior login.
#[derive(Debug, Clone)]
pub struct DockerHubRegistry {
    client: Client,
    tags_url: String,
    page_size: usize,
    token: String,
}

impl DockerHubRegistry {
    pub fn new(tags_url: impl Into<String>, page_size: usize, token: impl Into<String>) -> Result<Self> {
        let tags_url = tags_url.into();
        validate_url("registry.tags_url", &tags_url)?;
        Ok(Self {
            client: Client::new(),
            tags_url,
            page_size,
            token: token.into().trim().to_string(),
        })
    }

    /// Reads the token written by the login step.
    pub fn from_token_file(
        tags_url: impl Into<String>,
        page_size: usize,
        token_file: impl AsRef<Path>,
    ) -> Result<Self> {
        let token = std::fs::read_to_string(token_file.as_ref()).map_err(|e| {
            ComposeError::ConfigValidationError {
                field: "registry.token_file".to_string(),
                message: format!("cannot read {}: {}", token_file.as_ref().display(), e),
            }
        })?;
        Self::new(tags_url, page_size, token)
    }

    fn first_page_url(&self) -> Result<String> {
        let mut url = Url::parse(&self.tags_url).map_err(|e| ComposeError::InvalidConfigValueError {
            field: "registry.tags_url".to_string(),
            value: self.tags_url.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("page_size", &self.page_size.to_string());
        Ok(url.into())
    }

    async fn fetch_page(&self, url: &str) -> Result<TagPage> {
        tracing::debug!("Making registry request to: {}", url);
        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("JWT {}", self.token))
            .send()
            .await?;

        tracing::debug!("Registry response status: {}", response.status());
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ComposeError::RegistryError {
                message: format!("GET {} returned {}: {}", url, status, body),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Registry for DockerHubRegistry {
    async fn list_tags(&self) -> Result<Vec<ImageTag>> {
        let mut tags = Vec::new();
        let mut next = Some(self.first_page_url()?);

        while let Some(url) = next {
            let page = self.fetch_page(&url).await?;
            tags.extend(page.results);
            next = page.next.filter(|n| !n.is_empty());
        }

        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_list_tags_sends_token_and_page_size() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/tags")
                .query_param("page_size", "50")
                .header("Authorization", "JWT abc.def");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "count": 2,
                    "next": null,
                    "results": [
                        {"name": "master-1", "last_updated": "2017-04-01T10:00:00.000000Z"},
                        {"name": "master-2", "last_updated": "2017-04-02T10:00:00.000000Z"}
                    ]
                }));
        });

        let registry = DockerHubRegistry::new(server.url("/tags"), 50, "abc.def\n").unwrap();
        let tags = registry.list_tags().await.unwrap();

        mock.assert();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1].name, "master-2");
    }

    #[tokio::test]
    async fn test_list_tags_follows_next_links() {
        let server = MockServer::start();
        let second_url = server.url("/tags/page2");
        let first = server.mock(|when, then| {
            when.method(GET).path("/tags").query_param("page_size", "1");
            then.status(200).json_body(serde_json::json!({
                "next": second_url,
                "results": [{"name": "a", "last_updated": "2017-01-01T00:00:00.0Z"}]
            }));
        });
        let second = server.mock(|when, then| {
            when.method(GET).path("/tags/page2");
            then.status(200).json_body(serde_json::json!({
                "next": null,
                "results": [{"name": "b", "last_updated": "2017-01-02T00:00:00.0Z"}]
            }));
        });

        let registry = DockerHubRegistry::new(server.url("/tags"), 1, "t").unwrap();
        let tags = registry.list_tags().await.unwrap();

        first.assert();
        second.assert();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unauthorized_is_registry_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/tags");
            then.status(401).body("{\"detail\": \"Signature has expired.\"}");
        });

        let registry = DockerHubRegistry::new(server.url("/tags"), 10, "stale").unwrap();
        let result = registry.list_tags().await;

        mock.assert();
        match result {
            Err(ComposeError::RegistryError { message }) => assert!(message.contains("401")),
            other => panic!("expected RegistryError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_payload_is_serialization_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/tags");
            then.status(200).json_body(serde_json::json!({"unexpected": true}));
        });

        let registry = DockerHubRegistry::new(server.url("/tags"), 10, "t").unwrap();
        assert!(matches!(
            registry.list_tags().await,
            Err(ComposeError::SerializationError(_))
        ));
    }

    #[test]
    fn test_token_file_is_read_and_trimmed() {
        let mut token_file = NamedTempFile::new().unwrap();
        token_file.write_all(b"  jwt-token\n").unwrap();

        let registry =
            DockerHubRegistry::from_token_file(DOCKER_HUB_TAGS_URL, DEFAULT_PAGE_SIZE, token_file.path())
                .unwrap();
        assert_eq!(registry.token, "jwt-token");

        let missing = DockerHubRegistry::from_token_file(
            DOCKER_HUB_TAGS_URL,
            DEFAULT_PAGE_SIZE,
            "/nonexistent/docker-hub-token",
        );
        assert!(matches!(
            missing,
            Err(ComposeError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(DockerHubRegistry::new("not a url", 10, "t").is_err());
    }
}
