use crate::domain::model::ContainerStatus;
use crate::domain::ports::ContainerRuntime;
use crate::utils::error::Result;
use async_trait::async_trait;
use bollard::container::InspectContainerOptions;
use bollard::errors::Error as BollardError;
use bollard::models::ContainerInspectResponse;
use bollard::Docker;

/// Local Docker Engine, reached through the default socket or `DOCKER_HOST`.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }
}

fn status_from_inspect(response: ContainerInspectResponse) -> ContainerStatus {
    ContainerStatus {
        image: response
            .config
            .and_then(|config| config.image)
            .unwrap_or_default(),
        running: response
            .state
            .and_then(|state| state.running)
            .unwrap_or(false),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn inspect(&self, name: &str) -> Result<Option<ContainerStatus>> {
        match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(response) => {
                let status = status_from_inspect(response);
                tracing::debug!(
                    "Container {} runs {} (running: {})",
                    name,
                    status.image,
                    status.running
                );
                Ok(Some(status))
            }
            Err(BollardError::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                tracing::debug!("Container {} not found", name);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ComposeError;
    use bollard::models::{ContainerConfig, ContainerState};
    use httpmock::prelude::*;

    fn runtime_for(server: &MockServer) -> DockerRuntime {
        let docker =
            Docker::connect_with_http(&server.base_url(), 5, bollard::API_DEFAULT_VERSION)
                .unwrap();
        DockerRuntime { docker }
    }

    #[test]
    fn test_status_from_full_response() {
        let response = ContainerInspectResponse {
            config: Some(ContainerConfig {
                image: Some("lshift/timetracker-web:master-9".to_string()),
                ..Default::default()
            }),
            state: Some(ContainerState {
                running: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert_eq!(
            status_from_inspect(response),
            ContainerStatus {
                image: "lshift/timetracker-web:master-9".to_string(),
                running: true,
            }
        );
    }

    #[test]
    fn test_status_defaults_when_fields_absent() {
        let status = status_from_inspect(ContainerInspectResponse::default());
        assert_eq!(status.image, "");
        assert!(!status.running);
    }

    #[tokio::test]
    async fn test_missing_container_is_none() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path_contains("/containers/timetracker_postgres_1/json");
            then.status(404)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"message": "No such container: timetracker_postgres_1"}));
        });

        let status = runtime_for(&server)
            .inspect("timetracker_postgres_1")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(status, None);
    }

    #[tokio::test]
    async fn test_daemon_failure_is_runtime_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path_contains("/containers/timetracker_postgres_1/json");
            then.status(500)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"message": "daemon broke"}));
        });

        let result = runtime_for(&server).inspect("timetracker_postgres_1").await;

        assert!(matches!(result, Err(ComposeError::RuntimeError(_))));
    }

    #[tokio::test]
    async fn test_running_container_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path_contains("/containers/timetracker_timetracker-app_1/json");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "Config": {"Image": "lshift/timetracker-web:master-42"},
                    "State": {"Running": true}
                }));
        });

        let status = runtime_for(&server)
            .inspect("timetracker_timetracker-app_1")
            .await
            .unwrap();

        assert_eq!(
            status,
            Some(ContainerStatus {
                image: "lshift/timetracker-web:master-42".to_string(),
                running: true,
            })
        );
    }
}
