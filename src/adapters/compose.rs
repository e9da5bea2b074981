use crate::domain::ports::Orchestrator;
use crate::utils::error::{ComposeError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

pub const PROJECT_NAME: &str = "timetracker";

/// Runs `<program> --project-name <project> --file <compose_file> up -d`.
#[derive(Debug, Clone)]
pub struct ComposeCli {
    program: String,
    project_name: String,
    working_dir: PathBuf,
}

impl ComposeCli {
    pub fn new(
        program: impl Into<String>,
        project_name: impl Into<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            project_name: project_name.into(),
            working_dir: working_dir.into(),
        }
    }

    fn args<'a>(&'a self, compose_file: &'a str) -> [&'a str; 6] {
        [
            "--project-name",
            self.project_name.as_str(),
            "--file",
            compose_file,
            "up",
            "-d",
        ]
    }
}

#[async_trait]
impl Orchestrator for ComposeCli {
    async fn up(&self, compose_file: &str) -> Result<()> {
        let args = self.args(compose_file);
        tracing::info!("Running {} {}", self.program, args.join(" "));

        let status = Command::new(&self.program)
            .args(args)
            .current_dir(&self.working_dir)
            .status()
            .await?;

        if !status.success() {
            return Err(ComposeError::OrchestrationError {
                message: format!("{} exited with {}", self.program, status),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_arguments() {
        let cli = ComposeCli::new("docker-compose", PROJECT_NAME, ".");
        assert_eq!(
            cli.args("docker-compose.yml"),
            [
                "--project-name",
                "timetracker",
                "--file",
                "docker-compose.yml",
                "up",
                "-d"
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_command() {
        let cli = ComposeCli::new("true", PROJECT_NAME, std::env::temp_dir());
        tokio_test::assert_ok!(cli.up("docker-compose.yml").await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_orchestration_error() {
        let cli = ComposeCli::new("false", PROJECT_NAME, std::env::temp_dir());
        let err = tokio_test::assert_err!(cli.up("docker-compose.yml").await);
        assert!(matches!(err, ComposeError::OrchestrationError { .. }));
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let cli = ComposeCli::new("definitely-not-docker-compose", PROJECT_NAME, ".");
        assert!(matches!(
            cli.up("docker-compose.yml").await,
            Err(ComposeError::IoError(_))
        ));
    }
}
