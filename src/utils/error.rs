use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Registry request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Container runtime error: {0}")]
    RuntimeError(#[from] bollard::errors::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error(
        "Invalid port mappings: {}. Only valid ports for this config are {}",
        .invalid.join(", "),
        .valid.join(", ")
    )]
    InvalidPortError {
        invalid: Vec<String>,
        valid: Vec<String>,
    },

    #[error("Registry error: {message}")]
    RegistryError { message: String },

    #[error("Orchestration failed: {message}")]
    OrchestrationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad invocation: unknown profile, missing parameters, invalid ports.
    Usage,
    Registry,
    Runtime,
    System,
}

impl ComposeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ComposeError::ConfigError { .. }
            | ComposeError::MissingConfigError { .. }
            | ComposeError::InvalidConfigValueError { .. }
            | ComposeError::ConfigValidationError { .. }
            | ComposeError::InvalidPortError { .. } => ErrorCategory::Usage,
            ComposeError::HttpError(_)
            | ComposeError::RegistryError { .. }
            | ComposeError::SerializationError(_) => ErrorCategory::Registry,
            ComposeError::RuntimeError(_) | ComposeError::OrchestrationError { .. } => {
                ErrorCategory::Runtime
            }
            ComposeError::IoError(_) | ComposeError::YamlError(_) => ErrorCategory::System,
        }
    }

    /// Usage errors exit with 2, the same code argparse uses for `parser.error`.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Usage => 2,
            _ => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ComposeError::MissingConfigError { field } => format!("Need a {}", field),
            ComposeError::InvalidPortError { .. } | ComposeError::ConfigError { .. } => {
                self.to_string()
            }
            ComposeError::HttpError(e) => format!("Could not reach the registry: {}", e),
            ComposeError::RuntimeError(e) => {
                format!("Could not talk to the container runtime: {}", e)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ComposeError::MissingConfigError { .. } => {
                "The production profile needs --host, --db, --username and --password"
            }
            ComposeError::InvalidPortError { .. } => {
                "Use only the port names listed above in --expose-ports"
            }
            ComposeError::ConfigError { .. }
            | ComposeError::InvalidConfigValueError { .. }
            | ComposeError::ConfigValidationError { .. } => {
                "Check the command line arguments and configuration file"
            }
            ComposeError::HttpError(_) | ComposeError::RegistryError { .. } => {
                "Check network access and refresh the registry token file"
            }
            ComposeError::SerializationError(_) => "The registry returned an unexpected payload",
            ComposeError::RuntimeError(_) => "Make sure the Docker daemon is running and reachable",
            ComposeError::OrchestrationError { .. } => {
                "Inspect the docker-compose output above and the generated compose file"
            }
            ComposeError::IoError(_) | ComposeError::YamlError(_) => {
                "Check file permissions and available disk space"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ComposeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_port_message_lists_names() {
        let err = ComposeError::InvalidPortError {
            invalid: vec!["bogus-service".to_string()],
            valid: vec!["postgres".to_string(), "timetracker-web".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "Invalid port mappings: bogus-service. Only valid ports for this config are postgres, timetracker-web"
        );
        assert_eq!(err.category(), ErrorCategory::Usage);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_parameter_is_usage_error() {
        let err = ComposeError::MissingConfigError {
            field: "host".to_string(),
        };
        assert_eq!(err.user_friendly_message(), "Need a host");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_io_error_is_system_error() {
        let err: ComposeError = std::io::Error::other("disk full").into();
        assert_eq!(err.category(), ErrorCategory::System);
        assert_eq!(err.exit_code(), 1);
    }
}
