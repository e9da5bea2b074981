use crate::adapters::compose::PROJECT_NAME;
use crate::adapters::registry::{DEFAULT_PAGE_SIZE, DOCKER_HUB_TAGS_URL};
use crate::core::assembler::ProfileParams;
use crate::core::refresher::{
    RefreshSettings, APP_CONTAINER, COMPOSE_FILE, DATABASE_CONTAINER, DEFAULT_EXPOSE_PORTS,
};
use crate::domain::model::{PortRequest, Profile};
use crate::utils::error::{ComposeError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for `update-compose`. Every section is optional and defaults to
/// the stock Timetracker deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub registry: RegistryConfig,
    pub runtime: RuntimeConfig,
    pub deploy: DeployConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub tags_url: String,
    pub page_size: usize,
    pub token_file: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tags_url: DOCKER_HUB_TAGS_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            token_file: "docker-hub-token".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub app_container: String,
    pub database_container: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            app_container: APP_CONTAINER.to_string(),
            database_container: DATABASE_CONTAINER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub directory: String,
    pub compose_file: String,
    pub project_name: String,
    pub compose_command: String,
    pub expose_ports: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            compose_file: COMPOSE_FILE.to_string(),
            project_name: PROJECT_NAME.to_string(),
            compose_command: "docker-compose".to_string(),
            expose_ports: DEFAULT_EXPOSE_PORTS.to_string(),
        }
    }
}

/// External database for the production profile. Unset fields fall back to
/// `TT_HOST`, `TT_DB`, `TT_USERNAME` and `TT_PASSWORD`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: Option<String>,
    pub db: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn or_env(value: &Option<String>, var: &str) -> Option<String> {
    value.clone().or_else(|| std::env::var(var).ok())
}

impl RefreshConfig {
    /// Loads the config from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ComposeError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ComposeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ComposeError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn expose_ports(&self) -> Result<PortRequest> {
        PortRequest::parse(&self.deploy.expose_ports)
    }

    pub fn profile_params(&self) -> ProfileParams {
        ProfileParams {
            host: or_env(&self.database.host, "TT_HOST"),
            db: or_env(&self.database.db, "TT_DB"),
            username: or_env(&self.database.username, "TT_USERNAME"),
            password: or_env(&self.database.password, "TT_PASSWORD"),
            ..ProfileParams::default()
        }
    }

    pub fn refresh_settings(&self, profile: Profile) -> Result<RefreshSettings> {
        let settings = RefreshSettings {
            profile,
            params: self.profile_params(),
            expose_ports: self.expose_ports()?,
            app_container: self.runtime.app_container.clone(),
            database_container: self.runtime.database_container.clone(),
            compose_file: self.deploy.compose_file.clone(),
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for RefreshConfig {
    fn validate(&self) -> Result<()> {
        validate_url("registry.tags_url", &self.registry.tags_url)?;
        validate_positive_number("registry.page_size", self.registry.page_size, 1)?;
        validate_non_empty_string("registry.token_file", &self.registry.token_file)?;
        validate_non_empty_string("deploy.directory", &self.deploy.directory)?;
        validate_non_empty_string("deploy.compose_command", &self.deploy.compose_command)?;
        validate_non_empty_string("deploy.project_name", &self.deploy.project_name)?;
        self.expose_ports()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RefreshConfig::from_toml_str("").unwrap();

        assert_eq!(config.registry.tags_url, DOCKER_HUB_TAGS_URL);
        assert_eq!(config.registry.page_size, 10000);
        assert_eq!(config.runtime.app_container, "timetracker_timetracker-app_1");
        assert_eq!(config.deploy.compose_file, "docker-compose.yml");
        assert_eq!(config.deploy.project_name, "timetracker");
        assert!(config.validate().is_ok());
        assert_eq!(
            config.expose_ports().unwrap().port("timetracker-web"),
            Some(18000)
        );
    }

    #[test]
    fn test_partial_sections() {
        let config = RefreshConfig::from_toml_str(
            r#"
[registry]
page_size = 100

[deploy]
directory = "/srv/timetracker"
"#,
        )
        .unwrap();

        assert_eq!(config.registry.page_size, 100);
        assert_eq!(config.registry.token_file, "docker-hub-token");
        assert_eq!(config.deploy.directory, "/srv/timetracker");
        assert_eq!(config.deploy.compose_command, "docker-compose");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_REFRESH_DB_PASSWORD", "from-env");

        let config = RefreshConfig::from_toml_str(
            r#"
[database]
host = "db.internal"
db = "timetracker"
username = "tt"
password = "${TEST_REFRESH_DB_PASSWORD}"
"#,
        )
        .unwrap();
        let params = config.profile_params();

        assert_eq!(params.password.as_deref(), Some("from-env"));
        assert_eq!(params.host.as_deref(), Some("db.internal"));

        std::env::remove_var("TEST_REFRESH_DB_PASSWORD");
    }

    #[test]
    fn test_config_validation() {
        let config = RefreshConfig::from_toml_str(
            r#"
[registry]
tags_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = RefreshConfig::from_toml_str(
            r#"
[deploy]
expose_ports = "timetracker-web:notaport"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            RefreshConfig::from_toml_str("[registry\npage_size = 1"),
            Err(ComposeError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_refresh_settings_only_for_deployable_profiles() {
        let config = RefreshConfig::default();

        let settings = config.refresh_settings(Profile::Trial).unwrap();
        assert_eq!(settings.database_container, "timetracker_postgres_1");
        assert!(config.refresh_settings(Profile::Base).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[runtime]\napp_container = \"tt_app\"\n")
            .unwrap();

        let config = RefreshConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.runtime.app_container, "tt_app");
        assert_eq!(config.runtime.database_container, "timetracker_postgres_1");
    }
}
