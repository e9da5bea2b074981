use crate::core::assembler::{self, ProfileParams};
use crate::core::services::image_reference;
use crate::domain::model::{ImageTag, PortRequest, Profile};
use crate::domain::ports::{ContainerRuntime, Orchestrator, Registry, Storage};
use crate::utils::error::{ComposeError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use std::fmt;

pub const APP_CONTAINER: &str = "timetracker_timetracker-app_1";
pub const DATABASE_CONTAINER: &str = "timetracker_postgres_1";
pub const COMPOSE_FILE: &str = "docker-compose.yml";
pub const DEFAULT_EXPOSE_PORTS: &str = "timetracker-web:18000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeployReason {
    AppMissing,
    ImageChanged { current: String, wanted: String },
    AppStopped,
    DatabaseMissing,
    DatabaseStopped,
}

impl fmt::Display for RedeployReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedeployReason::AppMissing => write!(f, "application container does not exist yet"),
            RedeployReason::ImageChanged { current, wanted } => {
                write!(f, "{} != {}, so need to recreate", current, wanted)
            }
            RedeployReason::AppStopped => write!(f, "application container exists but isn't running"),
            RedeployReason::DatabaseMissing => write!(f, "database container is missing"),
            RedeployReason::DatabaseStopped => {
                write!(f, "database container exists but isn't running")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    UpToDate,
    Redeploy(RedeployReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub tag: String,
    pub decision: Decision,
    pub redeployed: bool,
}

/// Everything the refresher needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub profile: Profile,
    pub params: ProfileParams,
    pub expose_ports: PortRequest,
    pub app_container: String,
    pub database_container: String,
    pub compose_file: String,
}

impl RefreshSettings {
    pub fn new(profile: Profile, params: ProfileParams) -> Result<Self> {
        let settings = Self {
            profile,
            params,
            expose_ports: PortRequest::parse(DEFAULT_EXPOSE_PORTS)?,
            app_container: APP_CONTAINER.to_string(),
            database_container: DATABASE_CONTAINER.to_string(),
            compose_file: COMPOSE_FILE.to_string(),
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for RefreshSettings {
    fn validate(&self) -> Result<()> {
        if !matches!(self.profile, Profile::Trial | Profile::Production) {
            return Err(ComposeError::ConfigError {
                message: format!("Don't know {} as system option", self.profile),
            });
        }
        validate_non_empty_string("app_container", &self.app_container)?;
        validate_non_empty_string("database_container", &self.database_container)?;
        validate_non_empty_string("compose_file", &self.compose_file)?;
        Ok(())
    }
}

/// Newest tag by last-updated time; ties keep registry order.
pub fn newest_tag(mut tags: Vec<ImageTag>) -> Option<ImageTag> {
    tags.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
    tags.into_iter().next()
}

pub struct Refresher<R, C, S, O>
where
    R: Registry,
    C: ContainerRuntime,
    S: Storage,
    O: Orchestrator,
{
    registry: R,
    runtime: C,
    storage: S,
    orchestrator: O,
    settings: RefreshSettings,
}

impl<R, C, S, O> Refresher<R, C, S, O>
where
    R: Registry,
    C: ContainerRuntime,
    S: Storage,
    O: Orchestrator,
{
    pub fn new(registry: R, runtime: C, storage: S, orchestrator: O, settings: RefreshSettings) -> Self {
        Self {
            registry,
            runtime,
            storage,
            orchestrator,
            settings,
        }
    }

    pub async fn latest_tag(&self) -> Result<ImageTag> {
        let tags = self.registry.list_tags().await?;
        tracing::debug!("Registry returned {} tags", tags.len());
        newest_tag(tags).ok_or_else(|| ComposeError::RegistryError {
            message: "registry returned no tags".to_string(),
        })
    }

    /// Compares the running deployment against `tag` without changing anything.
    pub async fn decide(&self, tag: &str) -> Result<Decision> {
        let app = &self.settings.app_container;
        let Some(status) = self.runtime.inspect(app).await? else {
            tracing::info!("Don't have {} yet, so creating", app);
            return Ok(Decision::Redeploy(RedeployReason::AppMissing));
        };

        let wanted = image_reference(tag);
        if status.image != wanted {
            return Ok(Decision::Redeploy(RedeployReason::ImageChanged {
                current: status.image,
                wanted,
            }));
        }
        if !status.running {
            tracing::info!("{} exists, but isn't running so need to fix that", app);
            return Ok(Decision::Redeploy(RedeployReason::AppStopped));
        }
        tracing::info!("Already running {}", status.image);

        if self.settings.profile == Profile::Trial {
            let database = &self.settings.database_container;
            match self.runtime.inspect(database).await? {
                None => {
                    tracing::info!("Missing Postgres container, so need to rebuild");
                    return Ok(Decision::Redeploy(RedeployReason::DatabaseMissing));
                }
                Some(db) if !db.running => {
                    tracing::info!("{} exists, but isn't running so need to fix that", database);
                    return Ok(Decision::Redeploy(RedeployReason::DatabaseStopped));
                }
                Some(_) => tracing::info!("And have postgres container ({}) up as well", database),
            }
        }
        Ok(Decision::UpToDate)
    }

    /// Regenerates the compose file for `tag`, writes it and brings the stack up.
    pub async fn redeploy(&self, tag: &str) -> Result<()> {
        let params = self.settings.params.clone().with_image_tag(tag);
        let yaml = assembler::generate(
            self.settings.profile,
            &params,
            self.settings.expose_ports.clone(),
        )?;

        tracing::debug!(
            "Writing compose file ({} bytes) to {}",
            yaml.len(),
            self.settings.compose_file
        );
        self.storage
            .write_file(&self.settings.compose_file, yaml.as_bytes())
            .await?;

        self.orchestrator.up(&self.settings.compose_file).await?;
        tracing::info!("Deployment refreshed to {}", image_reference(tag));
        Ok(())
    }

    pub async fn run(&self, dry_run: bool) -> Result<RefreshOutcome> {
        let latest = self.latest_tag().await?;
        tracing::info!("Newest tag is {} ({})", latest.name, latest.last_updated);

        let decision = self.decide(&latest.name).await?;
        let redeployed = match &decision {
            Decision::UpToDate => false,
            Decision::Redeploy(reason) => {
                tracing::info!("Redeploy needed: {}", reason);
                if dry_run {
                    tracing::info!("Dry run, leaving the deployment untouched");
                    false
                } else {
                    self.redeploy(&latest.name).await?;
                    true
                }
            }
        };

        Ok(RefreshOutcome {
            tag: latest.name,
            decision,
            redeployed,
        })
    }
}
