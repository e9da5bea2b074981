use crate::core::ledger::PortLedger;
use crate::core::services::{
    AppMode, Database, DevTool, ExternalPostgres, Postgres, Selenium, Service, TestMode,
    Timetracker, TimetrackerTest,
};
use crate::domain::model::{Document, PortRequest, Profile};
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;

pub const DEFAULT_IMAGE_TAG: &str = "master-test";

/// Profile-specific inputs to [`select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileParams {
    /// Tag of the prebuilt image (trial and production).
    pub image_tag: String,
    pub host: Option<String>,
    pub db: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            image_tag: DEFAULT_IMAGE_TAG.to_string(),
            host: None,
            db: None,
            username: None,
            password: None,
        }
    }
}

impl ProfileParams {
    pub fn with_image_tag(mut self, tag: impl Into<String>) -> Self {
        self.image_tag = tag.into();
        self
    }

    fn external_database(&self) -> Result<ExternalPostgres> {
        Ok(ExternalPostgres {
            host: validate_required_field("host", &self.host)?.clone(),
            db: validate_required_field("DB", &self.db)?.clone(),
            username: validate_required_field("DB username", &self.username)?.clone(),
            password: validate_required_field("DB password", &self.password)?.clone(),
        })
    }
}

/// Maps a profile to its ordered list of services.
pub fn select(profile: Profile, params: &ProfileParams) -> Result<Vec<Service>> {
    let prebuilt = || AppMode::Prebuilt {
        image_tag: params.image_tag.clone(),
    };

    let services = match profile {
        Profile::Testing => {
            let postgres = Postgres::new();
            let app = Timetracker::new(Database::Container(postgres.clone()), AppMode::Tester);
            let selenium = Selenium::new(&app);
            let test = TimetrackerTest::new(app.clone(), selenium.clone(), postgres.clone(), TestMode::Ci);
            vec![
                Service::Timetracker(app),
                Service::TimetrackerTest(test),
                Service::Selenium(selenium),
                Service::Postgres(postgres),
            ]
        }
        Profile::Trial => {
            let postgres = Postgres::new().seeded();
            let app = Timetracker::new(Database::Container(postgres.clone()), prebuilt());
            vec![Service::Timetracker(app), Service::Postgres(postgres)]
        }
        Profile::Base => {
            let postgres = Postgres::new().with_initial_files(["./db/users.sql"]);
            let app = Timetracker::new(Database::Container(postgres.clone()), AppMode::Dev);
            let selenium = Selenium::new(&app);
            vec![
                Service::Timetracker(app),
                Service::DevTool(DevTool::Figwheel),
                Service::DevTool(DevTool::ClojureReformat),
                Service::Postgres(postgres),
                Service::Selenium(selenium),
            ]
        }
        Profile::Production => {
            let external = params.external_database()?;
            let app = Timetracker::new(Database::External(external), prebuilt());
            vec![Service::Timetracker(app)]
        }
    };

    tracing::debug!(
        "Profile {} selected services: {:?}",
        profile,
        services.iter().map(Service::name).collect::<Vec<_>>()
    );
    Ok(services)
}

/// Builds each service's fragment in order, recording port queries in `ledger`.
pub fn assemble(services: &[Service], ledger: &mut PortLedger) -> Document {
    let mut document = Document::new();
    for service in services {
        document.insert(service.name(), service.fragment(ledger));
    }
    document
}

pub fn validate(ledger: &PortLedger) -> Result<()> {
    ledger.validate()
}

pub fn serialize(document: &Document) -> Result<String> {
    Ok(serde_yaml::to_string(document)?)
}

/// Select, assemble, validate and serialize in one pass.
pub fn generate(profile: Profile, params: &ProfileParams, ports: PortRequest) -> Result<String> {
    let services = select(profile, params)?;
    let mut ledger = PortLedger::new(ports);
    let document = assemble(&services, &mut ledger);
    validate(&ledger)?;
    let yaml = serialize(&document)?;
    tracing::info!(
        "Generated {} compose file with {} services",
        profile,
        services.len()
    );
    Ok(yaml)
}
