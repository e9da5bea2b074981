//! The fixed catalog of Timetracker services.
//!
//! Each service turns its own configuration into a compose [`Fragment`],
//! consulting the [`PortLedger`] for every logical port it owns. Services
//! other services depend on also export an environment contract.

use crate::core::ledger::PortLedger;
use crate::domain::model::{BuildSpec, EnvValue, Environment, Fragment};

pub const IMAGE_REPOSITORY: &str = "lshift/timetracker-web";

const POSTGRES_NAME: &str = "postgres";
const POSTGRES_IMAGE: &str = "postgres:9.5";
const POSTGRES_PORT: u16 = 5432;
const DEFAULT_POSTGRES_PASSWORD: &str = "mysecretpassword";
const INITDB_DIR: &str = "/docker-entrypoint-initdb.d";

const APP_NAME: &str = "timetracker-app";
const WEB_INTERNAL_PORT: u16 = 18000;
const WEB_DEFAULT_EXTERNAL_PORT: u16 = 80;
const NREPL_INTERNAL_PORT: u16 = 18001;
const APP_SOURCE_MOUNT: &str = ".:/usr/src/app/";

const SELENIUM_NAME: &str = "selenium";
const SELENIUM_IMAGE: &str = "selenium/standalone-firefox-debug:2.52.0";
const SELENIUM_DRIVER_PORT: u16 = 4444;
const SELENIUM_VNC_PORT: u16 = 5900;

const TEST_NAME: &str = "timetracker-test";

pub fn image_reference(tag: &str) -> String {
    format!("{}:{}", IMAGE_REPOSITORY, tag)
}

fn wait_for_postgres(host: &str, command: &str) -> String {
    format!(
        "bash -c \"./etc/wait-for-postgres.sh {} {} && {}\"",
        host, POSTGRES_PORT, command
    )
}

/// The in-compose Postgres container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Postgres {
    password: String,
    seeded: bool,
    initial_files: Vec<String>,
}

impl Default for Postgres {
    fn default() -> Self {
        Self {
            password: DEFAULT_POSTGRES_PASSWORD.to_string(),
            seeded: false,
            initial_files: Vec::new(),
        }
    }
}

impl Postgres {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds from the seeded Dockerfile instead of the stock image.
    pub fn seeded(mut self) -> Self {
        self.seeded = true;
        self
    }

    pub fn with_initial_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.initial_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn name(&self) -> &'static str {
        POSTGRES_NAME
    }

    pub fn fragment(&self, ledger: &mut PortLedger) -> Fragment {
        let mut fragment = Fragment::new();
        if self.seeded {
            fragment.build(BuildSpec::Dockerfile {
                context: ".".to_string(),
                dockerfile: "etc/Dockerfile-seeded-postgres".to_string(),
            });
        } else {
            fragment.image(POSTGRES_IMAGE);
        }
        if let Some(port) = ledger.expose(POSTGRES_NAME, POSTGRES_PORT) {
            fragment.ports(vec![format!("{}:{}", port, POSTGRES_PORT)]);
        }
        let mut env = Environment::new();
        env.insert("POSTGRES_PASSWORD".to_string(), self.password.as_str().into());
        fragment.environment(env);
        if !self.initial_files.is_empty() {
            fragment.volumes(
                self.initial_files
                    .iter()
                    .map(|path| {
                        let file_name = path.rsplit('/').next().unwrap_or(path);
                        format!("{}:{}/{}", path, INITDB_DIR, file_name)
                    })
                    .collect(),
            );
        }
        fragment
    }

    pub fn env(&self) -> Environment {
        let mut env = Environment::new();
        env.insert(
            "DATABASE_URL".to_string(),
            format!("postgres://postgres:{}@{}/postgres", self.password, POSTGRES_NAME).into(),
        );
        env.insert("PGPASSWORD".to_string(), self.password.as_str().into());
        env
    }
}

/// A database managed outside the compose project. Contributes only an environment contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalPostgres {
    pub host: String,
    pub db: String,
    pub username: String,
    pub password: String,
}

impl ExternalPostgres {
    pub fn env(&self) -> Environment {
        let mut env = Environment::new();
        env.insert(
            "DATABASE_URL".to_string(),
            format!(
                "postgres://{}:{}@{}/{}",
                self.username, self.password, self.host, self.db
            )
            .into(),
        );
        env.insert("PGPASSWORD".to_string(), self.password.as_str().into());
        env
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    Container(Postgres),
    External(ExternalPostgres),
}

impl Database {
    pub fn env(&self) -> Environment {
        match self {
            Database::Container(postgres) => postgres.env(),
            Database::External(external) => external.env(),
        }
    }

    pub fn host(&self) -> &str {
        match self {
            Database::Container(postgres) => postgres.name(),
            Database::External(external) => &external.host,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    /// Runs a published image.
    Prebuilt { image_tag: String },
    /// Builds from source and runs with the CI profile.
    Tester,
    /// Builds from source with the working tree mounted.
    Dev,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timetracker {
    database: Database,
    mode: AppMode,
}

impl Timetracker {
    pub fn new(database: Database, mode: AppMode) -> Self {
        Self { database, mode }
    }

    pub fn name(&self) -> &'static str {
        APP_NAME
    }

    pub fn fragment(&self, ledger: &mut PortLedger) -> Fragment {
        let mut env = self.database.env();
        let psql_seed = format!(
            "psql --host={} --username=postgres -f db/users.sql",
            self.database.host()
        );
        let mut fragment = Fragment::new();

        // environment leads the fragment; it is filled in once the ports are known
        fragment.environment(Environment::new());
        let run_command = match &self.mode {
            AppMode::Prebuilt { image_tag } => {
                fragment.image(image_reference(image_tag));
                "lein run".to_string()
            }
            AppMode::Tester => {
                fragment.build(BuildSpec::Context(".".to_string()));
                format!("{} && lein with-profile +teamcity run", psql_seed)
            }
            AppMode::Dev => {
                fragment.build(BuildSpec::Context(".".to_string()));
                fragment.volumes(vec![APP_SOURCE_MOUNT.to_string()]);
                format!("{} && lein with-profile +dev run", psql_seed)
            }
        };

        let mut ports = Vec::new();
        if let Some(port) = ledger.expose("timetracker-web", WEB_DEFAULT_EXTERNAL_PORT) {
            ports.push(format!("{}:{}", port, WEB_INTERNAL_PORT));
        }
        if let Some(port) = ledger.expose("timetracker-nrepl", NREPL_INTERNAL_PORT) {
            env.insert("NREPL_PORT".to_string(), EnvValue::Number(NREPL_INTERNAL_PORT));
            ports.push(format!("{}:{}", port, NREPL_INTERNAL_PORT));
        }
        fragment.environment(env);
        fragment.ports(ports);

        match &self.database {
            Database::External(_) => fragment.command(run_command),
            Database::Container(postgres) => {
                fragment.command(wait_for_postgres(postgres.name(), &run_command));
                fragment.links(vec![postgres.name().to_string()]);
            }
        }
        fragment
    }

    pub fn link(&self, ledger: &PortLedger) -> String {
        format!(
            "http://{}:{}/",
            APP_NAME,
            ledger.port("timetracker-web", WEB_INTERNAL_PORT)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selenium {
    app: String,
}

impl Selenium {
    pub fn new(app: &Timetracker) -> Self {
        Self {
            app: app.name().to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        SELENIUM_NAME
    }

    pub fn fragment(&self, ledger: &mut PortLedger) -> Fragment {
        let mut fragment = Fragment::new();
        fragment.image(SELENIUM_IMAGE);
        fragment.links(vec![self.app.clone()]);
        let mut ports = Vec::new();
        if let Some(port) = ledger.expose("selenium-driver", SELENIUM_DRIVER_PORT) {
            ports.push(format!("{}:{}", port, SELENIUM_DRIVER_PORT));
        }
        if let Some(port) = ledger.expose("selenium-vnc", SELENIUM_VNC_PORT) {
            ports.push(format!("{}:{}", port, SELENIUM_VNC_PORT));
        }
        fragment.ports(ports);
        fragment
    }

    pub fn link(&self) -> String {
        format!("http://{}:{}/wd/hub", SELENIUM_NAME, SELENIUM_DRIVER_PORT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMode {
    /// One-shot CI run that writes results and screenshots to the host.
    Ci,
    Dev,
}

/// A second application instance that drives the browser tests against the
/// first, so selenium does not have to link back to itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetrackerTest {
    app: Timetracker,
    selenium: Selenium,
    database: Postgres,
    mode: TestMode,
}

impl TimetrackerTest {
    pub fn new(app: Timetracker, selenium: Selenium, database: Postgres, mode: TestMode) -> Self {
        Self {
            app,
            selenium,
            database,
            mode,
        }
    }

    pub fn name(&self) -> &'static str {
        TEST_NAME
    }

    pub fn fragment(&self, ledger: &mut PortLedger) -> Fragment {
        let mut fragment = Fragment::new();
        fragment.build(BuildSpec::Context(".".to_string()));
        match self.mode {
            TestMode::Ci => {
                fragment.command(
                    "bash -c \"lein with-profile +teamcity do doo node test once, test\"",
                );
                fragment.volumes(vec![
                    "./test-results:/usr/src/app/test-results".to_string(),
                    "./target/screenshots:/usr/src/app/target/screenshots".to_string(),
                ]);
            }
            TestMode::Dev => {
                fragment.command(wait_for_postgres(
                    self.database.name(),
                    "lein with-profile +dev run",
                ));
                fragment.volumes(vec![APP_SOURCE_MOUNT.to_string()]);
            }
        }
        fragment.links(vec![
            self.app.name().to_string(),
            self.selenium.name().to_string(),
            self.database.name().to_string(),
        ]);

        let mut env = self.database.env();
        let app_url = self.app.link(ledger);
        env.insert("TIMETRACKER_APP_URL".to_string(), app_url.clone().into());
        env.insert("TIMETRACKER_SERVER_URL".to_string(), app_url.into());
        env.insert("SELENIUM_URL".to_string(), self.selenium.link().into());
        let mut ports = Vec::new();
        if let Some(port) = ledger.expose("test-nrepl", NREPL_INTERNAL_PORT) {
            env.insert("NREPL_PORT".to_string(), EnvValue::Number(NREPL_INTERNAL_PORT));
            ports.push(format!("{}:{}", port, NREPL_INTERNAL_PORT));
        }
        fragment.environment(env);
        fragment.ports(ports);
        fragment
    }
}

/// Single-purpose containers built from the shared Clojure dependencies image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevTool {
    Figwheel,
    ClojureReformat,
}

impl DevTool {
    pub fn name(&self) -> &'static str {
        match self {
            DevTool::Figwheel => "figwheel",
            DevTool::ClojureReformat => "clojure-reformat",
        }
    }

    pub fn fragment(&self) -> Fragment {
        let mut fragment = Fragment::new();
        fragment.build(BuildSpec::Dockerfile {
            context: ".".to_string(),
            dockerfile: "dev/Dockerfile-clojure-deps".to_string(),
        });
        fragment.volumes(vec![APP_SOURCE_MOUNT.to_string()]);
        match self {
            DevTool::Figwheel => {
                fragment.ports(vec!["3449:3449".to_string()]);
                fragment.command("bash -c \"cd /usr/src/app/ && lein figwheel\"");
            }
            DevTool::ClojureReformat => {
                fragment.command("lein auto do cljfmt fix, cljfmt fix project.clj");
            }
        }
        fragment
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Service {
    Postgres(Postgres),
    Timetracker(Timetracker),
    Selenium(Selenium),
    TimetrackerTest(TimetrackerTest),
    DevTool(DevTool),
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::Postgres(s) => s.name(),
            Service::Timetracker(s) => s.name(),
            Service::Selenium(s) => s.name(),
            Service::TimetrackerTest(s) => s.name(),
            Service::DevTool(s) => s.name(),
        }
    }

    pub fn fragment(&self, ledger: &mut PortLedger) -> Fragment {
        match self {
            Service::Postgres(s) => s.fragment(ledger),
            Service::Timetracker(s) => s.fragment(ledger),
            Service::Selenium(s) => s.fragment(ledger),
            Service::TimetrackerTest(s) => s.fragment(ledger),
            Service::DevTool(s) => s.fragment(),
        }
    }
}
