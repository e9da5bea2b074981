use crate::utils::error::{ComposeError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Deployment variant selecting a fixed subset and wiring of services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Profile {
    Testing,
    Trial,
    #[default]
    Base,
    Production,
}

impl Profile {
    pub const ALL: [Profile; 4] = [
        Profile::Testing,
        Profile::Trial,
        Profile::Base,
        Profile::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Testing => "testing",
            Profile::Trial => "trial",
            Profile::Base => "base",
            Profile::Production => "production",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self> {
        Profile::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ComposeError::ConfigError {
                message: format!("Don't know compose type {}", s),
            })
    }
}

/// One `NAME` or `NAME:PORT` token from `--expose-ports`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub name: String,
    pub port: Option<u16>,
}

impl FromStr for PortMapping {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(format!("port mapping '{}' has no name", s));
        }
        let port = match parts.next() {
            None => None,
            Some(raw) => Some(
                raw.trim()
                    .parse::<u16>()
                    .map_err(|e| format!("invalid port in '{}': {}", s, e))?,
            ),
        };
        if parts.next().is_some() {
            return Err(format!(
                "port mapping '{}' must be of the form NAME or NAME:PORT",
                s
            ));
        }
        Ok(PortMapping {
            name: name.to_string(),
            port,
        })
    }
}

/// Logical port names the caller asked to expose, with optional host port overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortRequest(BTreeMap<String, Option<u16>>);

impl PortRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma separated list of `NAME` / `NAME:PORT` tokens.
    pub fn parse(spec: &str) -> Result<Self> {
        spec.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<PortMapping>()
                    .map_err(|reason| ComposeError::InvalidConfigValueError {
                        field: "expose_ports".to_string(),
                        value: token.to_string(),
                        reason,
                    })
            })
            .collect()
    }

    pub fn insert(&mut self, mapping: PortMapping) {
        self.0.insert(mapping.name, mapping.port);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Requested host port, or `None` when the name was not requested or has no override.
    pub fn port(&self, name: &str) -> Option<u16> {
        self.0.get(name).copied().flatten()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PortMapping> for PortRequest {
    fn from_iter<I: IntoIterator<Item = PortMapping>>(iter: I) -> Self {
        let mut request = PortRequest::new();
        for mapping in iter {
            request.insert(mapping);
        }
        request
    }
}

/// Environment values are strings except for port numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EnvValue {
    Text(String),
    Number(u16),
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        EnvValue::Text(value)
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        EnvValue::Text(value.to_string())
    }
}

impl From<u16> for EnvValue {
    fn from(value: u16) -> Self {
        EnvValue::Number(value)
    }
}

/// Environment mappings serialize with sorted keys.
pub type Environment = BTreeMap<String, EnvValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BuildSpec {
    Context(String),
    Dockerfile { context: String, dockerfile: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKey {
    Image,
    Build,
    Ports,
    Environment,
    Volumes,
    Links,
    Command,
}

impl FragmentKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKey::Image => "image",
            FragmentKey::Build => "build",
            FragmentKey::Ports => "ports",
            FragmentKey::Environment => "environment",
            FragmentKey::Volumes => "volumes",
            FragmentKey::Links => "links",
            FragmentKey::Command => "command",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    Text(String),
    List(Vec<String>),
    Environment(Environment),
    Build(BuildSpec),
}

impl Entry {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Entry::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Entry::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_environment(&self) -> Option<&Environment> {
        match self {
            Entry::Environment(env) => Some(env),
            _ => None,
        }
    }
}

/// The part of the compose document describing one service.
///
/// Keys serialize in insertion order; setting an existing key keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    entries: Vec<(FragmentKey, Entry)>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: FragmentKey, entry: Entry) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((key, entry)),
        }
    }

    pub fn image(&mut self, image: impl Into<String>) {
        self.set(FragmentKey::Image, Entry::Text(image.into()));
    }

    pub fn build(&mut self, build: BuildSpec) {
        self.set(FragmentKey::Build, Entry::Build(build));
    }

    /// No-op for an empty list, so the key only appears when something is exposed.
    pub fn ports(&mut self, ports: Vec<String>) {
        if !ports.is_empty() {
            self.set(FragmentKey::Ports, Entry::List(ports));
        }
    }

    pub fn environment(&mut self, env: Environment) {
        self.set(FragmentKey::Environment, Entry::Environment(env));
    }

    pub fn volumes(&mut self, volumes: Vec<String>) {
        self.set(FragmentKey::Volumes, Entry::List(volumes));
    }

    pub fn links(&mut self, links: Vec<String>) {
        self.set(FragmentKey::Links, Entry::List(links));
    }

    pub fn command(&mut self, command: impl Into<String>) {
        self.set(FragmentKey::Command, Entry::Text(command.into()));
    }

    pub fn get(&self, key: FragmentKey) -> Option<&Entry> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, e)| e)
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }
}

impl Serialize for Fragment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key.as_str(), entry)?;
        }
        map.end()
    }
}

pub const COMPOSE_FORMAT_VERSION: &str = "2";

/// A versioned, insertion-ordered mapping from service name to fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    version: &'static str,
    services: Vec<(String, Fragment)>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: COMPOSE_FORMAT_VERSION,
            services: Vec::new(),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, fragment: Fragment) {
        let name = name.into();
        match self.services.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = fragment,
            None => self.services.push((name, fragment)),
        }
    }

    pub fn version(&self) -> &str {
        self.version
    }

    pub fn service(&self, name: &str) -> Option<&Fragment> {
        self.services
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, fragment)| fragment)
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|(n, _)| n.as_str()).collect()
    }
}

struct OrderedServices<'a>(&'a [(String, Fragment)]);

impl Serialize for OrderedServices<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, fragment) in self.0 {
            map.serialize_entry(name, fragment)?;
        }
        map.end()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("version", self.version)?;
        map.serialize_entry("services", &OrderedServices(&self.services))?;
        map.end()
    }
}

const REGISTRY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

fn deserialize_registry_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&raw, REGISTRY_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// A tag listed by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageTag {
    pub name: String,
    #[serde(deserialize_with = "deserialize_registry_timestamp")]
    pub last_updated: DateTime<Utc>,
}

/// What the container runtime reports for a container it knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub image: String,
    pub running: bool,
}
