use crate::core::assembler::{ProfileParams, DEFAULT_IMAGE_TAG};
use crate::domain::model::{PortMapping, PortRequest, Profile};
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "generate-compose")]
#[command(about = "Generate the docker-compose file for a Timetracker deployment")]
pub struct CliConfig {
    /// Type of compose file to output (testing, trial, base or production)
    #[arg(default_value_t = Profile::Base)]
    pub profile: Profile,

    /// In 'trial' and 'production' mode, tag of the prebuilt Timetracker image
    #[arg(long, default_value = DEFAULT_IMAGE_TAG)]
    pub image_tag: String,

    /// Comma separated port mappings of the form SERVICE or SERVICE:PORT. SERVICE form gives default port
    #[arg(long, value_delimiter = ',')]
    pub expose_ports: Vec<PortMapping>,

    /// DB host (only relevant for production)
    #[arg(long)]
    pub host: Option<String>,

    /// DB to use (only relevant for production)
    #[arg(long)]
    pub db: Option<String>,

    /// DB username to use (only relevant for production)
    #[arg(long)]
    pub username: Option<String>,

    /// DB password to use (only relevant for production)
    #[arg(long)]
    pub password: Option<String>,

    /// Write the compose file here instead of standard output
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn profile_params(&self) -> ProfileParams {
        ProfileParams {
            image_tag: self.image_tag.clone(),
            host: self.host.clone(),
            db: self.db.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    pub fn port_request(&self) -> PortRequest {
        self.expose_ports.iter().cloned().collect()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("image_tag", &self.image_tag)
    }
}
