pub mod env_file;
pub mod settings;

use crate::utils::error::{ImportError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_path, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use settings::Settings;

/// Selects which `.env.<env>` credentials file is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => Err(ImportError::InvalidConfigValueError {
                field: "ENV".to_string(),
                value: other.to_string(),
                reason: "Expected 'dev' or 'prod'".to_string(),
            }),
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "sf-user-import")]
#[command(about = "Create Salesforce users from a CSV sheet")]
pub struct CliConfig {
    #[arg(long, env = "ENV", default_value = "dev")]
    pub env: Environment,

    #[arg(long, default_value = "files/users.csv")]
    pub csv_path: String,

    #[arg(long, default_value = "envs", help = "Directory holding .env.<env> files")]
    pub env_dir: String,

    #[arg(long, help = "Write a JSON report of every row to this path")]
    pub report: Option<String>,

    #[arg(long, short = 'y', help = "Skip the production confirmation prompt")]
    pub yes: bool,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn new(env: Environment, csv_path: impl Into<String>, env_dir: impl Into<String>) -> Self {
        Self {
            env,
            csv_path: csv_path.into(),
            env_dir: env_dir.into(),
            report: None,
            yes: false,
            timeout_seconds: 30,
            verbose: false,
            json_logs: false,
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("csv_path", &self.csv_path)?;
        validate_path("env_dir", &self.env_dir)?;
        if let Some(report) = &self.report {
            validate_path("report", report)?;
        }
        validate_range("timeout_seconds", self.timeout_seconds, 1, 600)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
        assert_eq!(" prod ".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("staging".parse::<Environment>().is_err());
        assert_eq!(Environment::default(), Environment::Dev);
        assert_eq!(Environment::Prod.to_string(), "prod");
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_defaults() {
        use clap::Parser;

        let config = CliConfig::try_parse_from(["sf-user-import", "--env", "prod"]).unwrap();
        assert_eq!(config.env, Environment::Prod);
        assert_eq!(config.csv_path, "files/users.csv");
        assert_eq!(config.env_dir, "envs");
        assert_eq!(config.timeout_seconds, 30);
        assert!(!config.yes);
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_rejects_unknown_environment() {
        use clap::Parser;

        assert!(CliConfig::try_parse_from(["sf-user-import", "--env", "qa"]).is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_validation() {
        let mut config = CliConfig::new(Environment::Dev, "users.csv", "envs");
        config.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let config = CliConfig::new(Environment::Dev, "", "envs");
        assert!(config.validate().is_err());
    }
}
