use crate::config::env_file::read_env_file;
use crate::config::Environment;
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Salesforce credentials and endpoints for one environment.
#[derive(Clone)]
pub struct Settings {
    pub sf_user: String,
    pub sf_password: String,
    pub sf_domain: String,
    pub sf_token: String,
    pub sf_api_base_url: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("sf_user", &self.sf_user)
            .field("sf_password", &"<redacted>")
            .field("sf_domain", &self.sf_domain)
            .field("sf_token", &"<redacted>")
            .field("sf_api_base_url", &self.sf_api_base_url)
            .finish()
    }
}

impl Settings {
    pub fn env_file_path<P: AsRef<Path>>(env_dir: P, env: Environment) -> PathBuf {
        env_dir.as_ref().join(format!(".env.{}", env))
    }

    /// Loads `<env_dir>/.env.<env>`, with process environment variables
    /// taking precedence over the file.
    pub fn load<P: AsRef<Path>>(env_dir: P, env: Environment) -> Result<Self> {
        let path = Self::env_file_path(env_dir, env);
        tracing::debug!("Loading settings from {}", path.display());

        let file_vars = read_env_file(&path)?;
        Self::from_sources(&file_vars, |key| std::env::var(key).ok())
    }

    pub fn from_sources<F>(file_vars: &HashMap<String, String>, process_var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| -> Result<String> {
            process_var(key)
                .or_else(|| file_vars.get(key).cloned())
                .ok_or_else(|| ImportError::MissingConfigError {
                    field: key.to_string(),
                })
        };

        Ok(Self {
            sf_user: lookup("SF_USER")?,
            sf_password: lookup("SF_PASSWORD")?,
            sf_domain: lookup("SF_DOMAIN")?,
            sf_token: lookup("SF_TOKEN")?,
            sf_api_base_url: lookup("SF_API_BASE_URL")?,
        })
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("SF_USER", &self.sf_user)?;
        validate_non_empty_string("SF_DOMAIN", &self.sf_domain)?;
        validate_url("SF_API_BASE_URL", &self.sf_api_base_url)?;

        if self.sf_password.is_empty() {
            return Err(ImportError::MissingConfigError {
                field: "SF_PASSWORD".to_string(),
            });
        }

        Ok(())
    }
}
