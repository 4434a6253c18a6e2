//! Wires settings, login and the import pipeline together for one run.

use crate::adapters::salesforce::{SalesforceLogin, SalesforceRestClient, USER_SOBJECT_PATH};
use crate::adapters::storage::LocalStorage;
use crate::config::{Environment, Settings};
use crate::core::engine::ImportEngine;
use crate::core::pipeline::UserImportPipeline;
use crate::domain::model::ImportReport;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ImportJob {
    pub env: Environment,
    pub csv_path: String,
    pub env_dir: String,
    pub report_path: Option<String>,
    pub timeout: Duration,
}

#[cfg(feature = "cli")]
impl From<&crate::config::CliConfig> for ImportJob {
    fn from(config: &crate::config::CliConfig) -> Self {
        Self {
            env: config.env,
            csv_path: config.csv_path.clone(),
            env_dir: config.env_dir.clone(),
            report_path: config.report.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

/// Loads settings for the job's environment, logs in and imports the sheet.
pub async fn run_import(job: &ImportJob) -> Result<ImportReport> {
    let settings = Settings::load(&job.env_dir, job.env)?;
    settings.validate()?;
    tracing::debug!("Settings: {:?}", settings);

    let session = SalesforceLogin::new(&settings)
        .with_timeout(job.timeout)
        .login()
        .await?;

    let client =
        SalesforceRestClient::new(&settings.sf_api_base_url, USER_SOBJECT_PATH, &session, None)
            .with_timeout(job.timeout);

    let pipeline = UserImportPipeline::new(LocalStorage::default(), client, job.csv_path.clone())
        .with_environment(job.env)
        .with_report_path(job.report_path.clone());

    ImportEngine::new(pipeline).run().await
}
