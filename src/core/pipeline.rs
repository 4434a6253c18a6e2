use crate::core::{
    ImportOutcome, ImportReport, Pipeline, Record, Storage, TransformResult, UserGateway,
};
use crate::domain::model::{OutcomeStatus, UserRecord};
use crate::utils::error::{ImportError, Result};
use chrono::Utc;
use std::collections::HashMap;

/// Reads the user sheet, builds `User` payloads and creates them one by one.
pub struct UserImportPipeline<S: Storage, G: UserGateway> {
    storage: S,
    gateway: G,
    csv_path: String,
    environment: String,
    report_path: Option<String>,
}

impl<S: Storage, G: UserGateway> UserImportPipeline<S, G> {
    pub fn new(storage: S, gateway: G, csv_path: impl Into<String>) -> Self {
        Self {
            storage,
            gateway,
            csv_path: csv_path.into(),
            environment: "dev".to_string(),
            report_path: None,
        }
    }

    pub fn with_environment(mut self, environment: impl ToString) -> Self {
        self.environment = environment.to_string();
        self
    }

    pub fn with_report_path(mut self, report_path: Option<String>) -> Self {
        self.report_path = report_path;
        self
    }

    async fn write_report(&self, path: &str, report: &ImportReport) -> Result<()> {
        let json = serde_json::to_vec_pretty(report)?;
        self.storage.write_file(path, &json).await
    }
}

/// Parses CSV text into raw rows. The header is line 1, so the first data
/// row is line 2.
pub fn parse_user_sheet(content: &str) -> Result<Vec<Record>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let line = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(records.len() + 2);

        let data: HashMap<String, String> = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();

        records.push(Record { line, data });
    }

    Ok(records)
}

/// Builds the create payload for one row, or the reason it cannot be sent.
pub fn build_user_record(record: &Record) -> std::result::Result<UserRecord, String> {
    let mut missing = Vec::new();
    let mut blank = Vec::new();

    for column in UserRecord::COLUMNS {
        match record.get(column) {
            None => missing.push(column),
            Some(v) if v.trim().is_empty() && !UserRecord::OPTIONAL_COLUMNS.contains(&column) => {
                blank.push(column)
            }
            Some(_) => {}
        }
    }

    if !missing.is_empty() {
        return Err(format!("missing column(s): {}", missing.join(", ")));
    }
    if !blank.is_empty() {
        return Err(format!("empty required field(s): {}", blank.join(", ")));
    }

    let field = |column: &str| record.get(column).unwrap_or_default().trim().to_string();

    Ok(UserRecord {
        first_name: field("FirstName"),
        last_name: field("LastName"),
        email: field("Email"),
        username: field("Username"),
        alias: field("Alias"),
        time_zone_sid_key: field("TimeZoneSidKey"),
        locale_sid_key: field("LocaleSidKey"),
        email_encoding_key: field("EmailEncodingKey"),
        language_locale_key: field("LanguageLocaleKey"),
        profile_id: field("ProfileId"),
    })
}

fn print_outcome(outcome: &ImportOutcome) {
    match &outcome.status {
        OutcomeStatus::Created { id } => {
            println!(
                "✅ Successfully created user: {} -> {}",
                outcome.display_username(),
                id
            );
        }
        OutcomeStatus::Failed { reason } => {
            println!(
                "❌ Failed to create user: {} -> {}",
                outcome.display_username(),
                reason
            );
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, G: UserGateway> Pipeline for UserImportPipeline<S, G> {
    async fn extract(&self) -> Result<Vec<Record>> {
        tracing::debug!("Reading user sheet from {}", self.csv_path);
        let bytes = self.storage.read_file(&self.csv_path).await?;
        let content = String::from_utf8(bytes).map_err(|e| {
            ImportError::processing(format!(
                "{} is not valid UTF-8: {}",
                self.csv_path, e
            ))
        })?;

        parse_user_sheet(&content)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for record in data {
            match build_user_record(&record) {
                Ok(user) => accepted.push((record.line, user)),
                Err(reason) => {
                    tracing::warn!("Row {} rejected: {}", record.line, reason);
                    rejected.push(ImportOutcome::failed(
                        record.line,
                        record.username().map(str::to_string),
                        reason,
                    ));
                }
            }
        }

        Ok(TransformResult { accepted, rejected })
    }

    async fn load(&self, result: TransformResult) -> Result<ImportReport> {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(result.accepted.len() + result.rejected.len());
        let mut rejected = result.rejected.into_iter().peekable();

        // Both lists are in sheet order; interleave so output follows the CSV.
        for (line, user) in &result.accepted {
            while let Some(outcome) = rejected.next_if(|r| r.line < *line) {
                print_outcome(&outcome);
                outcomes.push(outcome);
            }

            let outcome = match self.gateway.create_user(user).await {
                Ok(id) => {
                    tracing::info!("Created user {} (row {}) as {}", user.username, line, id);
                    ImportOutcome::created(*line, &user.username, id)
                }
                Err(e) => {
                    tracing::error!("Row {} ({}) failed: {}", line, user.username, e);
                    ImportOutcome::failed(*line, Some(user.username.clone()), e.to_string())
                }
            };
            print_outcome(&outcome);
            outcomes.push(outcome);
        }

        for outcome in rejected {
            print_outcome(&outcome);
            outcomes.push(outcome);
        }

        let report = ImportReport {
            environment: self.environment.clone(),
            csv_path: self.csv_path.clone(),
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        // Users are already created at this point; a report that cannot be
        // written must not turn the run into a failure.
        if let Some(path) = &self.report_path {
            match self.write_report(path, &report).await {
                Ok(()) => {
                    tracing::info!("📁 Report saved to: {}", path);
                    println!("📁 Report saved to: {}", path);
                }
                Err(e) => {
                    tracing::error!("Could not write report to {}: {}", path, e);
                    eprintln!("⚠️ Could not write report to {}: {}", path, e);
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const HEADER: &str = "FirstName,LastName,Email,Username,Alias,TimeZoneSidKey,LocaleSidKey,EmailEncodingKey,LanguageLocaleKey,ProfileId";

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &str) {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ImportError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    /// Records every call; usernames listed in `reject` fail.
    #[derive(Clone, Default)]
    struct MockGateway {
        calls: Arc<Mutex<Vec<String>>>,
        reject: Vec<String>,
    }

    #[async_trait::async_trait]
    impl UserGateway for MockGateway {
        async fn create_user(&self, user: &UserRecord) -> Result<String> {
            let mut calls = self.calls.lock().await;
            calls.push(user.username.clone());
            if self.reject.contains(&user.username) {
                return Err(ImportError::ApiStatusError {
                    status: 400,
                    url: "mock".to_string(),
                    body: "DUPLICATE_USERNAME: Duplicate Username.".to_string(),
                });
            }
            Ok(format!("005{:012}", calls.len()))
        }
    }

    fn row(username: &str) -> String {
        format!(
            "Taro,Yamada,{u},{u},tyama,Asia/Tokyo,ja_JP,UTF-8,ja,00e000000000001",
            u = username
        )
    }

    #[test]
    fn test_parse_user_sheet_strips_bom_and_numbers_lines() {
        let csv = format!("\u{feff}{}\n{}\n{}\n", HEADER, row("a@example.com"), row("b@example.com"));
        let records = parse_user_sheet(&csv).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[1].line, 3);
        assert_eq!(records[0].get("FirstName"), Some("Taro"));
        assert_eq!(records[1].username(), Some("b@example.com"));
    }

    #[test]
    fn test_build_user_record_rejects_missing_and_blank() {
        let records = parse_user_sheet(&format!(
            "{}\n{}\n,Yamada,,,x,Asia/Tokyo,ja_JP,UTF-8,ja,00e\n",
            HEADER,
            row("a@example.com")
        ))
        .unwrap();

        let user = build_user_record(&records[0]).unwrap();
        assert_eq!(user.username, "a@example.com");
        assert_eq!(user.profile_id, "00e000000000001");

        let err = build_user_record(&records[1]).unwrap_err();
        assert_eq!(err, "empty required field(s): Email, Username");

        let short = parse_user_sheet("FirstName,LastName\nTaro,Yamada\n").unwrap();
        let err = build_user_record(&short[0]).unwrap_err();
        assert!(err.starts_with("missing column(s): Email, Username"));
    }

    #[test]
    fn test_first_name_may_be_blank() {
        let records = parse_user_sheet(&format!(
            "{}\n,Yamada,a@example.com,a@example.com,ya,Asia/Tokyo,ja_JP,UTF-8,ja,00e\n",
            HEADER
        ))
        .unwrap();
        let user = build_user_record(&records[0]).unwrap();
        assert_eq!(user.first_name, "");
    }

    #[tokio::test]
    async fn test_pipeline_continues_after_row_failure() {
        let storage = MockStorage::default();
        storage
            .put(
                "users.csv",
                &format!(
                    "{}\n{}\n{}\n{}\n",
                    HEADER,
                    row("a@example.com"),
                    row("dup@example.com"),
                    row("c@example.com")
                ),
            )
            .await;

        let gateway = MockGateway {
            reject: vec!["dup@example.com".to_string()],
            ..Default::default()
        };
        let pipeline = UserImportPipeline::new(storage.clone(), gateway.clone(), "users.csv")
            .with_environment("dev")
            .with_report_path(Some("report.json".to_string()));

        let records = pipeline.extract().await.unwrap();
        let transformed = pipeline.transform(records).await.unwrap();
        let report = pipeline.load(transformed).await.unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(report.created_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(
            *gateway.calls.lock().await,
            vec!["a@example.com", "dup@example.com", "c@example.com"]
        );

        let failure = report.failures().next().unwrap();
        assert_eq!(failure.line, 3);
        assert_eq!(failure.display_username(), "dup@example.com");

        let saved = storage.get_file("report.json").await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&saved).unwrap();
        assert_eq!(json["environment"], "dev");
        assert_eq!(json["outcomes"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rejected_rows_are_not_sent() {
        let storage = MockStorage::default();
        storage
            .put(
                "users.csv",
                &format!("{}\nTaro,Yamada\n{}\n", HEADER, row("ok@example.com")),
            )
            .await;

        let gateway = MockGateway::default();
        let pipeline = UserImportPipeline::new(storage, gateway.clone(), "users.csv");

        let records = pipeline.extract().await.unwrap();
        let transformed = pipeline.transform(records).await.unwrap();
        assert_eq!(transformed.accepted.len(), 1);
        assert_eq!(transformed.rejected.len(), 1);

        let report = pipeline.load(transformed).await.unwrap();
        assert_eq!(gateway.calls.lock().await.len(), 1);
        assert_eq!(report.outcomes[0].line, 2);
        assert_eq!(report.outcomes[0].display_username(), "No Username");
        assert!(report.outcomes[1].is_created());
    }

    #[tokio::test]
    async fn test_missing_sheet_is_an_error() {
        let pipeline =
            UserImportPipeline::new(MockStorage::default(), MockGateway::default(), "nope.csv");
        assert!(matches!(
            pipeline.extract().await,
            Err(ImportError::IoError(_))
        ));
    }
}
