use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One raw row of the user sheet, keyed by header name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// 1-based line in the CSV file; the header is line 1.
    pub line: usize,
    pub data: HashMap<String, String>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.data.get(column).map(String::as_str)
    }

    pub fn username(&self) -> Option<&str> {
        self.get("Username").filter(|u| !u.trim().is_empty())
    }
}

/// Body of a `User` sobject create call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub alias: String,
    pub time_zone_sid_key: String,
    pub locale_sid_key: String,
    pub email_encoding_key: String,
    pub language_locale_key: String,
    pub profile_id: String,
}

impl UserRecord {
    /// CSV header names, in sheet order.
    pub const COLUMNS: [&'static str; 10] = [
        "FirstName",
        "LastName",
        "Email",
        "Username",
        "Alias",
        "TimeZoneSidKey",
        "LocaleSidKey",
        "EmailEncodingKey",
        "LanguageLocaleKey",
        "ProfileId",
    ];

    /// Columns that may be present but blank.
    pub const OPTIONAL_COLUMNS: [&'static str; 1] = ["FirstName"];
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub accepted: Vec<(usize, UserRecord)>,
    pub rejected: Vec<ImportOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Created { id: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub line: usize,
    pub username: Option<String>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl ImportOutcome {
    pub fn created(line: usize, username: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            line,
            username: Some(username.into()),
            status: OutcomeStatus::Created { id: id.into() },
        }
    }

    pub fn failed(line: usize, username: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            line,
            username,
            status: OutcomeStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self.status, OutcomeStatus::Created { .. })
    }

    pub fn display_username(&self) -> &str {
        self.username.as_deref().unwrap_or("No Username")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub environment: String,
    pub csv_path: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<ImportOutcome>,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn created_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_created()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.total() - self.created_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ImportOutcome> {
        self.outcomes.iter().filter(|o| !o.is_created())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_record_uses_salesforce_field_names() {
        let user = UserRecord {
            first_name: "Taro".to_string(),
            last_name: "Yamada".to_string(),
            email: "taro@example.com".to_string(),
            username: "taro@example.com.dev".to_string(),
            alias: "tyama".to_string(),
            time_zone_sid_key: "Asia/Tokyo".to_string(),
            locale_sid_key: "ja_JP".to_string(),
            email_encoding_key: "UTF-8".to_string(),
            language_locale_key: "ja".to_string(),
            profile_id: "00e000000000001".to_string(),
        };

        let json = serde_json::to_value(&user).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        for column in UserRecord::COLUMNS {
            assert!(keys.contains(&column), "missing {}", column);
        }
        assert_eq!(keys.len(), UserRecord::COLUMNS.len());
        assert_eq!(json["TimeZoneSidKey"], "Asia/Tokyo");
    }

    #[test]
    fn test_report_counts() {
        let now = Utc::now();
        let report = ImportReport {
            environment: "dev".to_string(),
            csv_path: "files/users.csv".to_string(),
            started_at: now,
            finished_at: now,
            outcomes: vec![
                ImportOutcome::created(2, "a@example.com", "005A"),
                ImportOutcome::failed(3, None, "missing column Username"),
                ImportOutcome::created(4, "b@example.com", "005B"),
            ],
        };

        assert_eq!(report.total(), 3);
        assert_eq!(report.created_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.failures().next().unwrap().display_username(), "No Username");
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = ImportOutcome::failed(7, Some("x@example.com".to_string()), "boom");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "boom");
        assert_eq!(json["line"], 7);
    }
}
