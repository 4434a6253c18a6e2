//! Reader for dotenv style credential files (`envs/.env.dev`, `envs/.env.prod`).

use crate::utils::error::{ImportError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

/// Parses `KEY=VALUE` lines. Returns an empty map when the file does not exist.
pub fn read_env_file<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(content) => parse_env_file(&content).map_err(|e| match e {
            ImportError::ConfigError { message } => {
                ImportError::config(format!("{}: {}", path.display(), message))
            }
            other => other,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Env file {} not found, using process environment only", path.display());
            Ok(HashMap::new())
        }
        Err(e) => Err(ImportError::IoError(e)),
    }
}

pub fn parse_env_file(content: &str) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();

    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            return Err(ImportError::config(format!(
                "line {}: expected KEY=VALUE",
                index + 1
            )));
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(ImportError::config(format!("line {}: empty key", index + 1)));
        }

        let value = unquote(value.trim());
        vars.insert(key.to_string(), substitute_env_vars(value));
    }

    Ok(vars)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Expands `${VAR}` from the process environment; unknown names are kept as is.
fn substitute_env_vars(value: &str) -> String {
    env_var_pattern()
        .replace_all(value, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
}
