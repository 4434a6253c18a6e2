use crate::config::Settings;
use crate::utils::error::{ImportError, Result};
use regex::Regex;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_SOAP_API_VERSION: &str = "59.0";
const LOGIN_CLIENT_ID: &str = "sf-user-import";

/// An authenticated Salesforce session.
#[derive(Clone)]
pub struct Session {
    pub session_id: String,
    pub instance: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &"<redacted>")
            .field("instance", &self.instance)
            .finish()
    }
}

impl Session {
    pub fn new(session_id: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            instance: instance.into(),
        }
    }

    /// Headers every REST call made with this session carries.
    pub fn headers(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.session_id),
            ),
            ("X-PrettyPrint".to_string(), "1".to_string()),
        ])
    }
}

/// Builds the partner SOAP login endpoint. A domain containing `://` is taken
/// as a full base URL, otherwise it is the subdomain of `salesforce.com`
/// (`login`, `test`, `mycompany.my`).
pub fn login_url(domain: &str, api_version: &str) -> String {
    let base = if domain.contains("://") {
        domain.trim_end_matches('/').to_string()
    } else {
        format!("https://{}.salesforce.com", domain)
    };
    format!("{}/services/Soap/u/{}", base, api_version)
}

pub struct SalesforceLogin {
    client: Client,
    username: String,
    password: String,
    security_token: String,
    domain: String,
    api_version: String,
    timeout: Duration,
}

impl SalesforceLogin {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: Client::new(),
            username: settings.sf_user.clone(),
            password: settings.sf_password.clone(),
            security_token: settings.sf_token.clone(),
            domain: settings.sf_domain.clone(),
            api_version: DEFAULT_SOAP_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn login_envelope(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope
        xmlns:xsd="http://www.w3.org/2001/XMLSchema"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xmlns:env="http://schemas.xmlsoap.org/soap/envelope/"
        xmlns:urn="urn:partner.soap.sforce.com">
    <env:Header>
        <urn:CallOptions>
            <urn:client>{client}</urn:client>
            <urn:defaultNamespace>sf</urn:defaultNamespace>
        </urn:CallOptions>
    </env:Header>
    <env:Body>
        <n1:login xmlns:n1="urn:partner.soap.sforce.com">
            <n1:username>{username}</n1:username>
            <n1:password>{password}{token}</n1:password>
        </n1:login>
    </env:Body>
</env:Envelope>"#,
            client = LOGIN_CLIENT_ID,
            username = xml_escape(&self.username),
            password = xml_escape(&self.password),
            token = xml_escape(&self.security_token),
        )
    }

    pub async fn login(&self) -> Result<Session> {
        let url = login_url(&self.domain, &self.api_version);
        tracing::info!("🔐 Logging in to Salesforce as {} via {}", self.username, url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "text/xml; charset=UTF-8")
            .header("SOAPAction", "login")
            .body(self.login_envelope())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let code = xml_element(&body, "exceptionCode")
                .or_else(|| xml_element(&body, "faultcode"))
                .unwrap_or_else(|| status.as_u16().to_string());
            let message = xml_element(&body, "exceptionMessage")
                .or_else(|| xml_element(&body, "faultstring"))
                .unwrap_or_else(|| body.clone());
            tracing::error!("Salesforce login rejected: {} {}", code, message);
            return Err(ImportError::AuthenticationError { code, message });
        }

        let session_id = xml_element(&body, "sessionId").ok_or_else(|| {
            ImportError::AuthenticationError {
                code: status.as_u16().to_string(),
                message: "login response has no sessionId".to_string(),
            }
        })?;
        let server_url = xml_element(&body, "serverUrl").unwrap_or_default();
        let instance = instance_from_server_url(&server_url);

        tracing::info!("✅ Salesforce session established on {}", instance);
        Ok(Session::new(session_id, instance))
    }
}

/// Text content of the first `<name>` or `<prefix:name>` element.
fn xml_element(xml: &str, name: &str) -> Option<String> {
    let pattern = format!(
        r"<(?:[A-Za-z0-9_]+:)?{0}(?:\s[^>]*)?>([^<]*)</(?:[A-Za-z0-9_]+:)?{0}>",
        regex::escape(name)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(xml).map(|caps| xml_unescape(&caps[1]))
}

/// `https://na1-api.salesforce.com/services/Soap/u/59.0/00D...` → `na1.salesforce.com`
fn instance_from_server_url(server_url: &str) -> String {
    url::Url::parse(server_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.replace("-api", "")))
        .unwrap_or_default()
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn xml_unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
