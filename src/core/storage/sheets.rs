//! Google Sheets v4 client
//!
//! Authenticates with a service-account credential bundle. A ready-made
//! bearer token (`access_token` in the bundle, or `ROOMCAT_ACCESS_TOKEN`) is
//! used as-is; otherwise an RS256-signed JWT assertion built from the
//! bundle's `private_key` is exchanged at its `token_uri`.

use std::fs;
use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::core::config::RemoteSettings;

use super::remote::{RemoteError, SheetService};

/// Environment variable holding a ready-made bearer token
pub const ACCESS_TOKEN_ENV: &str = "ROOMCAT_ACCESS_TOKEN";

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Size of a newly created worksheet
const NEW_SHEET_ROWS: u32 = 1000;
const NEW_SHEET_COLUMNS: u32 = 50;

/// The fields of a service-account key file this client uses
#[derive(Debug, Default, Deserialize)]
struct ServiceAccount {
    #[serde(default)]
    client_email: Option<String>,
    #[serde(default)]
    private_key: Option<String>,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// A signed JWT-bearer grant for the token endpoint
#[derive(Debug)]
struct TokenRequest {
    token_uri: String,
    assertion: String,
}

impl TokenRequest {
    fn form(&self) -> [(&'static str, &str); 2] {
        [("grant_type", JWT_BEARER_GRANT), ("assertion", &self.assertion)]
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ServiceAccount {
    fn read(path: &Path) -> Result<Self, RemoteError> {
        let content = fs::read_to_string(path).map_err(|e| credentials_error(path, e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| credentials_error(path, e.to_string()))
    }

    /// A token that needs no exchange: the bundle's own, then the environment's
    fn preset_token(&self) -> Option<String> {
        non_blank(&self.access_token)
            .map(String::from)
            .or_else(|| {
                std::env::var(ACCESS_TOKEN_ENV)
                    .ok()
                    .filter(|t| !t.trim().is_empty())
            })
    }

    /// Sign an assertion valid from `now` (seconds since the epoch)
    fn token_request(&self, now: i64) -> Result<TokenRequest, String> {
        let email = non_blank(&self.client_email).ok_or("bundle has no client_email")?;
        let key_pem = non_blank(&self.private_key).ok_or_else(|| {
            format!(
                "no private_key or access_token for {} (set {} to use a ready-made token)",
                email, ACCESS_TOKEN_ENV
            )
        })?;
        let token_uri = non_blank(&self.token_uri)
            .unwrap_or(DEFAULT_TOKEN_URI)
            .to_string();

        let claims = AssertionClaims {
            iss: email.to_string(),
            scope: SHEETS_SCOPE.to_string(),
            aud: token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = non_blank(&self.private_key_id).map(String::from);
        let key = EncodingKey::from_rsa_pem(key_pem.as_bytes())
            .map_err(|e| format!("invalid private_key: {}", e))?;
        let assertion =
            encode(&header, &claims, &key).map_err(|e| format!("cannot sign assertion: {}", e))?;

        Ok(TokenRequest {
            token_uri,
            assertion,
        })
    }
}

fn credentials_error(path: &Path, message: String) -> RemoteError {
    RemoteError::Credentials {
        path: path.to_path_buf(),
        message,
    }
}

/// Bearer token for the bundle at `path`, exchanging an assertion if needed
fn access_token(client: &Client, path: &Path) -> Result<String, RemoteError> {
    let account = ServiceAccount::read(path)?;
    if let Some(token) = account.preset_token() {
        return Ok(token);
    }

    let request = account
        .token_request(Utc::now().timestamp())
        .map_err(|message| credentials_error(path, message))?;
    debug!(token_uri = %request.token_uri, "exchanging service-account assertion");
    let response = client
        .post(&request.token_uri)
        .form(&request.form())
        .send()?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let token: TokenResponse = response.json()?;
    Ok(token.access_token)
}

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// An authenticated session on one spreadsheet
pub struct GoogleSheets {
    client: Client,
    base: Url,
    spreadsheet_id: String,
    token: String,
}

impl GoogleSheets {
    pub fn connect(settings: &RemoteSettings) -> Result<Self, RemoteError> {
        let credentials = settings
            .credentials
            .as_deref()
            .ok_or_else(|| RemoteError::NotConfigured("remote.credentials is not set".into()))?;
        let spreadsheet_id = resolve_spreadsheet_id(settings)?;
        let base = Url::parse(settings.api_base())
            .map_err(|e| RemoteError::Protocol(format!("invalid api_base: {}", e)))?;
        let client = Client::builder().timeout(settings.timeout()).build()?;
        let token = access_token(&client, credentials)?;

        debug!(spreadsheet = %spreadsheet_id, "connected to spreadsheet service");
        Ok(Self {
            client,
            base,
            spreadsheet_id,
            token,
        })
    }

    /// `{base}/{id}{suffix}` followed by `segments`
    fn url(&self, suffix: &str, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| RemoteError::Protocol("api_base cannot be a base URL".into()))?;
            path.pop_if_empty();
            path.push(&format!("{}{}", self.spreadsheet_id, suffix));
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request.bearer_auth(&self.token).send()?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().unwrap_or_default();
            Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl SheetService for GoogleSheets {
    fn worksheet_exists(&self, title: &str) -> Result<bool, RemoteError> {
        let url = self.url("", &[])?;
        let request = self
            .client
            .get(url)
            .query(&[("fields", "sheets.properties.title")]);
        let meta: SpreadsheetMeta = self.send(request)?.json()?;
        Ok(meta.sheets.iter().any(|s| s.properties.title == title))
    }

    fn add_worksheet(&self, title: &str) -> Result<(), RemoteError> {
        let url = self.url(":batchUpdate", &[])?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": {
                            "rowCount": NEW_SHEET_ROWS,
                            "columnCount": NEW_SHEET_COLUMNS,
                        }
                    }
                }
            }]
        });
        self.send(self.client.post(url).json(&body))?;
        Ok(())
    }

    fn read_values(&self, title: &str) -> Result<Vec<Vec<String>>, RemoteError> {
        let range = a1_range(title);
        let url = self.url("", &["values", &range])?;
        let request = self.client.get(url).query(&[
            ("majorDimension", "ROWS"),
            ("valueRenderOption", "FORMATTED_VALUE"),
        ]);
        let values: ValueRange = self.send(request)?.json()?;
        Ok(values
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    fn clear(&self, title: &str) -> Result<(), RemoteError> {
        let range = format!("{}:clear", a1_range(title));
        let url = self.url("", &["values", &range])?;
        self.send(self.client.post(url).json(&json!({})))?;
        Ok(())
    }

    fn write_values(&self, title: &str, rows: &[Vec<String>]) -> Result<(), RemoteError> {
        let range = a1_range(title);
        let url = self.url("", &["values", &range])?;
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });
        let request = self
            .client
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .json(&body);
        self.send(request)?;
        Ok(())
    }
}

/// A1 notation for a whole worksheet
fn a1_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn resolve_spreadsheet_id(settings: &RemoteSettings) -> Result<String, RemoteError> {
    if let Some(id) = settings.sheet_id.as_deref().filter(|s| !s.trim().is_empty()) {
        return Ok(id.trim().to_string());
    }
    match settings.sheet_url.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(url) => spreadsheet_id_from_url(url),
        None => Err(RemoteError::NotConfigured(
            "remote.sheet_id or remote.sheet_url is required".into(),
        )),
    }
}

/// Extract the id from a `.../spreadsheets/d/<id>/...` URL
pub fn spreadsheet_id_from_url(url: &str) -> Result<String, RemoteError> {
    url.split("/d/")
        .nth(1)
        .and_then(|rest| rest.split(['/', '?', '#']).next())
        .filter(|id| !id.is_empty())
        .map(String::from)
        .ok_or_else(|| RemoteError::BadLocator(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_spreadsheet_id_from_url() {
        let id = spreadsheet_id_from_url(
            "https://docs.google.com/spreadsheets/d/1AbC-xyz_09/edit#gid=0",
        )
        .unwrap();
        assert_eq!(id, "1AbC-xyz_09");
        assert_eq!(
            spreadsheet_id_from_url("https://docs.google.com/spreadsheets/d/abc").unwrap(),
            "abc"
        );
        assert!(matches!(
            spreadsheet_id_from_url("https://example.com/sheet"),
            Err(RemoteError::BadLocator(_))
        ));
    }

    #[test]
    fn test_sheet_id_wins_over_url() {
        let settings = RemoteSettings {
            sheet_id: Some("direct".into()),
            sheet_url: Some("https://docs.google.com/spreadsheets/d/fromurl/edit".into()),
            ..Default::default()
        };
        assert_eq!(resolve_spreadsheet_id(&settings).unwrap(), "direct");

        let settings = RemoteSettings {
            sheet_url: Some("https://docs.google.com/spreadsheets/d/fromurl/edit".into()),
            ..Default::default()
        };
        assert_eq!(resolve_spreadsheet_id(&settings).unwrap(), "fromurl");
    }

    const TEST_KEY: &str = include_str!("../../../tests/fixtures/test-service-account-key.pem");
    const TEST_PUBLIC_KEY: &str =
        include_str!("../../../tests/fixtures/test-service-account-key.pub.pem");

    fn account(bundle: Value) -> ServiceAccount {
        serde_json::from_value(bundle).unwrap()
    }

    #[test]
    fn test_bundle_access_token_needs_no_exchange() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("sa.json");
        fs::write(
            &path,
            r#"{"type": "service_account", "client_email": "bot@x.iam", "access_token": "ya29.token"}"#,
        )
        .unwrap();
        let account = ServiceAccount::read(&path).unwrap();
        assert_eq!(account.preset_token().as_deref(), Some("ya29.token"));
    }

    #[test]
    fn test_unreadable_bundle_is_a_credentials_error() {
        let err = ServiceAccount::read(&PathBuf::from("/nonexistent/sa.json")).unwrap_err();
        assert!(matches!(err, RemoteError::Credentials { .. }));
    }

    #[test]
    fn test_token_request_signs_jwt_bearer_assertion() {
        use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

        let account = account(json!({
            "type": "service_account",
            "client_email": "bot@rooms.iam.gserviceaccount.com",
            "private_key_id": "key-1",
            "private_key": TEST_KEY,
            "token_uri": "https://oauth2.example.test/token",
        }));
        let now = Utc::now().timestamp();
        let request = account.token_request(now).unwrap();

        assert_eq!(request.token_uri, "https://oauth2.example.test/token");
        let form = request.form();
        assert_eq!(form[0], ("grant_type", JWT_BEARER_GRANT));
        assert_eq!(form[1].0, "assertion");

        let header = decode_header(&request.assertion).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("key-1"));

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth2.example.test/token"]);
        validation.set_issuer(&["bot@rooms.iam.gserviceaccount.com"]);
        let key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap();
        let claims = decode::<AssertionClaims>(&request.assertion, &key, &validation)
            .unwrap()
            .claims;
        assert_eq!(claims.scope, SHEETS_SCOPE);
        assert_eq!(claims.iat, now);
        assert_eq!(claims.exp, now + 3600);
    }

    #[test]
    fn test_token_request_defaults_token_uri() {
        let account = account(json!({
            "client_email": "bot@rooms.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
        }));
        let request = account.token_request(1_700_000_000).unwrap();
        assert_eq!(request.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_token_request_without_key_names_the_account() {
        let err = account(json!({"client_email": "bot@p.iam.gserviceaccount.com"}))
            .token_request(0)
            .unwrap_err();
        assert!(err.contains("bot@p.iam.gserviceaccount.com"));

        let err = account(json!({
            "client_email": "bot@p.iam.gserviceaccount.com",
            "private_key": "not a key",
        }))
        .token_request(0)
        .unwrap_err();
        assert!(err.starts_with("invalid private_key"));

        assert!(account(json!({})).token_request(0).is_err());
    }

    #[test]
    fn test_a1_range_quotes_title() {
        assert_eq!(a1_range("data"), "'data'");
        assert_eq!(a1_range("Bob's"), "'Bob''s'");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(json!("a")), "a");
        assert_eq!(cell_text(json!(3)), "3");
        assert_eq!(cell_text(Value::Null), "");
    }
}
