// Powerjet
// Copyright (C) Riff Labs Limited <team@riff.cc>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

//! REST transport for the PowerStore management API.
//!
//! One `Gateway` per play: a reqwest client plus a current-thread tokio
//! runtime so the task engine stays synchronous. HTTP 404 becomes the
//! first-class `ApiError::NotFound` outcome so "missing" feeds the
//! create-if-absent logic instead of being treated as a hard failure.

use crate::client::types::JobDetail;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};

const JOB_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection details for one array, supplied at play scope.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ArrayConnection {
    pub endpoint: String,
    pub user: String,
    pub password: String,
    pub verify_certs: Option<bool>,
    pub timeout: Option<u64>,
}

impl ArrayConnection {
    pub fn verify_certs(&self) -> bool {
        // arrays ship with self-signed certificates, so this is opt-in
        self.verify_certs.unwrap_or(false)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The resource does not exist (HTTP 404 on a lookup).
    NotFound,
    /// The array rejected or could not complete the call.
    Failed {
        status: Option<u16>,
        message: String,
        codes: Vec<String>,
    },
}

impl ApiError {
    pub fn failed(message: String) -> ApiError {
        ApiError::Failed { status: None, message, codes: Vec::new() }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound => write!(f, "resource not found"),
            ApiError::Failed { status, message, codes } => {
                write!(f, "{}", message)?;
                if let Some(status) = status {
                    write!(f, " (HTTP {})", status)?;
                }
                if !codes.is_empty() {
                    write!(f, " [codes: {}]", codes.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Turn NotFound into a normal None so callers can branch on existence.
pub fn optional<T>(result: ApiResult<T>) -> ApiResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ApiError::NotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

// error body shape returned by the array's REST API
#[derive(Deserialize, Debug)]
struct ErrorBody {
    #[serde(default)]
    messages: Vec<ErrorMessage>,
}

#[derive(Deserialize, Debug)]
struct ErrorMessage {
    code: Option<String>,
    message_l10n: Option<String>,
}

pub struct Gateway {
    base_url: String,
    user: String,
    password: String,
    timeout: Duration,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl Gateway {
    pub fn connect(conn: &ArrayConnection) -> ApiResult<Gateway> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!conn.verify_certs())
            .timeout(conn.timeout())
            .build()
            .map_err(|e| ApiError::failed(format!("failed to create HTTP client: {}", e)))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::failed(format!("failed to create async runtime: {}", e)))?;

        Ok(Gateway {
            base_url: format!("https://{}/api/rest", conn.endpoint),
            user: conn.user.clone(),
            password: conn.password.clone(),
            timeout: conn.timeout(),
            client,
            runtime,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str, body: Option<&Value>) -> ApiResult<Option<Value>> {
        let url = self.url(path);
        self.runtime.block_on(async {
            let mut request = self.client
                .request(method, &url)
                .basic_auth(&self.user, Some(&self.password));
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await
                .map_err(|e| ApiError::failed(format!("request to {} failed: {}", url, e)))?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound);
            }

            let text = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err(parse_failure(status.as_u16(), &text));
            }

            if text.trim().is_empty() {
                Ok(None)
            } else {
                serde_json::from_str(&text)
                    .map(Some)
                    .map_err(|e| ApiError::failed(format!("failed to parse response from {}: {}", url, e)))
            }
        })
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let body = self.request(reqwest::Method::GET, path, None)?
            .ok_or_else(|| ApiError::failed(format!("empty response from {}", path)))?;
        serde_json::from_value(body)
            .map_err(|e| ApiError::failed(format!("unexpected response shape from {}: {}", path, e)))
    }

    /// List query. The array returns an empty JSON array (not a 404) when
    /// nothing matches, so callers get an empty Vec.
    pub fn get_list<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Vec<T>> {
        let mut full = path.to_string();
        for (i, (key, value)) in query.iter().enumerate() {
            full.push(if i == 0 { '?' } else { '&' });
            full.push_str(key);
            full.push('=');
            full.push_str(&urlencoding::encode(value));
        }
        let body = self.request(reqwest::Method::GET, &full, None)?;
        match body {
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::failed(format!("unexpected response shape from {}: {}", path, e))),
        }
    }

    pub fn post(&self, path: &str, body: &Value) -> ApiResult<Option<Value>> {
        self.request(reqwest::Method::POST, path, Some(body))
    }

    pub fn patch(&self, path: &str, body: &Value) -> ApiResult<Option<Value>> {
        self.request(reqwest::Method::PATCH, path, Some(body))
    }

    pub fn delete(&self, path: &str, body: Option<&Value>) -> ApiResult<()> {
        self.request(reqwest::Method::DELETE, path, body)?;
        Ok(())
    }

    /// Poll an array-side job until it reaches a terminal state, bounded by
    /// the connection timeout.
    pub fn wait_for_job(&self, job_id: &str) -> ApiResult<JobDetail> {
        let start = Instant::now();
        loop {
            let job: JobDetail = self.get(&format!("/job/{}", job_id))?;
            match job.state.as_deref() {
                Some("COMPLETED") => return Ok(job),
                Some("FAILED") => {
                    let detail = job.response_body.as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| String::from("no detail provided"));
                    return Err(ApiError::failed(format!("job {} failed: {}", job_id, detail)));
                },
                _ => {},
            }
            if start.elapsed() > self.timeout {
                return Err(ApiError::failed(format!(
                    "timed out after {}s waiting for job {}", self.timeout.as_secs(), job_id)));
            }
            std::thread::sleep(Duration::from_secs(JOB_POLL_INTERVAL_SECS));
        }
    }
}

/// Pull the created resource id out of a create response.
pub fn created_id(body: &Option<Value>) -> ApiResult<String> {
    body.as_ref()
        .and_then(|v| v.get("id"))
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| ApiError::failed(String::from("create succeeded but no id was returned")))
}

/// Asynchronous operations answer with a job id instead of a result body.
pub fn job_id(body: &Option<Value>) -> Option<String> {
    body.as_ref()
        .and_then(|v| v.get("id"))
        .and_then(|v| v.as_str())
        .map(String::from)
}

fn parse_failure(status: u16, text: &str) -> ApiError {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(text) {
        if !parsed.messages.is_empty() {
            let message = parsed.messages.iter()
                .filter_map(|m| m.message_l10n.clone())
                .collect::<Vec<String>>()
                .join("; ");
            let codes = parsed.messages.iter()
                .filter_map(|m| m.code.clone())
                .collect::<Vec<String>>();
            let message = if message.is_empty() { format!("array returned HTTP {}", status) } else { message };
            return ApiError::Failed { status: Some(status), message, codes };
        }
    }
    let message = if text.trim().is_empty() {
        format!("array returned HTTP {}", status)
    } else {
        text.trim().to_string()
    };
    ApiError::Failed { status: Some(status), message, codes: Vec::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_maps_not_found_to_none() {
        let hit: ApiResult<u32> = Ok(7);
        let miss: ApiResult<u32> = Err(ApiError::NotFound);
        let broken: ApiResult<u32> = Err(ApiError::failed("boom".to_string()));

        assert_eq!(optional(hit).unwrap(), Some(7));
        assert_eq!(optional(miss).unwrap(), None);
        assert!(optional(broken).is_err());
    }

    #[test]
    fn test_parse_failure_extracts_codes() {
        let body = r#"{"messages":[{"code":"0xE0101001000C","severity":"Error","message_l10n":"Volume name already used."}]}"#;
        match parse_failure(422, body) {
            ApiError::Failed { status, message, codes } => {
                assert_eq!(status, Some(422));
                assert_eq!(message, "Volume name already used.");
                assert_eq!(codes, vec!["0xE0101001000C".to_string()]);
            },
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_failure_falls_back_to_raw_text() {
        match parse_failure(500, "internal error") {
            ApiError::Failed { message, codes, .. } => {
                assert_eq!(message, "internal error");
                assert!(codes.is_empty());
            },
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_created_id() {
        let body = Some(serde_json::json!({"id": "abc-123"}));
        assert_eq!(created_id(&body).unwrap(), "abc-123");
        assert!(created_id(&None).is_err());
    }

    #[test]
    fn test_api_error_display() {
        let e = ApiError::Failed {
            status: Some(422),
            message: "bad request".to_string(),
            codes: vec!["0xE01".to_string()],
        };
        assert_eq!(format!("{}", e), "bad request (HTTP 422) [codes: 0xE01]");
        assert_eq!(format!("{}", ApiError::NotFound), "resource not found");
    }
}
