//! JSON request bodies sent to the service.

use serde::{Deserialize, Serialize};

use crate::{Credentials, RequestError};

/// Share action used to enumerate (and thereby mount) a share.
pub const SHARE_ACTION_LIST: &str = "list";

/// Body of `POST /api/login`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest<'a> {
    /// Account name.
    pub username: &'a str,
    /// Account password.
    pub password: &'a str,
}

impl<'a> LoginRequest<'a> {
    /// Build a login body from stored credentials.
    pub fn from_credentials(credentials: &'a Credentials) -> Self {
        Self {
            username: credentials.username(),
            password: credentials.password(),
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, RequestError> {
        serde_json::to_vec(self).map_err(RequestError::Serialization)
    }
}

/// Body of `POST /api/smb`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    /// Action to perform (e.g. `list`).
    pub action: String,
    /// Share name.
    pub share: String,
    /// Path inside the share.
    pub path: String,
    /// Optional action payload; omitted from the JSON when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl ShareRequest {
    /// Create a share request.
    pub fn new(action: &str, share: &str, path: &str, data: Option<&str>) -> Self {
        Self {
            action: action.to_string(),
            share: share.to_string(),
            path: path.to_string(),
            data: data.map(str::to_string),
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, RequestError> {
        serde_json::to_vec(self).map_err(RequestError::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_body_shape() {
        let creds = Credentials::new("u", "p");
        let body = LoginRequest::from_credentials(&creds).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, serde_json::json!({"username": "u", "password": "p"}));
    }

    #[test]
    fn share_body_omits_missing_data() {
        let body = ShareRequest::new(SHARE_ACTION_LIST, "media", "/", None)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"action": "list", "share": "media", "path": "/"})
        );
    }

    #[test]
    fn share_body_includes_data() {
        let req = ShareRequest::new("write", "media", "/a.txt", Some("hello"));
        let json = String::from_utf8(req.to_json().unwrap()).unwrap();
        assert!(json.contains("\"data\":\"hello\""));
    }
}
