use crate::models::{AccountInfo, Note};
use crate::storage::{TOKEN_KEY, USER_KEY};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_API_URL: &str = "http://localhost:5000";
pub(crate) const DEFAULT_SPELLCHECK_URL: &str = "https://api.languagetool.org/v2/check";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    /// No session token, or the backend answered 401.
    Unauthorized,
    Network,
    Timeout,
    Http,
    Parse,
    /// The backend answered 2xx but reported a logical failure.
    Server,
    Validation,
    /// A browser API (camera, speech, clipboard) is missing or refused.
    Unsupported,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn network(e: reqwest::Error) -> Self {
        Self::new(ApiErrorKind::Network, e.to_string())
    }

    pub fn network_msg(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn parse(e: impl std::fmt::Display) -> Self {
        Self::new(ApiErrorKind::Parse, e.to_string())
    }

    pub fn unauthorized() -> Self {
        Self::new(ApiErrorKind::Unauthorized, "Not signed in")
    }

    pub fn timeout(what: &str, ms: i32) -> Self {
        Self::new(ApiErrorKind::Timeout, format!("{what} timed out after {ms}ms"))
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Server, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unsupported, message)
    }

    /// Wrap a thrown JS value (DOM exceptions, rejected promises).
    pub fn js(v: wasm_bindgen::JsValue) -> Self {
        let message = v
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(&v, &"message".into())
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{v:?}"));
        Self::new(ApiErrorKind::Unsupported, message)
    }

    pub(crate) fn http(status: u16, body: &str, ctx: &str) -> Self {
        if status == 401 {
            return Self::new(ApiErrorKind::Unauthorized, "Session expired, please log in again");
        }
        let detail = server_message(body).unwrap_or_else(|| body.to_string());
        Self::new(ApiErrorKind::Http, format!("{ctx} ({status}): {detail}"))
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Pull the backend's `message` out of an error body, if it is JSON.
pub(crate) fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
}

/// Body of a successful write. Empty or non-JSON bodies become `Null`.
pub(crate) fn ack_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or(serde_json::Value::Null)
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub spellcheck_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let mut cfg = Self {
            api_url: DEFAULT_API_URL.to_string(),
            spellcheck_url: DEFAULT_SPELLCHECK_URL.to_string(),
        };

        // Deployments inject `window.ENV = { API_URL, SPELLCHECK_URL }`.
        // `api_url` is accepted as a lowercase alias.
        let Some(env) = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object())
        else {
            return cfg;
        };

        let read = |key: &str| {
            js_sys::Reflect::get(&env, &key.into())
                .ok()
                .and_then(|v| v.as_string())
                .map(|s| s.trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
        };

        if let Some(url) = read("API_URL").or_else(|| read("api_url")) {
            cfg.api_url = url;
        }
        if let Some(url) = read("SPELLCHECK_URL") {
            cfg.spellcheck_url = url;
        }
        cfg
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<AccountInfo>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct SignupRequest {
    // The auth backend reads a capitalised `Username`.
    #[serde(rename = "Username")]
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct SignupResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<AccountInfo>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub color: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UpdateNoteRequest {
    pub title: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnhanceRequest {
    pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct EnhanceResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "enhancedText", default)]
    pub enhanced_text: Option<String>,
    #[serde(rename = "serviceUsed", default)]
    pub service_used: Option<String>,
    #[serde(rename = "processingTime", default)]
    pub processing_time: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SpellMatch {
    /// UTF-16 code unit offset, as reported by LanguageTool.
    pub offset: usize,
    pub length: usize,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) spellcheck_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            spellcheck_url: DEFAULT_SPELLCHECK_URL.to_string(),
            token: None,
        }
    }

    pub fn load_from_storage() -> Self {
        let cfg = EnvConfig::new();
        let token = web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten())
            .filter(|t| !t.trim().is_empty());

        Self {
            base_url: cfg.api_url,
            spellcheck_url: cfg.spellcheck_url,
            token,
        }
    }

    pub fn save_to_storage(&self) {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            if let Some(token) = &self.token {
                let _ = storage.set_item(TOKEN_KEY, token);
            }
        }
    }

    pub fn clear_storage() {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USER_KEY);
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn get_auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn logout(&mut self) {
        self.token = None;
        Self::clear_storage();
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The bearer header for an authenticated call, or a client-side rejection.
    ///
    /// Nothing is sent when there is no token.
    pub(crate) fn require_auth(&self) -> ApiResult<String> {
        self.get_auth_header().ok_or_else(ApiError::unauthorized)
    }

    fn authed(&self, method: Method, path: &str) -> ApiResult<reqwest::RequestBuilder> {
        let auth = self.require_auth()?;
        Ok(reqwest::Client::new()
            .request(method, self.url(path))
            .header("Authorization", auth))
    }

    fn with_optional_auth(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(auth) = self.get_auth_header() {
            req = req.header("Authorization", auth);
        }
        req
    }

    async fn send<T: DeserializeOwned>(req: reqwest::RequestBuilder, ctx: &str) -> ApiResult<T> {
        let res = req.send().await.map_err(ApiError::network)?;
        let status = res.status();
        if status.is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status.as_u16(), &body, ctx))
        }
    }

    /// Like [`Self::send`] but only the status decides success. Write
    /// endpoints may answer 204 or a plain-text body.
    async fn send_ack(req: reqwest::RequestBuilder, ctx: &str) -> ApiResult<serde_json::Value> {
        let res = req.send().await.map_err(ApiError::network)?;
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        if status.is_success() {
            Ok(ack_body(&body))
        } else {
            Err(ApiError::http(status.as_u16(), &body, ctx))
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let req = reqwest::Client::new()
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            });
        Self::send(req, "Login failed").await
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<SignupResponse> {
        let req = reqwest::Client::new()
            .post(self.url("/api/auth/signup"))
            .json(&SignupRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            });
        Self::send(req, "Signup failed").await
    }

    pub async fn fetch_active_notes(&self) -> ApiResult<Vec<Note>> {
        let data: serde_json::Value =
            Self::send(self.authed(Method::GET, "/api/notes/all")?, "Load notes").await?;
        Ok(Self::parse_note_list_response(&data))
    }

    pub async fn fetch_archived_notes(&self) -> ApiResult<Vec<Note>> {
        let data: serde_json::Value =
            Self::send(self.authed(Method::GET, "/api/notes/archived")?, "Load archive").await?;
        Ok(Self::parse_note_list_response(&data))
    }

    pub async fn search_notes(&self, query: &str) -> ApiResult<Vec<Note>> {
        let path = format!("/api/notes/search?query={}", urlencoding::encode(query));
        let data: serde_json::Value =
            Self::send(self.authed(Method::GET, &path)?, "Search").await?;
        Self::parse_search_response(&data)
    }

    pub async fn create_note(&self, title: &str, content: &str, color: &str) -> ApiResult<Note> {
        let req = self.authed(Method::POST, "/api/notes")?.json(&CreateNoteRequest {
            title: title.to_string(),
            content: content.to_string(),
            color: color.to_string(),
        });
        let data: serde_json::Value = Self::send(req, "Create note").await?;
        Self::parse_note_response(&data, "note").ok_or_else(|| {
            ApiError::parse(format!("Create note succeeded but response is missing note id: {data}"))
        })
    }

    pub async fn update_note(&self, id: &str, title: &str, content: &str) -> ApiResult<Option<Note>> {
        let path = format!("/api/notes/{}", urlencoding::encode(id));
        let req = self.authed(Method::PUT, &path)?.json(&UpdateNoteRequest {
            title: title.to_string(),
            content: content.to_string(),
        });
        let data = Self::send_ack(req, "Update note").await?;
        Ok(Self::parse_note_response(&data, "note"))
    }

    pub async fn delete_note(&self, id: &str) -> ApiResult<()> {
        let path = format!("/api/notes/{}", urlencoding::encode(id));
        Self::send_ack(self.authed(Method::DELETE, &path)?, "Delete note").await?;
        Ok(())
    }

    pub async fn archive_note(&self, id: &str) -> ApiResult<Option<Note>> {
        let path = format!("/api/notes/{}/archive", urlencoding::encode(id));
        let req = self.authed(Method::PUT, &path)?.json(&serde_json::json!({}));
        let data = Self::send_ack(req, "Archive note").await?;
        Ok(Self::parse_note_response(&data, "data"))
    }

    pub async fn unarchive_note(&self, id: &str) -> ApiResult<Option<Note>> {
        let path = format!("/api/notes/{}/unarchive", urlencoding::encode(id));
        let req = self.authed(Method::PUT, &path)?.json(&serde_json::json!({}));
        let data = Self::send_ack(req, "Unarchive note").await?;
        Ok(Self::parse_note_response(&data, "data"))
    }

    pub async fn enhance_text(&self, text: &str) -> ApiResult<EnhanceResponse> {
        let req = self
            .with_optional_auth(reqwest::Client::new().post(self.url("/api/enhance-text")))
            .json(&EnhanceRequest {
                text: text.to_string(),
            });
        Self::send(req, "Enhance text").await
    }

    pub async fn check_spelling(&self, text: &str) -> ApiResult<Vec<SpellMatch>> {
        let body = format!("text={}&language=en-US", urlencoding::encode(text));
        let req = reqwest::Client::new()
            .post(&self.spellcheck_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body);
        let data: serde_json::Value = Self::send(req, "Spell check").await?;
        Ok(Self::parse_spell_matches(&data))
    }

    /// Note lists come back either bare (`[...]`) or wrapped (`{ "data": [...] }`).
    pub(crate) fn parse_note_list_response(data: &serde_json::Value) -> Vec<Note> {
        if data.is_array() {
            return Note::list_from_value(data);
        }
        data.get("data")
            .or_else(|| data.get("notes"))
            .map(Note::list_from_value)
            .unwrap_or_default()
    }

    pub(crate) fn parse_search_response(data: &serde_json::Value) -> ApiResult<Vec<Note>> {
        if data.is_array() {
            return Ok(Note::list_from_value(data));
        }
        let success = data.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
        if !success {
            let message = data
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("search failed");
            return Err(ApiError::server(message));
        }
        Ok(data.get("data").map(Note::list_from_value).unwrap_or_default())
    }

    /// A single note under `field`, or at the top level.
    pub(crate) fn parse_note_response(data: &serde_json::Value, field: &str) -> Option<Note> {
        data.get(field)
            .and_then(Note::from_value)
            .or_else(|| Note::from_value(data))
    }

    pub(crate) fn parse_spell_matches(data: &serde_json::Value) -> Vec<SpellMatch> {
        let list = data
            .get("matches")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        list.iter()
            .filter_map(|m| {
                let offset = m.get("offset")?.as_u64()? as usize;
                let length = m.get("length")?.as_u64()? as usize;
                Some(SpellMatch { offset, length })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_contract_deserialize() {
        let json = r#"{ "token": "jwt-token" }"#;
        let parsed: LoginResponse = serde_json::from_str(json).expect("login response should parse");
        assert_eq!(parsed.token, "jwt-token");
        assert!(parsed.user.is_none());
    }

    #[test]
    fn test_signup_response_contract_deserialize() {
        let json = r#"{
            "token": "jwt-token",
            "user": {"_id": "u1", "Username": "ana", "email": "a@x.io"}
        }"#;
        let parsed: SignupResponse = serde_json::from_str(json).expect("signup response should parse");
        assert_eq!(parsed.token, "jwt-token");
        let user = parsed.user.expect("user should be present");
        assert!(user.extra.is_object());
        assert_eq!(user.extra["Username"], "ana");
    }

    #[test]
    fn test_signup_request_uses_capitalised_username() {
        let req = SignupRequest {
            username: "ana".to_string(),
            email: "a@x.io".to_string(),
            password: "pw".to_string(),
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["Username"], "ana");
        assert!(v.get("username").is_none());
    }

    #[test]
    fn test_api_client_new() {
        let client = ApiClient::new("http://localhost:5000".to_string());
        assert_eq!(client.base_url, "http://localhost:5000");
        assert_eq!(client.spellcheck_url, DEFAULT_SPELLCHECK_URL);
        assert!(client.token.is_none());
        assert_eq!(client.url("/api/notes"), "http://localhost:5000/api/notes");
    }

    #[test]
    fn test_api_client_get_auth_header_with_token() {
        let mut client = ApiClient::new("http://localhost:5000".to_string());
        assert!(client.get_auth_header().is_none());
        client.set_token("my-jwt-token".to_string());
        let header = client.get_auth_header().expect("Should have auth header");
        assert_eq!(header, "Bearer my-jwt-token");
        assert!(client.is_authenticated());
    }

    #[test]
    fn test_logged_out_client_rejects_authenticated_request_locally() {
        let mut client = ApiClient::new("http://localhost:5000".to_string());
        client.set_token("t".to_string());
        assert!(client.require_auth().is_ok());

        client.token = None;
        let err = client.require_auth().expect_err("must be rejected without a token");
        assert_eq!(err.kind, ApiErrorKind::Unauthorized);
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_http_error_prefers_server_message() {
        let e = ApiError::http(400, r#"{"message":"Email already registered"}"#, "Signup failed");
        assert_eq!(e.kind, ApiErrorKind::Http);
        assert_eq!(e.to_string(), "Signup failed (400): Email already registered");

        let e = ApiError::http(500, "boom", "Load notes");
        assert_eq!(e.to_string(), "Load notes (500): boom");

        let e = ApiError::http(401, "", "Load notes");
        assert!(e.is_unauthorized());
    }

    #[test]
    fn test_parse_note_list_response_shapes() {
        let bare = serde_json::json!([{"_id": "1", "title": "a"}]);
        assert_eq!(ApiClient::parse_note_list_response(&bare).len(), 1);

        let wrapped = serde_json::json!({"success": true, "data": [{"_id": "1"}, {"_id": "2"}]});
        assert_eq!(ApiClient::parse_note_list_response(&wrapped).len(), 2);

        let empty = serde_json::json!({"success": true});
        assert!(ApiClient::parse_note_list_response(&empty).is_empty());
    }

    #[test]
    fn test_parse_search_response_reports_logical_failure() {
        let ok = serde_json::json!({"success": true, "data": [{"_id": "1", "title": "abc"}]});
        let notes = ApiClient::parse_search_response(&ok).expect("should succeed");
        assert_eq!(notes[0].title, "abc");

        let failed = serde_json::json!({"success": false, "message": "index offline"});
        let err = ApiClient::parse_search_response(&failed).expect_err("should fail");
        assert_eq!(err.kind, ApiErrorKind::Server);
        assert_eq!(err.message, "index offline");
    }

    #[test]
    fn test_parse_note_response_nested_or_flat() {
        let nested = serde_json::json!({"note": {"id": "n1", "title": "t", "content": "c"}});
        assert_eq!(
            ApiClient::parse_note_response(&nested, "note").map(|n| n.id),
            Some("n1".to_string())
        );

        let flat = serde_json::json!({"_id": "n2"});
        assert_eq!(
            ApiClient::parse_note_response(&flat, "data").map(|n| n.id),
            Some("n2".to_string())
        );

        let ack = serde_json::json!({"success": true});
        assert!(ApiClient::parse_note_response(&ack, "data").is_none());
    }

    #[test]
    fn test_parse_spell_matches() {
        let data = serde_json::json!({
            "matches": [
                {"offset": 4, "length": 5, "message": "typo"},
                {"offset": "bad"},
                {"offset": 12, "length": 3}
            ]
        });
        let m = ApiClient::parse_spell_matches(&data);
        assert_eq!(
            m,
            vec![
                SpellMatch { offset: 4, length: 5 },
                SpellMatch { offset: 12, length: 3 }
            ]
        );
        assert!(ApiClient::parse_spell_matches(&serde_json::json!({})).is_empty());
    }

    #[test]
    fn test_enhance_response_deserialize() {
        let json = r#"{"success": true, "enhancedText": "Clean.", "serviceUsed": "gemini", "processingTime": 812}"#;
        let r: EnhanceResponse = serde_json::from_str(json).expect("should parse");
        assert!(r.success);
        assert_eq!(r.enhanced_text.as_deref(), Some("Clean."));
        assert_eq!(r.processing_time, Some(812));

        let r: EnhanceResponse =
            serde_json::from_str(r#"{"success": false, "message": "quota"}"#).expect("should parse");
        assert!(!r.success);
        assert!(r.enhanced_text.is_none());
    }

    #[test]
    fn test_write_ack_accepts_empty_and_plain_bodies() {
        assert!(ack_body("").is_null());
        assert!(ack_body("OK").is_null());
        assert!(ApiClient::parse_note_response(&ack_body(""), "data").is_none());
        assert!(ApiClient::parse_note_response(&ack_body("OK"), "note").is_none());

        let echoed = ack_body(r#"{"data": {"_id": "n1", "title": "t"}}"#);
        assert_eq!(
            ApiClient::parse_note_response(&echoed, "data").map(|n| n.id),
            Some("n1".to_string())
        );
    }

    #[test]
    fn test_server_message() {
        assert_eq!(server_message(r#"{"message":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(server_message(r#"{"message":"  "}"#), None);
        assert_eq!(server_message("plain text"), None);
    }
}
