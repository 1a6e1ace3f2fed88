use crate::config::Config;
use crate::error::{auth_error, SchedulerResult};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested during authorization
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/calendar.readonly",
    "https://www.googleapis.com/auth/calendar.events",
];

/// Tokens this close to expiry are refreshed before use
const EXPIRY_MARGIN_SECS: i64 = 60;

/// OAuth token as cached on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: i64,
}

impl StoredToken {
    /// Whether the access token is still usable at `now` (unix seconds)
    pub fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - EXPIRY_MARGIN_SECS > now
    }

    /// Build from a token endpoint response. Refresh responses usually omit
    /// the refresh token, so the previous one is carried over.
    pub fn from_response(
        response: &Value,
        previous_refresh_token: Option<&str>,
        now: i64,
    ) -> SchedulerResult<Self> {
        let access_token = response
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| auth_error("Token response missing 'access_token' field"))?;

        let refresh_token = response
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .or(previous_refresh_token)
            .map(|s| s.to_string());

        let expires_in = response
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .unwrap_or(3600);

        Ok(Self {
            access_token: access_token.to_string(),
            refresh_token,
            expires_at: now + expires_in,
        })
    }
}

/// Consent page URL for the installed-app flow
pub fn authorization_url(config: &Config, state: &str) -> SchedulerResult<Url> {
    let mut url = Url::parse(AUTH_URL)
        .map_err(|e| auth_error(&format!("Failed to parse URL: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.google_client_id)
        .append_pair("redirect_uri", &config.redirect_uri())
        .append_pair("response_type", "code")
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("scope", &SCOPES.join(" "))
        .append_pair("state", state);
    Ok(url)
}

/// Pull the authorization code out of the redirect request path, checking
/// that the state matches the one we sent
pub fn extract_code(request_path: &str, expected_state: &str) -> SchedulerResult<String> {
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(request_path))
        .map_err(|e| auth_error(&format!("Invalid callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(auth_error(&format!("Authorization was denied: {}", error)));
    }
    if state.as_deref() != Some(expected_state) {
        return Err(auth_error("State mismatch in authorization callback"));
    }
    code.ok_or_else(|| auth_error("No authorization code found in callback"))
}

/// Loads, refreshes and stores the OAuth token
#[derive(Clone)]
pub struct TokenManager {
    config: Arc<Config>,
    client: Client,
    cached: Arc<RwLock<Option<StoredToken>>>,
}

impl TokenManager {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            client: Client::new(),
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Get a usable access token: from memory, from the token file, by
    /// refreshing, or as a last resort through the browser flow
    pub async fn get_token(&self) -> SchedulerResult<String> {
        let now = Utc::now().timestamp();

        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.access_token.clone());
            }
        }

        let stored = match self.cached.read().await.clone() {
            Some(token) => Some(token),
            None => self.load().await?,
        };

        let token = match stored {
            Some(token) if token.is_fresh(now) => token,
            Some(StoredToken {
                refresh_token: Some(refresh_token),
                ..
            }) => self.refresh_token(&refresh_token).await?,
            _ => {
                info!("No usable token cached, starting authorization");
                self.authorize().await?
            }
        };

        let access_token = token.access_token.clone();
        *self.cached.write().await = Some(token);
        Ok(access_token)
    }

    /// Exchange a refresh token for a new access token and persist it
    pub async fn refresh_token(&self, refresh_token: &str) -> SchedulerResult<StoredToken> {
        debug!("Refreshing access token");
        let params = [
            ("client_id", self.config.google_client_id.as_str()),
            ("client_secret", self.config.google_client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        let token = StoredToken::from_response(&body, Some(refresh_token), Utc::now().timestamp())?;
        self.set_token(&token).await?;
        Ok(token)
    }

    /// Run the installed-app flow: open the consent page, wait for the
    /// redirect on localhost and exchange the code for tokens
    pub async fn authorize(&self) -> SchedulerResult<StoredToken> {
        let state = uuid::Uuid::new_v4().to_string();
        let auth_url = authorization_url(&self.config, &state)?;

        let address = format!("127.0.0.1:{}", self.config.redirect_port);
        let server = tiny_http::Server::http(&address)
            .map_err(|e| auth_error(&format!("Failed to listen on {}: {}", address, e)))?;

        info!("Opening browser for Google Calendar authorization");
        if let Err(e) = webbrowser::open(auth_url.as_str()) {
            warn!("Could not open a browser ({}); visit this URL manually: {}", e, auth_url);
        }

        // tiny_http blocks, keep it off the async workers
        let request = tokio::task::spawn_blocking(move || server.recv())
            .await
            .map_err(|e| auth_error(&format!("Callback listener failed: {}", e)))??;

        let code = extract_code(request.url(), &state);
        let message = match &code {
            Ok(_) => "Authorization successful! You can close this window.",
            Err(_) => "Authorization failed. Check the terminal for details.",
        };
        if let Err(e) = request.respond(tiny_http::Response::from_string(message)) {
            warn!("Failed to answer the browser: {}", e);
        }
        let code = code?;

        let params = [
            ("client_id", self.config.google_client_id.clone()),
            ("client_secret", self.config.google_client_secret.clone()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri()),
            ("grant_type", "authorization_code".to_string()),
        ];

        let response = self.client.post(TOKEN_URL).form(&params).send().await?;
        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(auth_error(&format!("Failed to get token: {}", error_text)));
        }

        let body: Value = response.json().await?;
        let token = StoredToken::from_response(&body, None, Utc::now().timestamp())?;
        self.set_token(&token).await?;

        info!("Authorization complete");
        Ok(token)
    }

    /// Store a token in memory and in the token file
    pub async fn set_token(&self, token: &StoredToken) -> SchedulerResult<()> {
        save_token_file(&self.config.token_file, token).await?;
        *self.cached.write().await = Some(token.clone());
        Ok(())
    }

    async fn load(&self) -> SchedulerResult<Option<StoredToken>> {
        load_token_file(&self.config.token_file).await
    }
}

/// Read a cached token; a missing file means no token yet
pub async fn load_token_file(path: &Path) -> SchedulerResult<Option<StoredToken>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                warn!("Ignoring unreadable token file {}: {}", path.display(), e);
                Ok(None)
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write a token to disk, creating parent directories as needed
pub async fn save_token_file(path: &Path, token: &StoredToken) -> SchedulerResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_string_pretty(token)?).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn test_config() -> Config {
        Config {
            google_client_id: "client-123".to_string(),
            google_client_secret: "shh".to_string(),
            google_calendar_id: "primary".to_string(),
            timezone: "UTC".to_string(),
            token_file: PathBuf::from("token.json"),
            input_csv_file: PathBuf::from("in.csv"),
            output_file: PathBuf::from("out.txt"),
            output_csv_file: PathBuf::from("out.csv"),
            reschedule_csv_file: PathBuf::from("re.csv"),
            redirect_port: 41519,
            colors: HashMap::new(),
        }
    }

    #[test]
    fn test_is_fresh() {
        let token = StoredToken {
            access_token: "a".to_string(),
            refresh_token: None,
            expires_at: 1_000,
        };
        assert!(token.is_fresh(900));
        assert!(!token.is_fresh(940)); // Inside the margin
        assert!(!token.is_fresh(2_000));
    }

    #[test]
    fn test_from_response_keeps_refresh_token() {
        let response = json!({ "access_token": "new", "expires_in": 100 });
        let token = StoredToken::from_response(&response, Some("old-refresh"), 50).unwrap();

        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(token.expires_at, 150);

        let missing = StoredToken::from_response(&json!({}), None, 0);
        assert!(missing.is_err());
    }

    #[test]
    fn test_authorization_url() {
        let url = authorization_url(&test_config(), "xyz").unwrap();
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs["client_id"], "client-123");
        assert_eq!(pairs["redirect_uri"], "http://localhost:41519");
        assert_eq!(pairs["access_type"], "offline");
        assert_eq!(pairs["state"], "xyz");
        assert!(pairs["scope"].contains("calendar.events"));
    }

    #[test]
    fn test_extract_code() {
        assert_eq!(
            extract_code("/?state=xyz&code=4%2Fabc&scope=s", "xyz").unwrap(),
            "4/abc"
        );
        assert!(extract_code("/?state=other&code=abc", "xyz").is_err());
        assert!(extract_code("/?state=xyz", "xyz").is_err());
        assert!(extract_code("/?error=access_denied&state=xyz", "xyz").is_err());
    }

    #[tokio::test]
    async fn test_token_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");

        assert_eq!(load_token_file(&path).await.unwrap(), None);

        let token = StoredToken {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
            expires_at: 42,
        };
        save_token_file(&path, &token).await.unwrap();
        assert_eq!(load_token_file(&path).await.unwrap(), Some(token));

        tokio::fs::write(&path, "not json").await.unwrap();
        assert_eq!(load_token_file(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_token_uses_fresh_file_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.token_file = dir.path().join("token.json");

        let token = StoredToken {
            access_token: "cached-access".to_string(),
            refresh_token: None,
            expires_at: Utc::now().timestamp() + 3600,
        };
        save_token_file(&config.token_file, &token).await.unwrap();

        let manager = TokenManager::new(Arc::new(config));
        assert_eq!(manager.get_token().await.unwrap(), "cached-access");
    }
}
