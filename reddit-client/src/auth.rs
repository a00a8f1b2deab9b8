//! OAuth2 password-grant authentication for Reddit "script" apps.

use monitor_core::{CoreError, RedditApiError, RedditCredentials};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError,
    ResourceOwnerPassword, ResourceOwnerUsername, Scope, TokenResponse, TokenUrl,
};
use reqwest::Client;
use std::future::Future;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::{debug, info};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Reddit issues hour-long tokens; used when the response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

pub struct RedditAuth {
    oauth: BasicClient,
    http: Client,
    username: ResourceOwnerUsername,
    password: ResourceOwnerPassword,
    token: Mutex<Option<RedditToken>>,
}

impl RedditAuth {
    pub fn new(credentials: &RedditCredentials, http: Client) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| CoreError::Internal {
            message: format!("invalid authorize URL: {}", e),
        })?;
        let token_url = TokenUrl::new(REDDIT_TOKEN_URL.to_string()).map_err(|e| {
            CoreError::Internal {
                message: format!("invalid token URL: {}", e),
            }
        })?;

        let oauth = BasicClient::new(
            ClientId::new(credentials.client_id.clone()),
            Some(ClientSecret::new(credentials.client_secret.clone())),
            auth_url,
            Some(token_url),
        );

        Ok(Self {
            oauth,
            http,
            username: ResourceOwnerUsername::new(credentials.username.clone()),
            password: ResourceOwnerPassword::new(credentials.password.clone()),
            token: Mutex::new(None),
        })
    }

    pub fn required_scopes() -> Vec<&'static str> {
        vec!["read"]
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(self.token.lock().await.as_ref(), Some(token) if !token.is_expired())
    }

    /// Returns a valid access token, requesting a new one if none is cached or it expired.
    pub async fn access_token(&self) -> Result<String, CoreError> {
        self.token_or_else(|| self.request_token()).await
    }

    /// Returns the cached token while it is valid, otherwise stores and returns `refresh`'s.
    pub(crate) async fn token_or_else<F, Fut>(&self, refresh: F) -> Result<String, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RedditToken, CoreError>>,
    {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
            debug!("Access token expired, requesting a new one");
        }

        let token = refresh().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    pub async fn set_token(&self, token: RedditToken) {
        *self.token.lock().await = Some(token);
    }

    /// Drops the cached token so the next request re-authenticates.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    async fn request_token(&self) -> Result<RedditToken, CoreError> {
        info!("Authenticating with Reddit as u/{}", self.username.as_str());

        let mut request = self.oauth.exchange_password(&self.username, &self.password);
        for scope in Self::required_scopes() {
            request = request.add_scope(Scope::new(scope.to_string()));
        }

        let response = request
            .request_async(|request| send_oauth_request(&self.http, request))
            .await
            .map_err(|e| match e {
                RequestTokenError::Request(err) => CoreError::Network(err),
                RequestTokenError::ServerResponse(response) => {
                    authentication_failed(response.error().to_string())
                }
                // Reddit answers bad credentials with a 200 and an `error` body
                RequestTokenError::Parse(_, body) => authentication_failed(format!(
                    "unexpected token response: {}",
                    String::from_utf8_lossy(&body)
                )),
                RequestTokenError::Other(message) => authentication_failed(message),
            })?;

        let lifetime = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let scope = response
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.as_str().to_string()).collect())
            .unwrap_or_default();

        debug!("Obtained access token valid for {:?}", lifetime);
        Ok(RedditToken {
            access_token: response.access_token().secret().clone(),
            expires_at: SystemTime::now() + lifetime,
            scope,
        })
    }
}

fn authentication_failed(reason: String) -> CoreError {
    CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })
}

/// Runs token requests through the shared client so they carry our User-Agent.
async fn send_oauth_request(
    http: &Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
