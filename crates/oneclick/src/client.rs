//! HTTP client for the platform management API

use async_trait::async_trait;
use oneclick_orchestration::{
    AppDefinition, AppDefinitionsResponse, CaptainDefinition, Error, PlatformApi, Result,
};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, info};

const AUTH_HEADER: &str = "x-captain-auth";
const NAMESPACE_HEADER: &str = "x-namespace";
const NAMESPACE: &str = "captain";

/// Status codes the platform uses for successful calls
const STATUS_OK: i64 = 100;
const STATUS_OK_DEPLOY_STARTED: i64 = 101;
const STATUS_OK_PARTIALLY: i64 = 102;

/// Response envelope wrapping every API answer
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    /// Platform status code
    pub status: i64,
    /// Human readable description
    #[serde(default)]
    pub description: String,
    /// Payload
    #[serde(default)]
    pub data: Value,
}

impl ApiEnvelope {
    /// Parse an envelope from a response body
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::api(format!("Malformed response from platform: {}", e)))
    }

    /// Whether the status denotes success
    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            STATUS_OK | STATUS_OK_DEPLOY_STARTED | STATUS_OK_PARTIALLY
        )
    }

    /// Turn a failure status into an error
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::api(format!(
                "{} (status {})",
                self.description, self.status
            )))
        }
    }

    /// Deserialize the payload
    pub fn data<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.data)
            .map_err(|e| Error::api(format!("Unexpected payload from platform: {}", e)))
    }
}

/// Authenticated client for one platform instance
pub struct CaptainClient {
    client: Client,
    base_url: String,
    token: String,
    detached: bool,
}

impl CaptainClient {
    /// Log in and return an authenticated client
    pub async fn login(base_url: &str, password: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::api(format!("Failed to build HTTP client: {}", e)))?;

        let mut this = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: String::new(),
            detached: false,
        };

        info!("Logging in to {}", this.base_url);
        let envelope = this
            .send(Method::POST, "/api/v2/login", Some(json!({ "password": password })))
            .await?;
        let login: LoginData = envelope.data()?;
        this.token = login.token;
        Ok(this)
    }

    /// Ask the platform to register apps in the background
    pub fn with_detached(mut self, detached: bool) -> Self {
        self.detached = detached;
        self
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<ApiEnvelope> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(NAMESPACE_HEADER, NAMESPACE);
        if !self.token.is_empty() {
            request = request.header(AUTH_HEADER, &self.token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::api(format!("{} {} failed: {}", method, url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::api(format!("Failed to read response from {}: {}", url, e)))?;
        if !status.is_success() {
            error!("HTTP {} failed: {} - {}", method, status, text);
            return Err(Error::api(format!("{}: {}", status, text)));
        }

        ApiEnvelope::parse(&text)?.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

/// Path of the register endpoint
fn register_path(detached: bool) -> &'static str {
    if detached {
        "/api/v2/user/apps/appDefinitions/register?detached=1"
    } else {
        "/api/v2/user/apps/appDefinitions/register"
    }
}

/// Body of the deploy call: the descriptor travels as a JSON string
fn deploy_body(definition: &CaptainDefinition) -> Result<Value> {
    let content = serde_json::to_string(definition)
        .map_err(|e| Error::api(format!("Failed to encode deployment descriptor: {}", e)))?;
    Ok(json!({
        "captainDefinitionContent": content,
        "gitHash": "",
    }))
}

#[async_trait]
impl PlatformApi for CaptainClient {
    async fn register(
        &self,
        app_name: &str,
        has_persistent_data: bool,
        detached: bool,
    ) -> Result<()> {
        let path = register_path(detached || self.detached);
        self.send(
            Method::POST,
            path,
            Some(json!({
                "appName": app_name,
                "hasPersistentData": has_persistent_data,
            })),
        )
        .await?;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<AppDefinitionsResponse> {
        self.send(Method::GET, "/api/v2/user/apps/appDefinitions", None)
            .await?
            .data()
    }

    async fn update(&self, app_name: &str, definition: &AppDefinition) -> Result<()> {
        debug!("Updating definition of '{}'", app_name);
        let body = serde_json::to_value(definition)
            .map_err(|e| Error::api(format!("Failed to encode app definition: {}", e)))?;
        self.send(Method::POST, "/api/v2/user/apps/appDefinitions/update", Some(body))
            .await?;
        Ok(())
    }

    async fn deploy(&self, app_name: &str, definition: &CaptainDefinition) -> Result<()> {
        let path = format!("/api/v2/user/apps/appData/{}", app_name);
        self.send(Method::POST, &path, Some(deploy_body(definition)?))
            .await?;
        Ok(())
    }
}
