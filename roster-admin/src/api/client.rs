//! HTTP core shared by all resource endpoints

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use roster_common::config::ApiSettings;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{AdminError, AdminResult};

/// Header carrying the configured API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Decoded response body with its status
#[derive(Debug)]
pub struct Reply<T> {
    pub status: StatusCode,
    pub body: T,
}

/// Authenticated HTTP client for the roster API
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    settings: Arc<ApiSettings>,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> AdminResult<Self> {
        let http = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http,
            settings: Arc::new(settings),
        })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url, path)
    }

    /// Start a request with the API key and Basic credentials attached
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(key) = self.settings.api_key.as_deref() {
            builder = builder.header(API_KEY_HEADER, key);
        }
        if let Some((user, pass)) = self.settings.basic_auth() {
            builder = builder.basic_auth(user, Some(pass));
        }
        builder
    }

    /// Send a request and decode its JSON body
    ///
    /// Any 2xx status (206 included) is accepted. Other statuses become
    /// [`AdminError::Api`] carrying the body's `message`, or
    /// `HTTP error! status: <code>` when the body has none.
    pub async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AdminResult<Reply<T>> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let bytes = response.bytes().await?;
        let value: Option<Value> = serde_json::from_slice(&bytes).ok();

        debug!(%url, status = status.as_u16(), "API response");

        if !status.is_success() {
            let message = value
                .as_ref()
                .and_then(|v| v.get("message"))
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
            warn!(%url, status = status.as_u16(), %message, "API request failed");
            return Err(AdminError::Api { status, message });
        }

        let value = value.ok_or_else(|| {
            AdminError::Decode(format!("{} returned a non-JSON body", url.path()))
        })?;
        let body = serde_json::from_value(value)
            .map_err(|e| AdminError::Decode(format!("{}: {}", url.path(), e)))?;

        Ok(Reply { status, body })
    }
}
