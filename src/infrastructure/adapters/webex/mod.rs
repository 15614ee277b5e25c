//! Webex REST adapter

use async_trait::async_trait;
use reqwest::{Client, Proxy, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::application::errors::{BotError, ConfigError};
use crate::application::messaging::{BotSettings, ProxySettings};
use crate::domain::entities::{Membership, Person, Response};
use crate::domain::traits::MessagingApi;

/// Webex API base URL
pub const API_BASE: &str = "https://webexapis.com";

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Items<T> {
    items: Vec<T>,
}

/// Webex REST client
pub struct WebexClient {
    token: String,
    base_url: String,
    client: Client,
}

impl WebexClient {
    pub fn new(token: impl Into<String>) -> Result<Self, BotError> {
        Self::builder(token).build()
    }

    pub fn builder(token: impl Into<String>) -> WebexClientBuilder {
        WebexClientBuilder {
            token: token.into(),
            base_url: API_BASE.to_string(),
            proxy: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Builder carrying the token and proxies of `settings`
    pub fn from_settings(settings: &BotSettings) -> WebexClientBuilder {
        Self::builder(settings.token.clone()).proxy(settings.proxy.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the API URL for a resource path
    fn api_url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BotError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            return Err(BotError::Auth(format!("Webex rejected the token: {}", message)));
        }
        Err(BotError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

pub struct WebexClientBuilder {
    token: String,
    base_url: String,
    proxy: Option<ProxySettings>,
    timeout: Duration,
}

impl WebexClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn proxy(mut self, proxy: Option<ProxySettings>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<WebexClient, BotError> {
        if self.token.is_empty() {
            return Err(ConfigError::MissingField("bot.token".to_string()).into());
        }

        let mut builder = Client::builder().timeout(self.timeout);
        if let Some(proxy) = &self.proxy {
            if let Some(http) = &proxy.http {
                builder = builder.proxy(Proxy::http(http).map_err(invalid_proxy)?);
            }
            if let Some(https) = &proxy.https {
                builder = builder.proxy(Proxy::https(https).map_err(invalid_proxy)?);
            }
        }
        let client = builder
            .build()
            .map_err(|e| BotError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(WebexClient {
            token: self.token,
            base_url: self.base_url,
            client,
        })
    }
}

fn invalid_proxy(e: reqwest::Error) -> BotError {
    ConfigError::InvalidValue(format!("proxy: {}", e)).into()
}

#[async_trait]
impl MessagingApi for WebexClient {
    async fn create_message(&self, message: &Response) -> Result<String, BotError> {
        tracing::debug!("Creating message in {:?}", message.room_id.as_deref().or(message.to_person_email.as_deref()));

        let response = self
            .client
            .post(self.api_url("messages"))
            .bearer_auth(&self.token)
            .json(message)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let created: CreatedMessage = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;
        Ok(created.id)
    }

    async fn delete_message(&self, message_id: &str) -> Result<(), BotError> {
        let response = self
            .client
            .delete(self.api_url(&format!("messages/{}", message_id)))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn me(&self) -> Result<Person, BotError> {
        let response = self
            .client
            .get(self.api_url("people/me"))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))
    }

    async fn list_memberships(&self, room_id: &str, person_email: &str) -> Result<Vec<Membership>, BotError> {
        let response = self
            .client
            .get(self.api_url("memberships"))
            .bearer_auth(&self.token)
            .query(&[("roomId", room_id), ("personEmail", person_email)])
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let page: Items<Membership> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;
        Ok(page.items)
    }
}
