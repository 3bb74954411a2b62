//! Browser automation service: wire shapes and service definition.

use crate::Ack;
use async_trait::async_trait;
use machina_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Viewport dimensions, sent only when both sides are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,
    #[serde(default)]
    pub block_ads: Option<bool>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    /// Session timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub cdp_port: u32,
}

/// Browser automation service for one computer instance.
///
/// The service owns all session state; the client sees only the CDP port
/// of a created session and a session-bound terminate call.
#[async_trait]
pub trait BrowserService: Send + Sync {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CreateSessionResponse>;

    /// Terminates the session bound to this channel.
    async fn terminate_session(&self) -> Result<Ack>;

    /// Closes the underlying channel.
    async fn close(&self) -> Result<()>;
}
