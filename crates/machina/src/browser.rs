//! Browser tool: browser automation session management.

use machina_core::{Error, Result};
use machina_protocol::browser::{BrowserService, CreateSessionRequest, Dimensions};
use std::collections::HashMap;
use std::sync::Arc;

/// Parameters for creating a browser session. Unset fields leave the
/// server default in place.
#[derive(Debug, Clone, Default)]
pub struct CreateSessionOptions {
    pub proxy_url: Option<String>,
    pub user_agent: Option<String>,
    pub context: Option<String>,
    pub custom_headers: HashMap<String, String>,
    pub block_ads: Option<bool>,
    pub timezone: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Session timeout in seconds.
    pub timeout: Option<u32>,
}

impl CreateSessionOptions {
    /// Viewport dimensions for the wire: present only when both sides are
    /// set, otherwise the server default applies.
    fn dimensions(&self) -> Option<Dimensions> {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Some(Dimensions { width, height }),
            _ => None,
        }
    }
}

/// Browser session manager for one computer instance.
pub struct Browser {
    service: Arc<dyn BrowserService>,
}

impl Browser {
    pub fn new(service: Arc<dyn BrowserService>) -> Self {
        Self { service }
    }

    /// Closes the browser channel. Every session handle derived from this
    /// tool fails afterwards.
    pub async fn close(&self) -> Result<()> {
        self.service.close().await
    }

    /// Creates a browser automation session.
    pub async fn create_session(&self, options: CreateSessionOptions) -> Result<BrowserSession> {
        let dimensions = options.dimensions();
        let response = self
            .service
            .create_session(CreateSessionRequest {
                proxy_url: options.proxy_url,
                user_agent: options.user_agent,
                context: options.context,
                custom_headers: options.custom_headers,
                block_ads: options.block_ads,
                timezone: options.timezone,
                dimensions,
                timeout: options.timeout,
            })
            .await?;
        if !response.success {
            return Err(Error::Service(response.error));
        }
        tracing::debug!(cdp_port = response.cdp_port, "created browser session");
        Ok(BrowserSession {
            cdp_port: response.cdp_port,
            service: Arc::clone(&self.service),
        })
    }
}

/// Handle to one browser automation session.
///
/// The server owns all session state; the handle exposes only the CDP
/// port and termination.
pub struct BrowserSession {
    cdp_port: u32,
    service: Arc<dyn BrowserService>,
}

impl std::fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSession")
            .field("cdp_port", &self.cdp_port)
            .finish_non_exhaustive()
    }
}

impl BrowserSession {
    /// Chrome DevTools Protocol port of the session.
    pub fn cdp_port(&self) -> u32 {
        self.cdp_port
    }

    /// Terminates the session, freeing its server-side resources.
    ///
    /// Call exactly once. The server does not define the behavior of a
    /// second terminate and the client does not guard against it.
    pub async fn terminate(&self) -> Result<()> {
        self.service.terminate_session().await?.into_result()
    }
}
