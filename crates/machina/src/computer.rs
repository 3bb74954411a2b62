//! Computer: entry point aggregating the per-service tools for one
//! remote instance.
//!
//! Provisioning (create/start/stop/destroy/fork) happens through the
//! control plane's lifecycle API, outside this crate; a [`Computer`] is
//! built from the descriptor that API returns plus one channel
//! implementation per service, all scoped to the same
//! `(project_id, instance_id)`.

use crate::agent::{Agent, Metrics};
use crate::browser::Browser;
use crate::fs::Filesystem;
use crate::terminal::Terminal;
use machina_core::{ChannelScope, Result};
use machina_protocol::agent::AgentService;
use machina_protocol::browser::BrowserService;
use machina_protocol::filesystem::FilesystemService;
use machina_protocol::terminal::TerminalService;
use std::collections::HashMap;
use std::sync::Arc;

/// Lifecycle state reported by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputerState {
    Starting,
    Started,
    Stopping,
    Stopped,
    Destroying,
    Destroyed,
}

/// Descriptor returned by the control plane for a provisioned computer.
#[derive(Debug, Clone)]
pub struct ComputerDescriptor {
    pub id: String,
    pub template: String,
    pub region: String,
    pub ttl_seconds: Option<u64>,
    pub metadata: HashMap<String, String>,
    pub state: ComputerState,
    pub scope: ChannelScope,
}

/// Channel implementations for the four services of one computer, each
/// already scoped to the computer's `(project_id, instance_id)`.
#[derive(Clone)]
pub struct ServiceSet {
    pub terminal: Arc<dyn TerminalService>,
    pub filesystem: Arc<dyn FilesystemService>,
    pub browser: Arc<dyn BrowserService>,
    pub agent: Arc<dyn AgentService>,
}

/// One remote sandboxed computer.
///
/// The channels must outlive every stream and handle derived from the
/// tools; [`close`](Computer::close) invalidates them all.
pub struct Computer {
    descriptor: ComputerDescriptor,
    agent: Agent,
    terminal: Terminal,
    fs: Filesystem,
    browser: Browser,
}

impl Computer {
    pub fn new(descriptor: ComputerDescriptor, services: ServiceSet) -> Self {
        Self {
            descriptor,
            agent: Agent::new(services.agent),
            terminal: Terminal::new(services.terminal),
            fs: Filesystem::new(services.filesystem),
            browser: Browser::new(services.browser),
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn template(&self) -> &str {
        &self.descriptor.template
    }

    pub fn region(&self) -> &str {
        &self.descriptor.region
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.descriptor.metadata
    }

    /// Lifecycle state as of the descriptor; the control plane owns
    /// transitions.
    pub fn state(&self) -> ComputerState {
        self.descriptor.state
    }

    pub fn scope(&self) -> &ChannelScope {
        &self.descriptor.scope
    }

    /// Terminal and process management.
    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    /// Filesystem access.
    pub fn fs(&self) -> &Filesystem {
        &self.fs
    }

    /// Browser automation sessions.
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Whether the computer reports itself healthy.
    pub async fn health_check(&self) -> Result<bool> {
        self.agent.health_check().await
    }

    /// Current system metrics of the computer.
    pub async fn metrics(&self) -> Result<Metrics> {
        self.agent.metrics().await
    }

    /// Resolves the public host for a port exposed by the computer.
    pub async fn host(&self, port: u32) -> Result<String> {
        self.agent.host(port).await
    }

    /// Closes every service channel. Streams and handles derived from
    /// this computer fail with a channel-closed error afterwards.
    pub async fn close(&self) -> Result<()> {
        self.agent.close().await?;
        self.fs.close().await?;
        self.terminal.close().await?;
        self.browser.close().await?;
        Ok(())
    }
}
