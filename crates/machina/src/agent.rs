//! Agent tool: health checks and system metrics for a computer.

use machina_core::{Error, Result};
use machina_protocol::agent::{AgentService, GetHostRequest, MetricsResponse};
use std::sync::Arc;

/// System metrics reported by the computer's guest agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub cpu_count: u32,
    pub cpu_used_pct: f64,
    pub mem_total_mib: u64,
    pub mem_used_mib: u64,
    pub gpu: Option<String>,
    pub vram_total_mib: Option<u64>,
    pub vram_used_mib: Option<u64>,
    pub timestamp: String,
}

impl From<MetricsResponse> for Metrics {
    fn from(response: MetricsResponse) -> Self {
        Self {
            cpu_count: response.cpu_count,
            cpu_used_pct: response.cpu_used_pct,
            mem_total_mib: response.mem_total_mib,
            mem_used_mib: response.mem_used_mib,
            gpu: response.gpu,
            vram_total_mib: response.vram_total_mib,
            vram_used_mib: response.vram_used_mib,
            timestamp: response.timestamp,
        }
    }
}

/// Guest agent access for one computer instance.
pub struct Agent {
    service: Arc<dyn AgentService>,
}

impl Agent {
    pub fn new(service: Arc<dyn AgentService>) -> Self {
        Self { service }
    }

    /// Closes the agent channel.
    pub async fn close(&self) -> Result<()> {
        self.service.close().await
    }

    /// Whether the computer reports itself healthy. An unhealthy report
    /// is a `false`, not an error.
    pub async fn health_check(&self) -> Result<bool> {
        let response = self.service.health_check().await?;
        Ok(response.success)
    }

    /// Current system metrics of the computer.
    pub async fn metrics(&self) -> Result<Metrics> {
        let response = self.service.get_metrics().await?;
        if !response.success {
            return Err(Error::Service(response.error));
        }
        Ok(Metrics::from(response))
    }

    /// Resolves the public host for a port exposed by the computer.
    pub async fn host(&self, port: u32) -> Result<String> {
        let response = self.service.get_host(GetHostRequest { port }).await?;
        if !response.success {
            return Err(Error::Service(response.error));
        }
        Ok(response.host)
    }
}
