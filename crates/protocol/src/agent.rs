//! Guest agent service: wire shapes and service definition.

use async_trait::async_trait;
use machina_core::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub success: bool,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub success: bool,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub cpu_count: u32,
    #[serde(default)]
    pub cpu_used_pct: f64,
    #[serde(default)]
    pub mem_total_mib: u64,
    #[serde(default)]
    pub mem_used_mib: u64,
    #[serde(default)]
    pub gpu: Option<String>,
    #[serde(default)]
    pub vram_total_mib: Option<u64>,
    #[serde(default)]
    pub vram_used_mib: Option<u64>,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHostRequest {
    pub port: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetHostResponse {
    pub success: bool,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub host: String,
}

/// Guest agent service for one computer instance: health, metrics, and
/// port-to-host resolution.
#[async_trait]
pub trait AgentService: Send + Sync {
    async fn health_check(&self) -> Result<HealthCheckResponse>;

    async fn get_metrics(&self) -> Result<MetricsResponse>;

    async fn get_host(&self, request: GetHostRequest) -> Result<GetHostResponse>;

    /// Closes the underlying channel.
    async fn close(&self) -> Result<()>;
}
