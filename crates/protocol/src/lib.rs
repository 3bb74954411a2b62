//! Wire shapes and service definitions for the machina SDK.
//!
//! This crate defines the logical request/response/frame types the SDK
//! exchanges with a computer's services, and the service traits a
//! transport stub layer implements. The wire encoding itself lives in
//! that stub layer; everything here is encoding-agnostic.
//!
//! Each service channel is scoped to one `(project_id, instance_id)` at
//! construction (see [`machina_core::ChannelScope`]); requests never
//! carry the scope per call.

use machina_core::{Error, Result};
use serde::{Deserialize, Serialize};

pub mod agent;
pub mod browser;
pub mod filesystem;
pub mod terminal;

/// Uniform acknowledgement for unary calls: a success flag plus the
/// server-provided error string when the flag is false.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default)]
    pub error: String,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: String::new(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }

    /// Converts the flag into a `Result`, surfacing the server message.
    pub fn into_result(self) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(Error::Service(self.error))
        }
    }
}
