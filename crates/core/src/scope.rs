use serde::{Deserialize, Serialize};

/// Addressing for one computer instance, baked into a service channel at
/// construction time.
///
/// Every channel created for a computer carries the same scope; individual
/// calls never pass it. All handles derived from a channel share its scope
/// and its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelScope {
    pub project_id: String,
    pub instance_id: String,
}

impl ChannelScope {
    pub fn new(project_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            instance_id: instance_id.into(),
        }
    }
}

impl std::fmt::Display for ChannelScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.project_id, self.instance_id)
    }
}
