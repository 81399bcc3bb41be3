use std::sync::Arc;

use serde_json::Value;

/// Notification fired by the view store. Renderers compare the slot version
/// on `Updated` and forward `Refreshed` payloads to the live content.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Updated { name: String },
    Refreshed { name: String, payload: RefreshPayload },
}

impl ViewEvent {
    pub fn name(&self) -> &str {
        match self {
            Self::Updated { name } | Self::Refreshed { name, .. } => name,
        }
    }

    pub fn is_refresh(&self) -> bool {
        matches!(self, Self::Refreshed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshPayload {
    /// Locals of the slot (or of the absorbed write for a sticky refresh).
    pub resolved_locals: Option<Value>,
    /// Set when the refresh comes from an absorbed sticky write.
    pub sticky: Option<String>,
    /// Caller data. Shared, not copied, when one refresh fans out to all slots.
    pub data: Option<Arc<Value>>,
}
