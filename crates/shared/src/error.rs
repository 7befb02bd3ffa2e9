use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx response; `body` is the plain-text body exactly as received.
    #[error("{status} {body}")]
    Http { status: u16, body: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("decode failure: {0}")]
    Decode(String),
    #[error("assignment failed for order {order_id}: {detail}")]
    Assignment { order_id: String, detail: String },
    #[error("stale result discarded (sequence {sequence})")]
    StaleResultDiscarded { sequence: u64 },
}

impl DashboardError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Text shown in an error panel. HTTP bodies are passed through untouched.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(detail) | Self::Validation(detail) | Self::Decode(detail) => {
                detail.clone()
            }
            Self::Http { body, .. } => body.clone(),
            Self::Assignment { detail, .. } => detail.clone(),
            Self::StaleResultDiscarded { .. } => String::new(),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleResultDiscarded { .. })
    }
}
