//! The uniform result envelope returned by every gateway operation.

use serde::Serialize;

/// Outcome of one gateway operation.
///
/// `data` is the type-appropriate empty value on failure: an empty list for list operations,
/// `None` for single-entity operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> OperationResult<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The error text, or `""` for successful results.
    #[must_use]
    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or_default()
    }
}

impl<T> OperationResult<Vec<T>> {
    /// Number of elements in a list payload (0 when absent).
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Payload of `test_connection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
}
