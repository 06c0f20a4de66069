//! Async operation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of an asynchronous deploy or delete operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperationStatus {
    #[default]
    Accepted,
    Updating,
    Deleting,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Updating => "Updating",
            Self::Deleting => "Deleting",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Invalid,
    Internal,
    NotFound,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "Invalid",
            Self::Internal => "Internal",
            Self::NotFound => "NotFound",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured error recorded on a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Progress record for one deploy or delete call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    pub name: String,
    pub status: OperationStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub percent_complete: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

impl Operation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: OperationStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            start_time: Utc::now(),
            end_time: None,
            percent_complete: 0.0,
            error: None,
        }
    }

    /// Mark the operation finished.
    pub fn complete(&mut self, status: OperationStatus, error: Option<ErrorDetails>) {
        self.status = status;
        self.end_time = Some(Utc::now());
        self.percent_complete = 100.0;
        self.error = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_sets_end_state() {
        let mut operation = Operation::new("op-1", "op-1", OperationStatus::Updating);
        assert!(!operation.status.is_terminal());

        operation.complete(
            OperationStatus::Failed,
            Some(ErrorDetails {
                code: ErrorCode::Internal,
                message: "boom".to_string(),
                target: Some("op-1".to_string()),
            }),
        );

        assert!(operation.status.is_terminal());
        assert!(operation.end_time.is_some());
        assert_eq!(operation.percent_complete, 100.0);
        assert_eq!(operation.error.as_ref().map(|e| e.code), Some(ErrorCode::Internal));
    }
}
