//! Upload outcome types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a single upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Success,
    Failed,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UploadStatus::Pending)
    }
}

/// Result of pushing one file through the provider chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Provider that served the file, or the last one tried on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Stored on the degraded local path rather than an image host
    #[serde(default)]
    pub is_temporary: bool,
}

impl UploadResult {
    pub fn hosted(provider: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            success: true,
            url: Some(url.into()),
            provider: Some(provider.into()),
            error: None,
            is_temporary: false,
        }
    }

    pub fn temporary(provider: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            is_temporary: true,
            ..Self::hosted(provider, url)
        }
    }

    pub fn failed(provider: Option<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            url: None,
            provider,
            error: Some(error.into()),
            is_temporary: false,
        }
    }
}

/// One entry of the upload ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAttempt {
    pub id: String,
    pub file_name: String,
    pub status: UploadStatus,
    pub timestamp: DateTime<Utc>,
    pub provider: Option<String>,
    #[serde(rename = "sizeMB")]
    pub size_mb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub is_temporary: bool,
}

impl UploadAttempt {
    /// Build a terminal record from an upload result
    pub fn from_result(file_name: impl Into<String>, size_bytes: u64, result: &UploadResult) -> Self {
        Self {
            id: format!("upl_{}", uuid::Uuid::new_v4().simple()),
            file_name: file_name.into(),
            status: if result.success {
                UploadStatus::Success
            } else {
                UploadStatus::Failed
            },
            timestamp: Utc::now(),
            provider: result.provider.clone(),
            size_mb: bytes_to_mb(size_bytes),
            url: result.url.clone(),
            error: result.error.clone(),
            is_temporary: result.is_temporary,
        }
    }

    /// Build a record for an upload that has not finished yet
    pub fn pending(file_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            id: format!("upl_{}", uuid::Uuid::new_v4().simple()),
            file_name: file_name.into(),
            status: UploadStatus::Pending,
            timestamp: Utc::now(),
            provider: None,
            size_mb: bytes_to_mb(size_bytes),
            url: None,
            error: None,
            is_temporary: false,
        }
    }
}

/// Aggregate counters over the ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub pending: usize,
    /// Whole percent, 0 when nothing was uploaded
    pub success_rate: u32,
}

impl UploadStats {
    pub fn from_counts(successful: usize, failed: usize, pending: usize) -> Self {
        let total = successful + failed + pending;
        let success_rate = if total == 0 {
            0
        } else {
            (successful as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            total,
            successful,
            failed,
            pending,
            success_rate,
        }
    }
}

/// Reachability of one upload provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub provider: String,
    pub available: bool,
}

/// Size in megabytes, rounded to two decimals
pub fn bytes_to_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}
