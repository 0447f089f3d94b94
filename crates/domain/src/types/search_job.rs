//! Search job types and the job state machine

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use super::list::ListId;
use crate::errors::{ClientError, Result};

/// Identifier of a search job on the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, type = "number"))]
#[serde(transparent)]
pub struct JobId(pub i64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Search strategy; determines the parameter schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Keyword,
    IndustryLocation,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::IndustryLocation => "industry_location",
        }
    }

    /// Path segment of the job-create endpoint for this kind
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::IndustryLocation => "industry-location",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keyword" => Ok(Self::Keyword),
            "industry_location" => Ok(Self::IndustryLocation),
            other => Err(ClientError::validation("job_type", format!("unknown job kind '{other}'"))),
        }
    }
}

/// Search job status.
///
/// Ordered `pending < processing < completed | failed`. Polling samples the
/// remote state, so a job may skip ranks between two snapshots.
/// `completed` and `failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Map a wire status onto the known set; anything else is
    /// `UnknownStatus`, never a default.
    pub fn classify(raw: &str) -> Result<Self> {
        match raw {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(ClientError::UnknownStatus(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// Whether `next` may be observed after `self`. Any forward move is
    /// allowed, as is re-observing the same non-terminal status. Nothing
    /// follows a terminal status.
    pub fn can_transition_to(&self, next: Self) -> bool {
        !self.is_terminal() && next.rank() >= self.rank()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search job exactly as returned by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchJobRecord {
    pub id: JobId,
    pub job_type: String,
    pub status: String,
    pub list_id: ListId,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
    #[serde(default)]
    pub result_count: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Classified search job snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct SearchJob {
    pub id: JobId,
    pub job_type: JobKind,
    pub status: JobStatus,
    pub list_id: ListId,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Present only when `status` is `completed`
    #[cfg_attr(feature = "ts-gen", ts(type = "number | null"))]
    pub result_count: Option<u64>,
    /// Present only when `status` is `failed`
    pub error_message: Option<String>,
}

impl SearchJob {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl TryFrom<SearchJobRecord> for SearchJob {
    type Error = ClientError;

    fn try_from(record: SearchJobRecord) -> Result<Self> {
        let status = JobStatus::classify(&record.status)?;
        let job_type = record.job_type.parse::<JobKind>().map_err(|_| {
            ClientError::ProtocolViolation(format!(
                "job {} has unknown job_type '{}'",
                record.id, record.job_type
            ))
        })?;

        let result_count = match status {
            JobStatus::Completed => Some(record.result_count.ok_or_else(|| {
                ClientError::ProtocolViolation(format!(
                    "completed job {} has no result_count",
                    record.id
                ))
            })?),
            _ => None,
        };
        let error_message = match status {
            JobStatus::Failed => record.error_message,
            _ => None,
        };
        let completed_at = if status.is_terminal() { record.completed_at } else { None };

        Ok(Self {
            id: record.id,
            job_type,
            status,
            list_id: record.list_id,
            created_at: record.created_at,
            completed_at,
            result_count,
            error_message,
        })
    }
}

/// Identifiers returned by a successful submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct SubmittedJob {
    pub list_id: ListId,
    pub job_id: JobId,
}
