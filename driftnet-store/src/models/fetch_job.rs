use chrono::{DateTime, Utc};
use driftnet_data::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchJobStatus {
    Running,
    Succeeded,
    Failed,
}

impl FetchJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchJobStatus::Running => "running",
            FetchJobStatus::Succeeded => "succeeded",
            FetchJobStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> driftnet_core::Result<Self> {
        match value {
            "running" => Ok(FetchJobStatus::Running),
            "succeeded" => Ok(FetchJobStatus::Succeeded),
            "failed" => Ok(FetchJobStatus::Failed),
            other => Err(driftnet_core::Error::InvalidArgument(format!(
                "unknown fetch_job status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FetchJobRow {
    pub id: i64,
    pub provider: String,
    pub source_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: String,
    pub stats: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FetchJob {
    pub id: i64,
    pub provider: String,
    pub source_id: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: FetchJobStatus,
    pub stats: Value,
}

impl TryFrom<FetchJobRow> for FetchJob {
    type Error = driftnet_core::Error;

    fn try_from(row: FetchJobRow) -> Result<Self, Self::Error> {
        let started_at = driftnet_core::time::parse_utc(&row.started_at)?
            .ok_or_else(|| driftnet_core::Error::InvalidTimestamp(row.started_at.clone()))?;
        let finished_at = match row.finished_at {
            Some(ref ts) => driftnet_core::time::parse_utc(ts)?,
            None => None,
        };
        let status = FetchJobStatus::parse(&row.status)?;
        let stats = serde_json::from_str(&row.stats).unwrap_or(Value::Null);

        Ok(FetchJob {
            id: row.id,
            provider: row.provider,
            source_id: row.source_id,
            started_at,
            finished_at,
            status,
            stats,
        })
    }
}

impl Entity for FetchJob {
    type Id = i64;

    fn table_name() -> &'static str {
        "fetch_job"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "provider",
            "source_id",
            "started_at",
            "finished_at",
            "status",
            "stats",
        ]
    }

    fn id(&self) -> &i64 {
        &self.id
    }
}
