use chrono::{DateTime, Utc};
use driftnet_data::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CursorRow {
    pub id: i64,
    pub provider: String,
    pub source_id: i64,
    pub position: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cursor {
    pub id: i64,
    pub provider: String,
    pub source_id: i64,
    pub position: Value,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CursorRow> for Cursor {
    type Error = driftnet_core::Error;

    fn try_from(row: CursorRow) -> Result<Self, Self::Error> {
        let updated_at = driftnet_core::time::parse_utc(&row.updated_at)?
            .ok_or_else(|| driftnet_core::Error::InvalidTimestamp(row.updated_at.clone()))?;
        let position = serde_json::from_str(&row.position).unwrap_or(Value::Null);

        Ok(Cursor {
            id: row.id,
            provider: row.provider,
            source_id: row.source_id,
            position,
            updated_at,
        })
    }
}

impl Entity for Cursor {
    type Id = i64;

    fn table_name() -> &'static str {
        "cursor"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "provider", "source_id", "position", "updated_at"]
    }

    fn id(&self) -> &i64 {
        &self.id
    }
}
