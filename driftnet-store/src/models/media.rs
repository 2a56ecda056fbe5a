use driftnet_data::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MediaRow {
    pub id: i64,
    pub post_id: i64,
    pub kind: String,
    pub url: String,
    pub metadata: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Media {
    pub id: i64,
    pub post_id: i64,
    pub kind: String,
    pub url: String,
    pub metadata: Value,
}

impl From<MediaRow> for Media {
    fn from(row: MediaRow) -> Self {
        let metadata = serde_json::from_str(&row.metadata).unwrap_or(Value::Null);
        Media {
            id: row.id,
            post_id: row.post_id,
            kind: row.kind,
            url: row.url,
            metadata,
        }
    }
}

impl Entity for Media {
    type Id = i64;

    fn table_name() -> &'static str {
        "media"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "post_id", "kind", "url", "metadata"]
    }

    fn id(&self) -> &i64 {
        &self.id
    }
}
