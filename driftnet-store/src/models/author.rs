use driftnet_data::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthorRow {
    pub id: i64,
    pub provider: String,
    pub external_id: String,
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub metadata: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub id: i64,
    pub provider: String,
    pub external_id: String,
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub metadata: Value,
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        let metadata = serde_json::from_str(&row.metadata).unwrap_or(Value::Null);
        Author {
            id: row.id,
            provider: row.provider,
            external_id: row.external_id,
            handle: row.handle,
            display_name: row.display_name,
            metadata,
        }
    }
}

impl Entity for Author {
    type Id = i64;

    fn table_name() -> &'static str {
        "author"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "provider",
            "external_id",
            "handle",
            "display_name",
            "metadata",
        ]
    }

    fn id(&self) -> &i64 {
        &self.id
    }
}
