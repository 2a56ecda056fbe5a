use chrono::{DateTime, Utc};
use driftnet_data::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The structured slice of a post's entity extraction — hashtags, mentions,
/// links, and attached media references. Stored as JSON TEXT.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PostEntities {
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub media: Vec<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub provider: String,
    pub external_id: String,
    pub author_id: i64,
    pub text: String,
    pub lang: Option<String>,
    pub created_at: String,
    pub collected_at: String,
    pub metrics: String,
    pub entities: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub provider: String,
    pub external_id: String,
    pub author_id: i64,
    pub text: String,
    pub lang: Option<String>,
    pub created_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
    pub metrics: Value,
    pub entities: PostEntities,
}

impl TryFrom<PostRow> for Post {
    type Error = driftnet_core::Error;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let created_at = driftnet_core::time::parse_utc(&row.created_at)?
            .ok_or_else(|| driftnet_core::Error::InvalidTimestamp(row.created_at.clone()))?;
        let collected_at = driftnet_core::time::parse_utc(&row.collected_at)?
            .ok_or_else(|| driftnet_core::Error::InvalidTimestamp(row.collected_at.clone()))?;
        let metrics = serde_json::from_str(&row.metrics).unwrap_or(Value::Null);
        let entities = serde_json::from_str(&row.entities).unwrap_or_default();

        Ok(Post {
            id: row.id,
            provider: row.provider,
            external_id: row.external_id,
            author_id: row.author_id,
            text: row.text,
            lang: row.lang,
            created_at,
            collected_at,
            metrics,
            entities,
        })
    }
}

impl Entity for Post {
    type Id = i64;

    fn table_name() -> &'static str {
        "post"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "provider",
            "external_id",
            "author_id",
            "text",
            "lang",
            "created_at",
            "collected_at",
            "metrics",
            "entities",
        ]
    }

    fn id(&self) -> &i64 {
        &self.id
    }
}
