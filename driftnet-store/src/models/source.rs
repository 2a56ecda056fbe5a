use driftnet_data::Entity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Source {
    pub id: i64,
    pub provider: String,
    pub descriptor: String,
    pub label: Option<String>,
}

impl Entity for Source {
    type Id = i64;

    fn table_name() -> &'static str {
        "source"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "provider", "descriptor", "label"]
    }

    fn id(&self) -> &i64 {
        &self.id
    }
}
