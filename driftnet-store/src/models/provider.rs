use driftnet_data::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProviderRow {
    pub name: String,
    pub version: String,
    pub capabilities: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provider {
    pub name: String,
    pub version: String,
    pub capabilities: Value,
}

impl From<ProviderRow> for Provider {
    fn from(row: ProviderRow) -> Self {
        let capabilities = serde_json::from_str(&row.capabilities).unwrap_or(Value::Null);
        Provider {
            name: row.name,
            version: row.version,
            capabilities,
        }
    }
}

impl Entity for Provider {
    type Id = String;

    fn table_name() -> &'static str {
        "provider"
    }

    fn id_column() -> &'static str {
        "name"
    }

    fn columns() -> &'static [&'static str] {
        &["name", "version", "capabilities"]
    }

    fn id(&self) -> &String {
        &self.name
    }
}
