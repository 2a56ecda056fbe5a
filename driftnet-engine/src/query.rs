use chrono::{DateTime, Utc};
use driftnet_core::keyset::{decode_after_key, encode_after_key};
use driftnet_core::{Error, Result};
use driftnet_store::repository::PostQuery;
use driftnet_store::Store;
use serde_json::{Map, Value};

const RECOGNIZED_PROJECTION_FIELDS: &[&str] = &[
    "id", "provider", "external_id", "author_id", "created_at", "text", "lang",
];
const DEFAULT_PROJECTION_FIELDS: &[&str] =
    &["id", "provider", "external_id", "author_id", "created_at", "text"];

pub struct QueryRequest {
    pub entity: String,
    pub provider: Option<String>,
    pub since_utc: Option<String>,
    pub until_utc: Option<String>,
    pub author: Option<String>,
    pub contains: Option<String>,
    pub limit: u64,
    pub after_key: Option<String>,
    pub project: Option<Vec<String>>,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            entity: "posts".to_string(),
            provider: None,
            since_utc: None,
            until_utc: None,
            author: None,
            contains: None,
            limit: 50,
            after_key: None,
            project: None,
        }
    }
}

pub struct QueryPage {
    pub items: Vec<Value>,
    pub next_after_key: Option<String>,
    pub count: usize,
}

/// Runs the keyset-paginated scan over the canonical post table.
pub async fn query(store: &Store, request: QueryRequest) -> Result<QueryPage> {
    if request.entity != "posts" {
        return Err(Error::InvalidArgument(format!(
            "entity not implemented: {}",
            request.entity
        )));
    }

    let since_utc = match &request.since_utc {
        Some(raw) => driftnet_core::time::parse_utc(raw)?,
        None => None,
    };
    let until_utc = match &request.until_utc {
        Some(raw) => driftnet_core::time::parse_utc(raw)?,
        None => None,
    };
    let after: Option<(DateTime<Utc>, i64)> = match &request.after_key {
        Some(token) => Some(decode_after_key(token)?),
        None => None,
    };

    let author_ids = match &request.author {
        Some(author) => Some(resolve_author_filter(store, &request.provider, author).await?),
        None => None,
    };

    let post_query = PostQuery {
        provider: request.provider.clone(),
        author_ids,
        text_like: request.contains.clone(),
        since: since_utc,
        until: until_utc,
        after,
        limit: request.limit + 1,
    };

    let mut rows = store.posts.query_page(&post_query).await?;
    let has_more = rows.len() as u64 > request.limit;
    rows.truncate(request.limit as usize);

    let next_after_key = if has_more {
        rows.last().map(|row| encode_after_key(&row.created_at, row.id))
    } else {
        None
    };

    let fields = resolve_projection(&request.project);
    let items = rows.iter().map(|row| project_post(row, &fields)).collect::<Vec<_>>();
    let count = items.len();

    Ok(QueryPage {
        items,
        next_after_key,
        count,
    })
}

async fn resolve_author_filter(
    store: &Store,
    provider: &Option<String>,
    author: &str,
) -> Result<Vec<i64>> {
    let provider = provider.as_deref();
    let mut ids = Vec::new();
    if let Some(handle) = author.strip_prefix('@') {
        let handle = format!("@{handle}");
        if let Some(id) = store.authors.find_id_by_handle(provider, &handle).await? {
            ids.push(id);
        }
    } else {
        if let Some(id) = store.authors.find_id_by_external_id(provider, author).await? {
            ids.push(id);
        }
        if author.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(parsed) = author.parse::<i64>() {
                if !ids.contains(&parsed) {
                    ids.push(parsed);
                }
            }
        }
    }
    Ok(ids)
}

fn resolve_projection(project: &Option<Vec<String>>) -> Vec<String> {
    match project {
        Some(requested) => requested
            .iter()
            .filter(|f| RECOGNIZED_PROJECTION_FIELDS.contains(&f.as_str()))
            .cloned()
            .collect(),
        None => DEFAULT_PROJECTION_FIELDS.iter().map(|s| s.to_string()).collect(),
    }
}

fn project_post(post: &driftnet_store::models::Post, fields: &[String]) -> Value {
    let mut map = Map::new();
    for field in fields {
        let value = match field.as_str() {
            "id" => Value::from(post.id),
            "provider" => Value::from(post.provider.clone()),
            "external_id" => Value::from(post.external_id.clone()),
            "author_id" => Value::from(post.author_id),
            "created_at" => Value::from(driftnet_core::time::to_rfc3339_z(&post.created_at)),
            "text" => Value::from(post.text.clone()),
            "lang" => post.lang.clone().map(Value::from).unwrap_or(Value::Null),
            _ => continue,
        };
        map.insert(field.clone(), value);
    }
    Value::Object(map)
}
