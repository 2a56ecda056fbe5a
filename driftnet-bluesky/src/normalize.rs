use driftnet_core::Result;
use driftnet_providers::{NormalizedEntities, NormalizedPost};
use serde_json::Value;

fn non_negative_counter(record: &Value, key: &str) -> Option<Value> {
    record.get(key).and_then(|v| v.as_i64()).map(|n| Value::from(n.max(0)))
}

/// Normalizes one `app.bsky.feed.post` record (as returned by either
/// `searchPosts` or `getAuthorFeed`) into the provider-neutral shape the
/// collector expects.
pub fn normalize_post(post_json: &Value) -> Result<NormalizedPost> {
    let uri = post_json
        .get("uri")
        .and_then(Value::as_str)
        .ok_or_else(|| driftnet_core::Error::InvalidQuery("post missing uri".to_string()))?
        .to_string();

    let author = post_json.get("author").cloned().unwrap_or(Value::Null);
    let author_external_id = author
        .get("did")
        .and_then(Value::as_str)
        .ok_or_else(|| driftnet_core::Error::InvalidQuery("post missing author.did".to_string()))?
        .to_string();
    let author_handle = author
        .get("handle")
        .and_then(Value::as_str)
        .map(|h| format!("@{h}"));
    let author_display_name = author
        .get("displayName")
        .and_then(Value::as_str)
        .map(|s| s.to_string());

    let record = post_json.get("record").cloned().unwrap_or(Value::Null);
    let text = record
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let created_at_raw = record.get("createdAt").and_then(Value::as_str).unwrap_or_default();
    let created_at = driftnet_core::time::parse_utc(created_at_raw)?
        .ok_or_else(|| driftnet_core::Error::InvalidTimestamp(created_at_raw.to_string()))?;

    let mut metrics = serde_json::Map::new();
    if let Some(likes) = non_negative_counter(post_json, "likeCount") {
        metrics.insert("like_count".to_string(), likes);
    }
    if let Some(replies) = non_negative_counter(post_json, "replyCount") {
        metrics.insert("reply_count".to_string(), replies);
    }
    if let Some(reposts) = non_negative_counter(post_json, "repostCount") {
        metrics.insert("repost_count".to_string(), reposts);
    }

    Ok(NormalizedPost {
        external_id: uri,
        author_external_id,
        author_handle,
        author_display_name,
        text,
        lang: None,
        created_at,
        metrics: Value::Object(metrics),
        entities: NormalizedEntities::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_a_search_post() {
        let payload = serde_json::json!({
            "uri": "at://alice.bsky.social/post/1",
            "author": {"did": "did:plc:abc", "handle": "alice.bsky.social", "displayName": "Alice"},
            "record": {"text": "hello rust", "createdAt": "2025-05-01T12:00:00Z"},
            "likeCount": 3,
            "replyCount": 0,
        });
        let post = normalize_post(&payload).unwrap();
        assert_eq!(post.external_id, "at://alice.bsky.social/post/1");
        assert_eq!(post.author_external_id, "did:plc:abc");
        assert_eq!(post.author_handle.as_deref(), Some("@alice.bsky.social"));
        assert_eq!(post.text, "hello rust");
        assert_eq!(post.metrics["like_count"], 3);
        assert_eq!(post.metrics["reply_count"], 0);
        assert!(post.metrics.get("repost_count").is_none());
    }

    #[test]
    fn missing_uri_is_invalid_query() {
        let payload = serde_json::json!({"author": {"did": "did:plc:abc"}});
        let err = normalize_post(&payload).unwrap_err();
        assert!(matches!(err, driftnet_core::Error::InvalidQuery(_)));
    }
}
