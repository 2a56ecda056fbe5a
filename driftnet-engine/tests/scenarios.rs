//! End-to-end scenarios exercising `collect`/`query` against an in-memory
//! SQLite store with a scripted HTTP transport standing in for Bluesky.

use std::sync::Arc;

use driftnet_core::DatabaseTarget;
use driftnet_engine::{collect, query, CollectAuth, CollectRequest, QueryRequest};
use driftnet_providers::testing::{ScriptedResponse, ScriptedTransport};
use driftnet_store::Store;

async fn fresh_store() -> Store {
    driftnet_bluesky::register(true).ok();
    Store::connect(&DatabaseTarget::Memory).await.unwrap()
}

fn post_json(uri: &str, created_at: &str, like_count: i64) -> serde_json::Value {
    serde_json::json!({
        "uri": uri,
        "author": {"did": "did:plc:alice", "handle": "alice.bsky.social", "displayName": "Alice"},
        "record": {"text": "hello", "createdAt": created_at},
        "likeCount": like_count,
    })
}

#[tokio::test]
async fn s1_author_feed_paginates_and_persists() {
    let store = fresh_store().await;
    let transport = Arc::new(ScriptedTransport::new(vec![
        ScriptedResponse::json(
            "getAuthorFeed",
            200,
            serde_json::json!({
                "feed": [
                    {"post": post_json("at://alice.bsky.social/post/1", "2025-05-01T12:00:00Z", 1)},
                    {"post": post_json("at://alice.bsky.social/post/2", "2025-05-01T12:01:00Z", 2)},
                ],
                "cursor": "next-1",
            }),
        ),
        ScriptedResponse::json(
            "getAuthorFeed",
            200,
            serde_json::json!({
                "feed": [
                    {"post": post_json("at://alice.bsky.social/post/3", "2025-05-01T12:02:00Z", 3)},
                ],
                "cursor": serde_json::Value::Null,
            }),
        ),
    ]));

    let report = collect(
        &store,
        CollectRequest {
            provider: "bluesky".to_string(),
            source: Some("@alice.bsky.social".to_string()),
            page_limit: 2,
            limit: Some(3),
            auth: CollectAuth {
                transport: Some(transport),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(report.inserted, 3);
    assert_eq!(report.conflicts, 0);
    assert_eq!(report.last_cursor.as_deref(), Some("next-1"));

    let count = store.posts.count_for_provider("bluesky").await.unwrap();
    assert_eq!(count, 3);

    let cursor = store.cursors.get("bluesky", 1).await.unwrap().unwrap();
    assert_eq!(cursor.position["cursor"], "next-1");

    let job = store.fetch_jobs.find_by_id(report.job_id).await.unwrap().unwrap();
    assert_eq!(job.status, driftnet_store::models::FetchJobStatus::Succeeded);
    assert_eq!(job.stats["inserted"], 3);
}

#[tokio::test]
async fn s2_idempotent_recollect_counts_conflicts() {
    let store = fresh_store().await;
    let make_transport = || {
        Arc::new(ScriptedTransport::new(vec![ScriptedResponse::json(
            "getAuthorFeed",
            200,
            serde_json::json!({
                "feed": [
                    {"post": post_json("at://alice.bsky.social/post/1", "2025-05-01T12:00:00Z", 1)},
                    {"post": post_json("at://alice.bsky.social/post/2", "2025-05-01T12:01:00Z", 2)},
                ],
                "cursor": "c1",
            }),
        )]))
    };

    let request = || CollectRequest {
        provider: "bluesky".to_string(),
        source: Some("@alice.bsky.social".to_string()),
        limit: Some(2),
        ..Default::default()
    };

    let first = collect(
        &store,
        CollectRequest {
            auth: CollectAuth {
                transport: Some(make_transport()),
                ..Default::default()
            },
            ..request()
        },
    )
    .await
    .unwrap();
    assert_eq!(first.inserted, 2);
    assert_eq!(first.conflicts, 0);

    let second = collect(
        &store,
        CollectRequest {
            auth: CollectAuth {
                transport: Some(make_transport()),
                ..Default::default()
            },
            ..request()
        },
    )
    .await
    .unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.conflicts, 2);
}

#[tokio::test]
async fn s3_search_with_lower_time_bound_stops_early() {
    let store = fresh_store().await;
    let transport = Arc::new(ScriptedTransport::new(vec![
        ScriptedResponse::json(
            "searchPosts",
            200,
            serde_json::json!({
                "posts": [
                    post_json("at://p/1", "2025-05-01T12:00:00Z", 1),
                    post_json("at://p/2", "2025-05-01T11:59:00Z", 1),
                    post_json("at://p/3", "2025-05-01T11:58:00Z", 1),
                ],
                "cursor": "c1",
            }),
        ),
        ScriptedResponse::json(
            "searchPosts",
            200,
            serde_json::json!({
                "posts": [
                    post_json("at://p/4", "2025-05-01T11:57:00Z", 1),
                    post_json("at://p/5", "2025-05-01T11:56:00Z", 1),
                ],
                "cursor": serde_json::Value::Null,
            }),
        ),
    ]));

    let report = collect(
        &store,
        CollectRequest {
            provider: "bluesky".to_string(),
            q: Some("term".to_string()),
            since_utc: Some("2025-05-01T11:57:30Z".to_string()),
            page_limit: 3,
            limit: Some(10),
            auth: CollectAuth {
                transport: Some(transport),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(report.inserted, 3);
    assert!(report.reached_until);
}

#[tokio::test]
async fn out_of_window_post_still_registers_its_author() {
    let store = fresh_store().await;
    let transport = Arc::new(ScriptedTransport::new(vec![ScriptedResponse::json(
        "searchPosts",
        200,
        serde_json::json!({
            "posts": [post_json("at://p/1", "2025-05-01T11:00:00Z", 1)],
            "cursor": serde_json::Value::Null,
        }),
    )]));

    let report = collect(
        &store,
        CollectRequest {
            provider: "bluesky".to_string(),
            q: Some("term".to_string()),
            since_utc: Some("2025-05-01T12:00:00Z".to_string()),
            auth: CollectAuth {
                transport: Some(transport),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(report.inserted, 0);

    let author_id = store
        .authors
        .find_id_by_handle(Some("bluesky"), "@alice.bsky.social")
        .await
        .unwrap();
    assert!(author_id.is_some());
}

#[tokio::test]
async fn s4_anonymous_search_403_fails_the_job() {
    let store = fresh_store().await;
    let transport = Arc::new(ScriptedTransport::new(vec![ScriptedResponse::json(
        "searchPosts",
        403,
        serde_json::json!({}),
    )]));

    let result = collect(
        &store,
        CollectRequest {
            provider: "bluesky".to_string(),
            q: Some("term".to_string()),
            auth: CollectAuth {
                transport: Some(transport),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .await;

    assert!(matches!(result, Err(driftnet_core::Error::InvalidQuery(_))));

    let jobs = store
        .fetch_jobs
        .latest_for_source("bluesky", 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(jobs.status, driftnet_store::models::FetchJobStatus::Failed);
}

#[tokio::test]
async fn s5_authenticated_search_sends_bearer() {
    let store = fresh_store().await;
    let transport = Arc::new(ScriptedTransport::new(vec![
        ScriptedResponse::json("createSession", 200, serde_json::json!({"accessJwt": "TESTTOKEN"})),
        ScriptedResponse::json(
            "searchPosts",
            200,
            serde_json::json!({"posts": [post_json("at://p/1", "2025-05-01T12:00:00Z", 1)], "cursor": serde_json::Value::Null}),
        ),
    ]));

    let report = collect(
        &store,
        CollectRequest {
            provider: "bluesky".to_string(),
            q: Some("term".to_string()),
            auth: CollectAuth {
                identifier: Some("alice".to_string()),
                password: Some("app-password".to_string()),
                transport: Some(transport.clone()),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(report.inserted, 1);
    let requests = transport.requests();
    let search_request = requests.iter().find(|r| r.url.contains("searchPosts")).unwrap();
    assert!(search_request
        .headers
        .iter()
        .any(|(k, v)| k == "Authorization" && v == "Bearer TESTTOKEN"));
}

#[tokio::test]
async fn s6_keyset_pagination_sweep_has_no_duplicates() {
    let store = fresh_store().await;
    let transport = Arc::new(ScriptedTransport::new(vec![ScriptedResponse::json(
        "searchPosts",
        200,
        serde_json::json!({
            "posts": [
                post_json("at://p/1", "2025-05-01T12:04:00Z", 1),
                post_json("at://p/2", "2025-05-01T12:03:00Z", 1),
                post_json("at://p/3", "2025-05-01T12:02:00Z", 1),
                post_json("at://p/4", "2025-05-01T12:01:00Z", 1),
                post_json("at://p/5", "2025-05-01T12:00:00Z", 1),
            ],
            "cursor": serde_json::Value::Null,
        }),
    )]));

    collect(
        &store,
        CollectRequest {
            provider: "bluesky".to_string(),
            q: Some("term".to_string()),
            limit: Some(5),
            auth: CollectAuth {
                transport: Some(transport),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let mut seen = Vec::new();
    let mut after_key = None;
    loop {
        let page = query(
            &store,
            QueryRequest {
                provider: Some("bluesky".to_string()),
                limit: 2,
                after_key: after_key.clone(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        for item in &page.items {
            seen.push(item["external_id"].as_str().unwrap().to_string());
        }
        if page.next_after_key.is_none() {
            break;
        }
        after_key = page.next_after_key;
    }

    assert_eq!(seen.len(), 5);
    assert_eq!(
        seen,
        vec!["at://p/1", "at://p/2", "at://p/3", "at://p/4", "at://p/5"]
    );
    let unique: std::collections::HashSet<_> = seen.iter().collect();
    assert_eq!(unique.len(), 5);
}
