use std::sync::Arc;

use chrono::{DateTime, Utc};
use driftnet_core::{Error, Result};
use driftnet_providers::{AuthorFilter, Filters, HttpTransport, ProviderOptions};
use driftnet_store::models::FetchJobStatus;
use driftnet_store::repository::NewPost;
use driftnet_store::Store;
use serde_json::Value;

/// Explicit auth/transport overrides for `collect`, generalizing spec.md's
/// `extras.http` / `extras.auth` free-form hints into typed fields.
#[derive(Default)]
pub struct CollectAuth {
    pub identifier: Option<String>,
    pub password: Option<String>,
    pub base_url_override: Option<String>,
    pub transport: Option<Arc<dyn HttpTransport>>,
}

pub struct CollectRequest {
    pub provider: String,
    pub source: Option<String>,
    pub q: Option<String>,
    pub since_utc: Option<String>,
    pub until_utc: Option<String>,
    pub page_limit: u32,
    pub limit: Option<u64>,
    pub auth: CollectAuth,
}

impl Default for CollectRequest {
    fn default() -> Self {
        Self {
            provider: String::new(),
            source: None,
            q: None,
            since_utc: None,
            until_utc: None,
            page_limit: 100,
            limit: None,
            auth: CollectAuth::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectReport {
    pub job_id: i64,
    pub provider: String,
    pub source: String,
    pub inserted: u64,
    pub conflicts: u64,
    pub reached_until: bool,
    pub last_cursor: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub warnings: Vec<String>,
}

struct LoopState {
    remaining: Option<u64>,
    cursor: Option<String>,
    last_cursor: Option<String>,
    reached_until: bool,
    inserted: u64,
    conflicts: u64,
    pages: u64,
}

/// Drives a provider through its cursor, deduplicating at persistence
/// time and recording an auditable `FetchJob`.
pub async fn collect(store: &Store, request: CollectRequest) -> Result<CollectReport> {
    if request.provider.trim().is_empty() {
        return Err(Error::InvalidArgument("provider is required".to_string()));
    }
    match (&request.source, &request.q) {
        (Some(_), Some(_)) | (None, None) => {
            return Err(Error::InvalidArgument(
                "exactly one of source or q must be given".to_string(),
            ));
        }
        _ => {}
    }
    let page_limit = request.page_limit.clamp(1, 100);
    let since_utc = match &request.since_utc {
        Some(raw) => driftnet_core::time::parse_utc(raw)?,
        None => None,
    };
    let until_utc = match &request.until_utc {
        Some(raw) => driftnet_core::time::parse_utc(raw)?,
        None => None,
    };

    // Setup.
    let mut provider = driftnet_providers::registry::resolve(&request.provider)?;
    let options = ProviderOptions {
        identifier: request.auth.identifier.clone(),
        password: request.auth.password.clone(),
        base_url_override: request.auth.base_url_override.clone(),
        timeout: None,
        headers: Vec::new(),
        transport: request.auth.transport.clone(),
    };
    let session = provider.configure(options).await?;

    store
        .providers
        .upsert(&session.provider, "", &session.capabilities.as_json())
        .await?;
    let descriptor = request
        .source
        .clone()
        .unwrap_or_else(|| format!("search:{}", request.q.clone().unwrap_or_default()));
    let source_row = store
        .sources
        .get_or_create(&session.provider, &descriptor, None)
        .await?;

    let started_at = Utc::now();
    let job_id = store.fetch_jobs.start(&session.provider, source_row.id).await?;
    tracing::info!(
        target: "driftnet_engine",
        provider = %session.provider,
        source = %descriptor,
        job_id,
        "fetch job started",
    );

    let outcome = run_paging_loop(
        store,
        provider.as_ref(),
        &request,
        &session.provider,
        since_utc,
        until_utc,
        page_limit,
    )
    .await;

    match outcome {
        Ok(state) => {
            if let Some(last_cursor) = &state.last_cursor {
                store
                    .cursors
                    .upsert(
                        &session.provider,
                        source_row.id,
                        &serde_json::json!({"cursor": last_cursor}),
                    )
                    .await?;
            }
            let finished_at = Utc::now();
            store
                .fetch_jobs
                .finish(
                    job_id,
                    FetchJobStatus::Succeeded,
                    &serde_json::json!({
                        "inserted": state.inserted,
                        "conflicts": state.conflicts,
                        "pages": state.pages,
                    }),
                )
                .await?;
            tracing::info!(
                target: "driftnet_engine",
                job_id,
                inserted = state.inserted,
                conflicts = state.conflicts,
                "fetch job succeeded",
            );

            Ok(CollectReport {
                job_id,
                provider: session.provider,
                source: descriptor,
                inserted: state.inserted,
                conflicts: state.conflicts,
                reached_until: state.reached_until,
                last_cursor: state.last_cursor,
                started_at,
                finished_at,
                warnings: session.warnings,
            })
        }
        Err(err) => {
            let finished_at = Utc::now();
            let _ = store
                .fetch_jobs
                .finish(job_id, FetchJobStatus::Failed, &serde_json::json!({}))
                .await;
            let _ = finished_at;
            tracing::warn!(target: "driftnet_engine", job_id, error = %err, "fetch job failed");
            Err(err)
        }
    }
}

async fn run_paging_loop(
    store: &Store,
    provider: &(dyn driftnet_providers::Provider + '_),
    request: &CollectRequest,
    provider_name: &str,
    since_utc: Option<DateTime<Utc>>,
    until_utc: Option<DateTime<Utc>>,
    page_limit: u32,
) -> Result<LoopState> {
    let mut state = LoopState {
        remaining: request.limit,
        cursor: None,
        last_cursor: None,
        reached_until: false,
        inserted: 0,
        conflicts: 0,
        pages: 0,
    };

    loop {
        if state.remaining == Some(0) {
            break;
        }
        let request_limit = match state.remaining {
            Some(remaining) => (page_limit as u64).min(remaining).max(1) as u32,
            None => page_limit,
        };

        let filters = if let Some(source) = &request.source {
            Filters {
                author: Some(AuthorFilter {
                    handle: Some(source.clone()),
                    external_id: None,
                }),
                since_utc,
                until_utc,
                ..Default::default()
            }
        } else {
            Filters {
                q: request.q.clone(),
                since_utc,
                until_utc,
                ..Default::default()
            }
        };

        let batch = provider.fetch_since(state.cursor.clone(), request_limit, &filters).await?;
        let batch_len = batch.items.len();

        persist_page(store, provider_name, &batch.items, since_utc, until_utc, &mut state).await?;

        if let Some(next_cursor) = &batch.next_cursor {
            state.cursor = Some(next_cursor.clone());
            state.last_cursor = Some(next_cursor.clone());
        } else {
            state.cursor = None;
        }

        if let Some(since) = since_utc {
            if let Some(min_created) = batch.items.iter().map(|item| item.created_at).min() {
                if min_created < since {
                    state.reached_until = true;
                }
            }
        }
        state.reached_until |= batch.reached_until;

        state.remaining = state.remaining.map(|r| r.saturating_sub(batch_len as u64));
        state.pages += 1;

        if state.cursor.is_none()
            || batch_len == 0
            || state.remaining == Some(0)
            || state.reached_until
        {
            break;
        }
    }

    Ok(state)
}

async fn persist_page(
    store: &Store,
    provider_name: &str,
    items: &[driftnet_providers::NormalizedPost],
    since_utc: Option<DateTime<Utc>>,
    until_utc: Option<DateTime<Utc>>,
    state: &mut LoopState,
) -> Result<()> {
    // Resolve/insert every item's author unconditionally, before filtering
    // by time window or checking for an already-persisted post, so a
    // brand-new author is never dropped just because all their posts in
    // this page happen to fall outside the window.
    let mut author_ids = std::collections::HashMap::with_capacity(items.len());
    for item in items {
        let author_id = store
            .authors
            .upsert_first_write_wins(
                provider_name,
                &item.author_external_id,
                item.author_handle.as_deref(),
                item.author_display_name.as_deref(),
                &Value::Object(serde_json::Map::new()),
            )
            .await?;
        author_ids.insert(item.external_id.clone(), author_id);
    }

    let mut in_window = Vec::with_capacity(items.len());
    for item in items {
        if let Some(since) = since_utc {
            if item.created_at < since {
                continue;
            }
        }
        if let Some(until) = until_utc {
            if item.created_at > until {
                continue;
            }
        }
        in_window.push(item);
    }

    let external_ids: Vec<String> = in_window.iter().map(|item| item.external_id.clone()).collect();
    let existing = store
        .posts
        .existing_external_ids(provider_name, &external_ids)
        .await?;

    let mut queued = Vec::new();
    for item in in_window {
        if existing.contains(&item.external_id) {
            state.conflicts += 1;
            continue;
        }
        let author_id = author_ids[&item.external_id];
        queued.push(NewPost {
            provider: provider_name.to_string(),
            external_id: item.external_id.clone(),
            author_id,
            text: item.text.clone(),
            lang: item.lang.clone(),
            created_at: item.created_at,
            collected_at: Utc::now(),
            metrics: item.metrics.clone(),
            entities: driftnet_store::models::PostEntities {
                hashtags: item.entities.hashtags.clone(),
                mentions: item.entities.mentions.clone(),
                links: item.entities.links.clone(),
                media: item.entities.media.clone(),
            },
        });
    }

    let outcome = store.posts.insert_batch(&queued).await?;
    state.inserted += outcome.inserted;
    state.conflicts += outcome.duplicates;
    Ok(())
}
