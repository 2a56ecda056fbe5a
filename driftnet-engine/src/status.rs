use driftnet_core::Result;
use driftnet_store::Store;
use serde_json::Value;

pub struct StatusRequest {
    pub provider: Option<String>,
    pub source: Option<String>,
    pub limit_jobs: u64,
}

impl Default for StatusRequest {
    fn default() -> Self {
        Self {
            provider: None,
            source: None,
            limit_jobs: 10,
        }
    }
}

pub struct CursorSnapshot {
    pub provider: String,
    pub source: String,
    pub cursor: Option<String>,
    pub updated_at: String,
}

pub struct JobSnapshot {
    pub id: i64,
    pub provider: String,
    pub source: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: String,
    pub stats: Value,
}

pub struct StatusSnapshot {
    pub cursors: Vec<CursorSnapshot>,
    pub jobs: Vec<JobSnapshot>,
}

/// A read-only snapshot of cursor positions and recent job outcomes. Never
/// raises for missing data; returns empty lists instead.
pub async fn status(store: &Store, request: StatusRequest) -> Result<StatusSnapshot> {
    let providers: Vec<String> = match &request.provider {
        Some(name) => vec![name.clone()],
        None => store.providers.list().await?.into_iter().map(|p| p.name).collect(),
    };

    let mut cursors = Vec::new();
    let mut jobs = Vec::new();

    for provider_name in &providers {
        let sources = sources_for(store, provider_name, &request.source).await?;
        for source in &sources {
            if let Some(cursor) = store.cursors.get(provider_name, source.id).await? {
                let cursor_value = cursor.position.get("cursor").and_then(Value::as_str).map(|s| s.to_string());
                cursors.push(CursorSnapshot {
                    provider: provider_name.clone(),
                    source: source.descriptor.clone(),
                    cursor: cursor_value,
                    updated_at: driftnet_core::time::to_rfc3339_z(&cursor.updated_at),
                });
            }
            let source_jobs = store
                .fetch_jobs
                .for_source(provider_name, source.id, request.limit_jobs)
                .await?;
            for job in source_jobs {
                jobs.push(JobSnapshot {
                    id: job.id,
                    provider: provider_name.clone(),
                    source: source.descriptor.clone(),
                    started_at: driftnet_core::time::to_rfc3339_z(&job.started_at),
                    finished_at: job.finished_at.map(|ts| driftnet_core::time::to_rfc3339_z(&ts)),
                    status: job.status.as_str().to_string(),
                    stats: job.stats,
                });
            }
        }
    }

    cursors.sort_by(|a, b| (a.provider.as_str(), a.source.as_str()).cmp(&(b.provider.as_str(), b.source.as_str())));
    jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    jobs.truncate(request.limit_jobs as usize);

    Ok(StatusSnapshot { cursors, jobs })
}

async fn sources_for(
    store: &Store,
    provider_name: &str,
    source_filter: &Option<String>,
) -> Result<Vec<driftnet_store::models::Source>> {
    if let Some(descriptor) = source_filter {
        let source = store
            .sources
            .find_by_provider_and_descriptor(provider_name, descriptor)
            .await?;
        return Ok(source.into_iter().collect());
    }
    store.sources.find_all_for_provider(provider_name).await
}
