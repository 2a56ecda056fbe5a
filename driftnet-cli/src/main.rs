use clap::{Parser, Subcommand};
use driftnet::Runtime;
use driftnet_engine::{CollectAuth, CollectRequest, QueryRequest, StatusRequest};

#[derive(Parser)]
#[command(name = "driftnet", version, about = "Collect, query, and inspect a canonical social-media store")]
struct Cli {
    /// Database URL (sqlite:// path, or empty for in-memory)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch new posts from a provider and persist them
    Collect {
        /// Provider name (e.g. bluesky)
        #[arg(long)]
        provider: String,
        /// Author handle or external id to follow
        #[arg(long)]
        source: Option<String>,
        /// Free-text search query
        #[arg(long)]
        q: Option<String>,
        /// Only fetch posts at or after this RFC 3339 timestamp
        #[arg(long)]
        since: Option<String>,
        /// Only fetch posts at or before this RFC 3339 timestamp
        #[arg(long)]
        until: Option<String>,
        /// Posts requested per upstream page
        #[arg(long, default_value_t = 100)]
        page_limit: u32,
        /// Stop after this many posts total
        #[arg(long)]
        limit: Option<u64>,
        /// Provider account identifier, for authenticated requests
        #[arg(long)]
        identifier: Option<String>,
        /// Provider account password or app password
        #[arg(long)]
        password: Option<String>,
    },
    /// Read back persisted posts with keyset pagination
    Query {
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        until: Option<String>,
        /// `@handle` or a numeric/external author id
        #[arg(long)]
        author: Option<String>,
        /// Substring to match against post text
        #[arg(long)]
        contains: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u64,
        /// Continuation token from a previous page's `next_after_key`
        #[arg(long)]
        after: Option<String>,
        /// Comma-separated field projection
        #[arg(long)]
        project: Option<String>,
    },
    /// Show cursor positions and recent job outcomes
    Status {
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit_jobs: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let result = run(cli).await;

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> driftnet_core::Result<()> {
    let runtime = Runtime::configure(cli.database_url.as_deref()).await?;

    match cli.command {
        Commands::Collect {
            provider,
            source,
            q,
            since,
            until,
            page_limit,
            limit,
            identifier,
            password,
        } => {
            let report = runtime
                .collect(CollectRequest {
                    provider,
                    source,
                    q,
                    since_utc: since,
                    until_utc: until,
                    page_limit,
                    limit,
                    auth: CollectAuth {
                        identifier,
                        password,
                        ..Default::default()
                    },
                })
                .await?;
            let output = serde_json::json!({
                "job_id": report.job_id,
                "provider": report.provider,
                "source": report.source,
                "inserted": report.inserted,
                "conflicts": report.conflicts,
                "reached_until": report.reached_until,
                "last_cursor": report.last_cursor,
                "started_at": report.started_at,
                "finished_at": report.finished_at,
                "warnings": report.warnings,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        }
        Commands::Query {
            provider,
            since,
            until,
            author,
            contains,
            limit,
            after,
            project,
        } => {
            let page = runtime
                .query(QueryRequest {
                    provider,
                    since_utc: since,
                    until_utc: until,
                    author,
                    contains,
                    limit,
                    after_key: after,
                    project: project.map(|p| p.split(',').map(|s| s.trim().to_string()).collect()),
                    ..Default::default()
                })
                .await?;
            let output = serde_json::json!({
                "items": page.items,
                "next_after_key": page.next_after_key,
                "count": page.count,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        }
        Commands::Status {
            provider,
            source,
            limit_jobs,
        } => {
            let snapshot = runtime
                .status(StatusRequest {
                    provider,
                    source,
                    limit_jobs,
                })
                .await?;
            let cursors: Vec<_> = snapshot
                .cursors
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "provider": c.provider,
                        "source": c.source,
                        "cursor": c.cursor,
                        "updated_at": c.updated_at,
                    })
                })
                .collect();
            let jobs: Vec<_> = snapshot
                .jobs
                .iter()
                .map(|j| {
                    serde_json::json!({
                        "id": j.id,
                        "provider": j.provider,
                        "source": j.source,
                        "started_at": j.started_at,
                        "finished_at": j.finished_at,
                        "status": j.status,
                        "stats": j.stats,
                    })
                })
                .collect();
            let output = serde_json::json!({ "cursors": cursors, "jobs": jobs });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        }
    }

    Ok(())
}
