use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use database::Database;
use llm_interface::{OpenAiModel, OpportunityModel};
use pipeline::{DbLedger, JsonlSink, Orchestrator};
use prospector_core::{excerpt, AppConfig};
use reddit_client::{post_id_from_url, ContentFetcher};

#[derive(Parser)]
#[command(
    name = "prospector",
    version,
    about = "Scrape Reddit for software problems and business opportunities"
)]
struct Cli {
    /// Optional TOML config file; environment variables take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape subreddits and append viable opportunities to a JSONL file
    Scrape {
        /// Subreddits to scan
        #[arg(short, long, num_args = 1.., default_value = "consulting")]
        subreddits: Vec<String>,

        #[arg(short, long, default_value_t = 3)]
        posts_per_subreddit: usize,

        #[arg(short, long, default_value_t = 10)]
        comments_per_post: usize,

        #[arg(short, long, default_value = "results.jsonl")]
        output: PathBuf,
    },
    /// Run the full pipeline over one Reddit post URL
    AnalyzeUrl {
        /// Link to the post, e.g. https://reddit.com/r/consulting/comments/abc123/...
        url: String,

        #[arg(short, long, default_value_t = 15)]
        comments_per_post: usize,

        #[arg(short, long, default_value = "results.jsonl")]
        output: PathBuf,
    },
    /// Run the web front end
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting Prospector - Reddit opportunity finder");

    let config =
        AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Scrape {
            subreddits,
            posts_per_subreddit,
            comments_per_post,
            output,
        } => scrape(config, subreddits, posts_per_subreddit, comments_per_post, output).await,
        Command::AnalyzeUrl {
            url,
            comments_per_post,
            output,
        } => analyze_url(config, url, comments_per_post, output).await,
        Command::Serve { bind } => serve(config, bind).await,
    }
}

async fn open_database(config: &AppConfig) -> anyhow::Result<Arc<Database>> {
    let db = Database::connect(&config.database_path)
        .await
        .context("failed to open the database")?;
    db.run_migrations()
        .await
        .context("failed to run migrations")?;
    Ok(Arc::new(db))
}

fn build_orchestrator(config: &AppConfig, db: Arc<Database>, output: PathBuf) -> Orchestrator {
    let model: Arc<dyn OpportunityModel> = Arc::new(OpenAiModel::new(config));
    Orchestrator::new(
        Arc::new(ContentFetcher::new(config)),
        model,
        Arc::new(DbLedger::new(db)),
        Arc::new(JsonlSink::new(output)),
        Duration::from_millis(config.stage_interval_ms),
        config.context_char_budget,
    )
}

async fn scrape(
    config: AppConfig,
    subreddits: Vec<String>,
    posts_per_subreddit: usize,
    comments_per_post: usize,
    output: PathBuf,
) -> anyhow::Result<()> {
    let db = open_database(&config).await?;
    let orchestrator = build_orchestrator(&config, db, output.clone());

    let run = orchestrator
        .run(&subreddits, posts_per_subreddit, comments_per_post)
        .await?;

    for entry in &run.report {
        println!("  [{}] {} - {}", entry.status, excerpt(&entry.title), entry.url);
    }

    if run.records.is_empty() {
        println!("\nNo viable opportunities found.");
    } else {
        println!("\nSaved {} entries -> {}", run.records.len(), output.display());
    }
    Ok(())
}

async fn analyze_url(
    config: AppConfig,
    url: String,
    comments_per_post: usize,
    output: PathBuf,
) -> anyhow::Result<()> {
    let post_id =
        post_id_from_url(&url).context("could not extract a post id from that URL")?;

    let db = open_database(&config).await?;
    let fetcher = ContentFetcher::new(&config);
    let post = fetcher.fetch_by_id(&post_id, comments_per_post).await?;

    let orchestrator = build_orchestrator(&config, db, output.clone());
    let (report, record) = orchestrator.run_single(&post).await?;

    match record {
        Some(_) => println!("Added '{}' -> {}", excerpt(&post.title), output.display()),
        None => println!("[{}] {}", report.status, report.details),
    }
    Ok(())
}

async fn serve(config: AppConfig, bind: String) -> anyhow::Result<()> {
    let ctx = web::AppContext::initialize(config)
        .await
        .context("failed to initialize the web front end")?;
    web::start_server(ctx, &bind)
        .await
        .context("web server exited with an error")?;
    Ok(())
}
