pub mod notifier;
pub mod pages;
pub mod quota;
pub mod routes;
pub mod session;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use database::Database;
use llm_interface::{OpenAiModel, OpportunityModel};
use prospector_core::{AppConfig, CoreError};
use reddit_client::ContentFetcher;

use crate::notifier::Notifier;

/// Everything the handlers need, built once at startup.
pub struct AppContext {
    pub config: AppConfig,
    pub db: Arc<Database>,
    pub fetcher: Arc<ContentFetcher>,
    pub model: Arc<dyn OpportunityModel>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppContext {
    pub async fn initialize(config: AppConfig) -> Result<Arc<Self>, CoreError> {
        let db = Arc::new(Database::connect(&config.database_path).await?);
        db.run_migrations().await?;

        let fetcher = Arc::new(ContentFetcher::new(&config));
        let model: Arc<dyn OpportunityModel> = Arc::new(OpenAiModel::new(&config));
        let notifier = notifier::select_notifier(&config);

        Ok(Arc::new(Self {
            config,
            db,
            fetcher,
            model,
            notifier,
        }))
    }
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/scrape", post(routes::scrape))
        .route(
            "/verify",
            get(routes::verify_form).post(routes::request_verification),
        )
        .route("/verify/confirm", get(routes::confirm_verification))
        .route("/signin", get(routes::signin_form).post(routes::signin))
        .route("/logout", get(routes::logout))
        .route("/upgrade-interest", post(routes::upgrade_interest))
        .with_state(ctx)
}

pub async fn start_server(ctx: Arc<AppContext>, bind: &str) -> Result<(), CoreError> {
    let router = build_router(ctx);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Web front end listening on http://{}", bind);
    axum::serve(listener, router).await?;
    Ok(())
}
