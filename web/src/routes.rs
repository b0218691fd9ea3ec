use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use tracing::{error, info};

use pipeline::{DbLedger, DbSink, Orchestrator};
use prospector_core::{CoreError, ErrorExt, QuotaError};

use crate::{pages, quota, session, AppContext};

/// Maps pipeline errors onto user-facing pages with sensible status codes.
pub struct WebError(pub CoreError);

impl<E: Into<CoreError>> From<E> for WebError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::Quota(_) => StatusCode::TOO_MANY_REQUESTS,
            CoreError::Verification(_) => StatusCode::BAD_REQUEST,
            CoreError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("Request failed [{}]: {}", self.0.error_code(), self.0);
        (status, pages::error_page(&self.0.user_friendly_message())).into_response()
    }
}

fn current_email(ctx: &AppContext, headers: &HeaderMap) -> Option<String> {
    session::email_from_headers(&ctx.config.session_secret, headers)
}

fn owner_key(email: Option<&str>) -> String {
    email.unwrap_or(quota::ANONYMOUS_KEY).to_string()
}

/// Comma- or newline-separated subreddit names, with optional `r/` prefixes.
fn parse_subreddits(raw: &str) -> Vec<String> {
    let mut names = Vec::new();
    for piece in raw.split(|c| c == ',' || c == '\n' || c == '\r') {
        let name = piece.trim().trim_start_matches("r/").trim_matches('/');
        if !name.is_empty() && !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

pub async fn index(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> Result<Html<String>, WebError> {
    let email = current_email(&ctx, &headers);
    let status = quota::check(&ctx.db, email.as_deref(), &ctx.config).await?;
    let recent = ctx
        .db
        .recent_results(&owner_key(email.as_deref()), 20)
        .await?;
    Ok(pages::index_page(&status, email.as_deref(), &recent))
}

fn default_posts_per_subreddit() -> usize {
    5
}

fn default_comments_per_post() -> usize {
    15
}

#[derive(Debug, Deserialize)]
pub struct ScrapeForm {
    pub subreddits: String,
    #[serde(default = "default_posts_per_subreddit")]
    pub posts_per_subreddit: usize,
    #[serde(default = "default_comments_per_post")]
    pub comments_per_post: usize,
}

pub async fn scrape(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Form(form): Form<ScrapeForm>,
) -> Result<Html<String>, WebError> {
    let email = current_email(&ctx, &headers);
    let status = quota::check(&ctx.db, email.as_deref(), &ctx.config).await?;
    if !status.allows_scrape() {
        return Err(QuotaError::Exceeded {
            used: status.used,
            limit: status.limit,
        }
        .into());
    }

    let subreddits = parse_subreddits(&form.subreddits);
    if subreddits.is_empty() {
        return Err(CoreError::InvalidInput {
            message: "no subreddits given".to_string(),
        }
        .into());
    }
    let posts_per = form.posts_per_subreddit.clamp(1, 15);
    let comments_per = form.comments_per_post.min(50);

    let owner = owner_key(email.as_deref());
    info!(
        "Scrape request from {} for {} subreddit(s)",
        owner,
        subreddits.len()
    );

    let orchestrator = Orchestrator::new(
        ctx.fetcher.clone(),
        ctx.model.clone(),
        Arc::new(DbLedger::new(ctx.db.clone())),
        Arc::new(DbSink::new(ctx.db.clone(), owner)),
        Duration::from_millis(ctx.config.stage_interval_ms),
        ctx.config.context_char_budget,
    );
    let run = orchestrator.run(&subreddits, posts_per, comments_per).await?;

    quota::record_scrape(&ctx.db, email.as_deref()).await?;
    let status = quota::check(&ctx.db, email.as_deref(), &ctx.config).await?;

    Ok(pages::results_page(&run, &status))
}

#[derive(Debug, Deserialize)]
pub struct EmailForm {
    pub email: String,
}

fn normalize_email(raw: &str) -> Result<String, CoreError> {
    let email = raw.trim().to_lowercase();
    if email.len() < 3 || !email.contains('@') {
        return Err(CoreError::InvalidInput {
            message: "that does not look like an email address".to_string(),
        });
    }
    Ok(email)
}

pub async fn verify_form() -> Html<String> {
    pages::verify_page(None)
}

pub async fn request_verification(
    State(ctx): State<Arc<AppContext>>,
    Form(form): Form<EmailForm>,
) -> Result<Html<String>, WebError> {
    let email = normalize_email(&form.email)?;
    let token = ctx.db.create_verification(&email).await?;
    let verification_url = format!(
        "{}/verify/confirm?token={}",
        ctx.config.app_base_url.trim_end_matches('/'),
        token
    );

    match ctx
        .notifier
        .send_verification(&email, &verification_url)
        .await?
    {
        crate::notifier::Delivery::Sent => Ok(pages::verification_sent_page(&email)),
        crate::notifier::Delivery::ManualLink(link) => Ok(pages::manual_link_page(&link)),
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub token: String,
}

pub async fn confirm_verification(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Response, WebError> {
    let email = ctx.db.consume_token(&query.token).await?;
    ctx.db.touch_last_login(&email).await?;

    let cookie = session::session_cookie(&ctx.config.session_secret, &email);
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        pages::verified_page(&email),
    )
        .into_response())
}

pub async fn signin_form() -> Html<String> {
    pages::signin_page(None)
}

pub async fn signin(
    State(ctx): State<Arc<AppContext>>,
    Form(form): Form<EmailForm>,
) -> Result<Response, WebError> {
    let email = normalize_email(&form.email)?;

    if !ctx.db.is_verified(&email).await? {
        return Ok((
            StatusCode::UNAUTHORIZED,
            pages::signin_page(Some(
                "This email has not been verified yet. Request a verification link first.",
            )),
        )
            .into_response());
    }

    ctx.db.touch_last_login(&email).await?;
    let cookie = session::session_cookie(&ctx.config.session_secret, &email);
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        pages::signed_in_page(&email),
    )
        .into_response())
}

pub async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([(header::SET_COOKIE, session::clear_cookie())]),
        Redirect::to("/"),
    )
}

#[derive(Debug, Deserialize)]
pub struct UpgradeInterestForm {
    #[serde(default)]
    pub path: Option<String>,
}

pub async fn upgrade_interest(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Form(form): Form<UpgradeInterestForm>,
) -> Result<Html<String>, WebError> {
    let email = owner_key(current_email(&ctx, &headers).as_deref());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());

    ctx.db
        .record_upgrade_interest(&email, form.path.as_deref().unwrap_or("/"), user_agent)
        .await?;
    Ok(pages::upgrade_thanks_page())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_and_newline_separated_subreddits() {
        let names = parse_subreddits("consulting, smallbusiness\nr/startups\n\n consulting ");
        assert_eq!(names, vec!["consulting", "smallbusiness", "startups"]);
    }

    #[test]
    fn empty_input_parses_to_nothing() {
        assert!(parse_subreddits("  ,\n ").is_empty());
    }

    #[test]
    fn normalize_email_lowercases_and_validates() {
        assert_eq!(normalize_email(" A@B.com ").unwrap(), "a@b.com");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("").is_err());
    }
}
