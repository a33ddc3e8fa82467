use anyhow::Result;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::Instrument;

use crate::config::{Config, CALLBACK_PATH};
use crate::pocket::{callback_with_token, ItemState, PocketClient};
use crate::report::ReportGenerator;
use crate::stats::ReadingReport;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pocket: Arc<PocketClient>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let pocket = PocketClient::new(
            config.consumer_key.clone(),
            config.api_base.clone(),
            config.request_timeout,
        )?;
        Ok(Self {
            config: Arc::new(config),
            pocket: Arc::new(pocket),
        })
    }
}

/// Failures surfaced to the browser as an error page.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("no request token in the callback")]
    MissingToken,

    #[error("authorization with Pocket failed: {0:#}")]
    Auth(anyhow::Error),

    #[error("fetching saved items failed: {0:#}")]
    Fetch(anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MissingToken => StatusCode::BAD_REQUEST,
            AppError::Auth(_) | AppError::Fetch(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            AppError::MissingToken => "Authorization incomplete",
            AppError::Auth(_) => "Could not authorize with Pocket",
            AppError::Fetch(_) => "Could not fetch your articles",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        let message = match &self {
            AppError::MissingToken => {
                "Pocket did not hand back a request token. Please authorize again.".to_string()
            }
            other => other.to_string(),
        };
        let html = ReportGenerator::error_page(self.heading(), &message);
        (self.status(), Html(html)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    request_token: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/auth", get(auth_handler))
        .route(CALLBACK_PATH, get(results_handler))
        .layer(middleware::from_fn(request_tracing_middleware))
        .with_state(state)
}

async fn request_tracing_middleware(request: Request<Body>, next: Next) -> Response {
    let span = tracing::info_span!(
        "http.request",
        method = %request.method(),
        route = %request.uri().path(),
    );

    async move {
        let response = next.run(request).await;
        tracing::info!(status = response.status().as_u16(), "handled");
        response
    }
    .instrument(span)
    .await
}

async fn index_handler() -> Html<String> {
    Html(ReportGenerator::landing_page())
}

async fn auth_handler(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let callback = state.config.callback_url();
    let request_token = state
        .pocket
        .get_request_token(&callback)
        .await
        .map_err(AppError::Auth)?;

    let redirect_uri =
        callback_with_token(&callback, &request_token.code).map_err(AppError::Auth)?;
    let target = state.pocket.authorize_url(&request_token.code, &redirect_uri);

    tracing::info!("redirecting to Pocket for authorization");
    Ok(Redirect::to(&target))
}

async fn results_handler(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Html<String>, AppError> {
    let request_token = params
        .request_token
        .filter(|t| !t.trim().is_empty())
        .ok_or(AppError::MissingToken)?;

    let access = state
        .pocket
        .get_access_token(&request_token)
        .await
        .map_err(AppError::Auth)?;

    let articles = state
        .pocket
        .get_articles(&access.access_token, ItemState::All)
        .await
        .map_err(AppError::Fetch)?;

    tracing::info!(
        username = %access.username,
        count = articles.len(),
        "fetched saved items"
    );

    let now = Utc::now();
    let report = ReadingReport::build(&articles, now);
    Ok(Html(ReportGenerator::generate(
        &report,
        &access.username,
        now,
    )))
}
