use crate::error::{ApiError, QueryError};
use crate::page::PageRenderer;
use crate::presenter::{export::CSV_CONTENT_TYPE, write_csv};
use crate::provider::MarketDataProvider;
use crate::view::{self, Dashboard, FormValues, QueryParams, ViewState};
use axum::{
    extract::{FromRef, Query, State},
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, instrument};

pub type SharedProvider = Arc<dyn MarketDataProvider>;
pub type SharedPages = Arc<PageRenderer>;

// Per-request defaults for the input form
#[derive(Clone, Copy, Debug)]
pub struct FormDefaults {
    pub lookback_days: i64,
    /// Pins "today"; the local clock is read when unset.
    pub today: Option<NaiveDate>,
}

impl FormDefaults {
    pub fn new(lookback_days: i64) -> Self {
        Self { lookback_days, today: None }
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub provider: SharedProvider,
    pub pages: SharedPages,
    pub defaults: FormDefaults,
}

impl FromRef<AppState> for SharedProvider {
    fn from_ref(app_state: &AppState) -> SharedProvider {
        app_state.provider.clone()
    }
}

impl FromRef<AppState> for SharedPages {
    fn from_ref(app_state: &AppState) -> SharedPages {
        app_state.pages.clone()
    }
}

impl FromRef<AppState> for FormDefaults {
    fn from_ref(app_state: &AppState) -> FormDefaults {
        app_state.defaults
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/download", get(download_handler))
        .route("/api/history", get(history_handler).layer(CorsLayer::permissive()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[instrument(skip_all, fields(symbol = %params.symbol.as_deref().unwrap_or("")))]
pub async fn index_handler(
    State(provider): State<SharedProvider>,
    State(pages): State<SharedPages>,
    State(defaults): State<FormDefaults>,
    Query(params): Query<QueryParams>,
) -> Result<Html<String>, ApiError> {
    debug!("Received page request");

    let today = defaults.today();
    let form = params.form_values(today, defaults.lookback_days);
    let state = view::evaluate(&params, provider.as_ref(), today, defaults.lookback_days).await;

    Ok(Html(pages.render(&form, &state)?))
}

#[instrument(skip_all, fields(symbol = %params.symbol.as_deref().unwrap_or("")))]
pub async fn download_handler(
    State(provider): State<SharedProvider>,
    State(defaults): State<FormDefaults>,
    Query(params): Query<QueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    debug!("Received CSV download request");

    let query = params
        .to_query(defaults.today(), defaults.lookback_days)?
        .ok_or(QueryError::EmptySymbol)?;
    let data = view::load(&query, provider.as_ref()).await?;
    let dashboard = Dashboard::from_data(data);
    let body = write_csv(&dashboard.rows)?;

    info!(rows = dashboard.rows.len(), file_name = %dashboard.file_name, "Serving CSV export");
    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", dashboard.file_name)),
        ],
        body,
    ))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub state: &'static str,
    pub form: FormValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<Box<Dashboard>>,
}

#[instrument(skip_all, fields(symbol = %params.symbol.as_deref().unwrap_or("")))]
pub async fn history_handler(
    State(provider): State<SharedProvider>,
    State(defaults): State<FormDefaults>,
    Query(params): Query<QueryParams>,
) -> Json<HistoryResponse> {
    let today = defaults.today();
    let form = params.form_values(today, defaults.lookback_days);
    let state = view::evaluate(&params, provider.as_ref(), today, defaults.lookback_days).await;
    let name = state.name().as_str();

    let response = match state {
        ViewState::Idle => HistoryResponse {
            state: name,
            form,
            message: Some(view::IDLE_MESSAGE.to_string()),
            detail: None,
            dashboard: None,
        },
        ViewState::Failed { message, detail } => HistoryResponse {
            state: name,
            form,
            message: Some(message),
            detail,
            dashboard: None,
        },
        ViewState::Loaded(dashboard) => HistoryResponse {
            state: name,
            form,
            message: None,
            detail: None,
            dashboard: Some(dashboard),
        },
    };
    Json(response)
}
