use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Html,
    Json,
};
use std::sync::Arc;

use crate::{
    build_info,
    core::email::draft_email,
    error::{AppError, Result},
    models::email::{EmailDraft, EmailDraftRequest},
    models::product::{GenerateRequest, GeneratedProduct, ProductHit, ProductKind, SearchRequest},
    AppState,
};

use super::responses::{ApiResponse, Health};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// The demo page with the email and product forms
pub(crate) async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Health>> {
    // Busy while a product action holds the catalog
    let indexed_images = state.catalog.try_lock().map(|c| c.len()).ok();

    Json(ApiResponse::success(Health {
        status: "ok",
        version: build_info::PKG_VERSION,
        built_at: build_info::BUILT_TIME_UTC,
        provider: state.provider.name().to_string(),
        indexed_images,
    }))
}

/// Product options for the generator form
pub(crate) async fn list_products() -> Json<ApiResponse<Vec<&'static str>>> {
    Json(ApiResponse::success(
        ProductKind::ALL.iter().map(|p| p.label()).collect(),
    ))
}

/// Draft a reply to a customer's negative feedback
pub(crate) async fn generate_email(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<EmailDraftRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<EmailDraft>>> {
    let Json(request) = payload?;
    let draft = draft_email(state.provider.as_ref(), &request).await?;
    Ok(Json(ApiResponse::success(draft)))
}

/// Generate, save and index images for a product
pub(crate) async fn generate_products(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Vec<GeneratedProduct>>>> {
    let Json(request) = payload?;
    let mut catalog = state.catalog.lock().await;
    let generated = catalog
        .generate(
            state.provider.as_ref(),
            request.product,
            request.description.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::success(generated)))
}

/// Rank indexed images against a text query
pub(crate) async fn search_products(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Vec<ProductHit>>>> {
    let Json(request) = payload?;
    let max = state.config.max_results;
    if !(1..=max).contains(&request.top_k) {
        return Err(AppError::InvalidInput(format!(
            "Number of results must be between 1 and {max}"
        )));
    }

    let catalog = state.catalog.lock().await;
    let hits = catalog
        .search(state.provider.as_ref(), &request.query, request.top_k)
        .await?;

    Ok(Json(ApiResponse::success(hits)))
}

/// Fallback for unknown routes
pub(crate) async fn not_found() -> (StatusCode, ApiResponse<()>) {
    (StatusCode::NOT_FOUND, ApiResponse::error("Not found"))
}
