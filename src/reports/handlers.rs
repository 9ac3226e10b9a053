use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    authz::{self, Action},
    error::ApiError,
    reports::{
        dto::{
            parse_window_date, summarize, DashboardReport, InventoryReport, InventoryReportQuery,
            MovementReportRow, MovementsReportQuery,
        },
        repo,
    },
    state::AppState,
};

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/reports/dashboard", get(dashboard))
        .route("/reports/inventory", get(inventory))
        .route("/reports/movements", get(movements))
}

#[instrument(skip(state, current))]
pub async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<DashboardReport>, ApiError> {
    authz::require(current.role, Action::ViewDashboard)?;

    let (overview, top_products, category_stats) = tokio::try_join!(
        repo::overview(&state.db),
        repo::top_products(&state.db),
        repo::category_stats(&state.db),
    )?;

    Ok(Json(DashboardReport {
        overview,
        top_products,
        category_stats,
    }))
}

#[instrument(skip(state, current))]
pub async fn inventory(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<InventoryReportQuery>,
) -> Result<Json<InventoryReport>, ApiError> {
    authz::require(current.role, Action::ViewInventoryReport)?;

    let products = repo::inventory_rows(
        &state.db,
        query.category,
        query.status.unwrap_or_default(),
        query.low_stock,
    )
    .await?;

    Ok(Json(InventoryReport {
        summary: summarize(&products),
        products,
    }))
}

#[instrument(skip(state, current))]
pub async fn movements(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<MovementsReportQuery>,
) -> Result<Json<Vec<MovementReportRow>>, ApiError> {
    authz::require(current.role, Action::ViewMovementsReport)?;

    let start = query
        .start_date
        .as_deref()
        .map(|raw| parse_window_date("start_date", raw))
        .transpose()?;
    let end = query
        .end_date
        .as_deref()
        .map(|raw| parse_window_date("end_date", raw))
        .transpose()?;

    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 200);

    let rows = repo::movement_rows(
        &state.db,
        start,
        end,
        query.movement_type,
        query.product,
        limit,
        (page - 1) * limit,
    )
    .await?;

    Ok(Json(rows))
}
