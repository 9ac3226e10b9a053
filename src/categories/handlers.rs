use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    authz::{self, Action},
    categories::{
        dto::CategoryRequest,
        repo::{Category, CategoryWithCount},
    },
    error::ApiError,
    state::AppState,
    users::dto::MessageResponse,
};

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

#[instrument(skip(state, current))]
pub async fn list_categories(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<CategoryWithCount>>, ApiError> {
    authz::require(current.role, Action::ListCategories)?;
    let categories = Category::list_active(&state.db).await?;
    Ok(Json(categories))
}

#[instrument(skip(state, current))]
pub async fn get_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, ApiError> {
    authz::require(current.role, Action::ViewCategory)?;
    let category = Category::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("category"))?;
    Ok(Json(category))
}

#[instrument(skip(state, current, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    authz::require(current.role, Action::CreateCategory)?;
    payload.validate()?;

    let name = payload.name.trim();
    if Category::name_taken(&state.db, name, None).await? {
        return Err(ApiError::Duplicate("category name"));
    }
    if let Some(parent_id) = payload.parent_id {
        Category::find_by_id(&state.db, parent_id)
            .await?
            .ok_or_else(|| ApiError::invalid("parent_id", "parent category does not exist"))?;
    }

    let category = Category::create(
        &state.db,
        name,
        payload.description.as_deref(),
        &payload.color,
        &payload.icon,
        payload.parent_id,
        current.id,
    )
    .await?;

    info!(category_id = %category.id, by = %current.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(state, current, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    authz::require(current.role, Action::UpdateCategory)?;
    payload.validate()?;

    Category::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("category"))?;

    let name = payload.name.trim();
    if Category::name_taken(&state.db, name, Some(id)).await? {
        return Err(ApiError::Duplicate("category name"));
    }
    if let Some(parent_id) = payload.parent_id {
        if parent_id == id {
            return Err(ApiError::invalid("parent_id", "category cannot be its own parent"));
        }
        Category::find_by_id(&state.db, parent_id)
            .await?
            .ok_or_else(|| ApiError::invalid("parent_id", "parent category does not exist"))?;
    }

    let category = Category::update(
        &state.db,
        id,
        name,
        payload.description.as_deref(),
        &payload.color,
        &payload.icon,
        payload.parent_id,
    )
    .await?;

    info!(category_id = %id, by = %current.id, "category updated");
    Ok(Json(category))
}

#[instrument(skip(state, current))]
pub async fn delete_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    authz::require(current.role, Action::DeactivateCategory)?;

    Category::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("category"))?;

    let in_use = Category::active_product_count(&state.db, id).await?;
    if in_use > 0 {
        return Err(ApiError::invalid(
            "category",
            "category still has active products",
        ));
    }

    Category::deactivate(&state.db, id).await?;
    info!(category_id = %id, by = %current.id, "category deactivated");
    Ok(Json(MessageResponse {
        message: "category deactivated",
    }))
}
