use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    authz::{self, Action},
    categories::repo::Category,
    error::ApiError,
    products::{
        dto::{CreateProductRequest, ProductListQuery, ProductPage, UpdateProductRequest},
        repo::{generate_sku, NewProduct, Product, ProductFilter, ProductWithCategory},
    },
    state::AppState,
    users::dto::MessageResponse,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// Malformed ids behave like missing products, they are not a client syntax
/// error worth a different status.
fn parse_product_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("product"))
}

#[instrument(skip(state, current))]
pub async fn list_products(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductPage>, ApiError> {
    authz::require(current.role, Action::ListProducts)?;

    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let filter = ProductFilter {
        status: query.status.unwrap_or_default(),
        search: query.search.filter(|s| !s.trim().is_empty()),
        category_id: query.category,
        low_stock: query.low_stock,
    };

    let total = Product::count(&state.db, &filter).await?;
    let items = Product::list(&state.db, &filter, limit, (page - 1) * limit).await?;

    Ok(Json(ProductPage {
        items,
        total,
        page,
        pages: (total + limit - 1) / limit,
    }))
}

#[instrument(skip(state, current))]
pub async fn get_product(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ProductWithCategory>, ApiError> {
    authz::require(current.role, Action::ViewProduct)?;
    let id = parse_product_id(&id)?;
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    Ok(Json(product))
}

#[instrument(skip(state, current, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductWithCategory>), ApiError> {
    authz::require(current.role, Action::CreateProduct)?;
    payload.validate()?;

    Category::find_by_id(&state.db, payload.category_id)
        .await?
        .ok_or_else(|| ApiError::invalid("category_id", "category does not exist"))?;

    let sku = match &payload.sku {
        Some(sku) if !sku.trim().is_empty() => sku.trim().to_uppercase(),
        _ => generate_sku(&payload.name, OffsetDateTime::now_utc()),
    };
    if Product::sku_taken(&state.db, &sku, None).await? {
        return Err(ApiError::Duplicate("sku"));
    }

    let product = Product::create(
        &state.db,
        &NewProduct {
            name: payload.name.trim().to_string(),
            description: payload.description,
            sku,
            category_id: payload.category_id,
            price: payload.price,
            cost: payload.cost,
            quantity: payload.quantity,
            min_stock: payload.min_stock,
            max_stock: payload.max_stock,
            unit: payload.unit,
            barcode: payload.barcode,
            supplier: payload.supplier,
            created_by: current.id,
        },
    )
    .await?;

    info!(product_id = %product.id, sku = %product.sku, by = %current.id, "product created");

    let detail = Product::find_by_id(&state.db, product.id)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[instrument(skip(state, current, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductWithCategory>, ApiError> {
    authz::require(current.role, Action::UpdateProduct)?;
    let id = parse_product_id(&id)?;
    payload.validate()?;

    let existing = Product::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("product"))?;

    Category::find_by_id(&state.db, payload.category_id)
        .await?
        .ok_or_else(|| ApiError::invalid("category_id", "category does not exist"))?;

    let sku = match &payload.sku {
        Some(sku) if !sku.trim().is_empty() => sku.trim().to_uppercase(),
        _ => existing.sku.clone(),
    };
    if sku != existing.sku && Product::sku_taken(&state.db, &sku, Some(id)).await? {
        return Err(ApiError::Duplicate("sku"));
    }

    Product::update(
        &state.db,
        id,
        payload.name.trim(),
        payload.description.as_deref(),
        &sku,
        payload.category_id,
        payload.price,
        payload.cost,
        payload.min_stock,
        payload.max_stock,
        payload.unit,
        payload.barcode.as_deref(),
        payload.supplier.as_deref(),
        payload.status.unwrap_or(existing.status),
        current.id,
    )
    .await?;

    info!(product_id = %id, by = %current.id, "product updated");

    let detail = Product::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    Ok(Json(detail))
}

#[instrument(skip(state, current))]
pub async fn delete_product(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    authz::require(current.role, Action::DeactivateProduct)?;
    let id = parse_product_id(&id)?;

    Product::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("product"))?;

    Product::deactivate(&state.db, id, current.id).await?;
    info!(product_id = %id, by = %current.id, "product deactivated");
    Ok(Json(MessageResponse {
        message: "product deactivated",
    }))
}
