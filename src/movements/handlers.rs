use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    authz::{self, Action},
    error::ApiError,
    movements::{
        dto::{Pagination, RecordMovementRequest},
        repo::{apply_movement, Movement, MovementType, NewMovement},
    },
    products::repo::ProductStatus,
    state::AppState,
};

pub fn movement_routes() -> Router<AppState> {
    Router::new().route(
        "/products/:id/movements",
        get(list_product_movements).post(record_movement),
    )
}

/// Applies the stock change and appends the ledger row in one transaction.
/// The product row is locked so previous/new quantities are exact even under
/// concurrent requests.
async fn record(
    db: &PgPool,
    product_id: Uuid,
    payload: &RecordMovementRequest,
    user_id: Uuid,
) -> Result<Movement, ApiError> {
    let mut tx: Transaction<'_, Postgres> = db.begin().await?;

    let row: Option<(i32, ProductStatus)> =
        sqlx::query_as("SELECT quantity, status FROM products WHERE id = $1 FOR UPDATE")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;
    let (current, status) = row.ok_or(ApiError::NotFound("product"))?;
    if status != ProductStatus::Active {
        return Err(ApiError::invalid("product", "product is not active"));
    }

    let next = apply_movement(current, payload.movement_type, payload.reason, payload.quantity)?;

    // The ledger stores the delta magnitude; for ajuste the request carries
    // the absolute target instead.
    let delta = match payload.movement_type {
        MovementType::Ajuste => {
            let delta = (next - current).abs();
            if delta == 0 {
                return Err(ApiError::invalid(
                    "quantity",
                    "adjustment must change the quantity",
                ));
            }
            delta
        }
        _ => payload.quantity,
    };

    sqlx::query(
        "UPDATE products SET quantity = $2, updated_by = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(product_id)
    .bind(next)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    let movement = Movement::insert(
        &mut tx,
        &NewMovement {
            product_id,
            movement_type: payload.movement_type,
            quantity: delta,
            previous_quantity: current,
            new_quantity: next,
            reason: payload.reason,
            reference: payload.reference.clone(),
            notes: payload.notes.clone(),
            user_id,
            cost: payload.cost,
        },
    )
    .await?;

    tx.commit().await?;
    Ok(movement)
}

#[instrument(skip(state, current, payload))]
pub async fn record_movement(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordMovementRequest>,
) -> Result<(StatusCode, Json<Movement>), ApiError> {
    authz::require(current.role, Action::RecordMovement)?;

    if let Some(cost) = payload.cost {
        if cost < 0.0 {
            return Err(ApiError::invalid("cost", "cost cannot be negative"));
        }
    }
    if let Some(notes) = &payload.notes {
        if notes.len() > 300 {
            return Err(ApiError::invalid("notes", "notes must be at most 300 characters"));
        }
    }

    let movement = record(&state.db, id, &payload, current.id).await?;

    info!(
        product_id = %id,
        movement_id = %movement.id,
        previous = movement.previous_quantity,
        new = movement.new_quantity,
        "movement recorded"
    );
    Ok((StatusCode::CREATED, Json(movement)))
}

#[instrument(skip(state, current))]
pub async fn list_product_movements(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Movement>>, ApiError> {
    authz::require(current.role, Action::ViewProductMovements)?;

    let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(ApiError::NotFound("product"));
    }

    let movements = Movement::list_for_product(&state.db, id, p.limit, p.offset).await?;
    Ok(Json(movements))
}
