use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum MovementType {
    Entrada,
    Salida,
    Ajuste,
    Transferencia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum MovementReason {
    Compra,
    Venta,
    Devolucion,
    AjusteInventario,
    #[serde(rename = "producto_dañado")]
    #[sqlx(rename = "producto_dañado")]
    ProductoDanado,
    ProductoVencido,
    TransferenciaEntrada,
    TransferenciaSalida,
}

/// One ledger entry. Rows are only ever inserted; there is no update or
/// delete path anywhere in the crate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Movement {
    pub id: Uuid,
    pub product_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub reason: MovementReason,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub user_id: Uuid,
    pub cost: Option<f64>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewMovement {
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub reason: MovementReason,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub user_id: Uuid,
    pub cost: Option<f64>,
}

/// Computes the quantity a product ends at after a movement is applied.
///
/// `entrada` adds, `salida` subtracts, `ajuste` sets the absolute count (the
/// request carries the target, the ledger row stores the delta), and
/// `transferencia` follows the direction named by its reason.
pub fn apply_movement(
    current: i32,
    movement_type: MovementType,
    reason: MovementReason,
    quantity: i32,
) -> Result<i32, ApiError> {
    if quantity <= 0 {
        return Err(ApiError::invalid("quantity", "quantity must be greater than 0"));
    }
    let next = match movement_type {
        MovementType::Entrada => current + quantity,
        MovementType::Salida => current - quantity,
        MovementType::Ajuste => quantity,
        MovementType::Transferencia => match reason {
            MovementReason::TransferenciaEntrada => current + quantity,
            MovementReason::TransferenciaSalida => current - quantity,
            _ => {
                return Err(ApiError::invalid(
                    "reason",
                    "transfers require a transfer reason",
                ))
            }
        },
    };
    if next < 0 {
        return Err(ApiError::invalid("quantity", "insufficient stock"));
    }
    Ok(next)
}

impl Movement {
    /// Takes the caller's transaction so the ledger row commits together with
    /// the quantity it records.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        new: &NewMovement,
    ) -> anyhow::Result<Movement> {
        let movement = sqlx::query_as::<_, Movement>(
            r#"
            INSERT INTO movements (product_id, type, quantity, previous_quantity,
                                   new_quantity, reason, reference, notes, user_id, cost)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, product_id, type, quantity, previous_quantity, new_quantity,
                      reason, reference, notes, user_id, cost, created_at
            "#,
        )
        .bind(new.product_id)
        .bind(new.movement_type)
        .bind(new.quantity)
        .bind(new.previous_quantity)
        .bind(new.new_quantity)
        .bind(new.reason)
        .bind(new.reference.as_deref())
        .bind(new.notes.as_deref())
        .bind(new.user_id)
        .bind(new.cost)
        .fetch_one(&mut **tx)
        .await?;
        Ok(movement)
    }

    pub async fn list_for_product(
        db: &PgPool,
        product_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Movement>> {
        let rows = sqlx::query_as::<_, Movement>(
            r#"
            SELECT id, product_id, type, quantity, previous_quantity, new_quantity,
                   reason, reference, notes, user_id, cost, created_at
            FROM movements
            WHERE product_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entrada_adds_to_current_stock() {
        assert_eq!(
            apply_movement(10, MovementType::Entrada, MovementReason::Compra, 5).unwrap(),
            15
        );
    }

    #[test]
    fn salida_subtracts_and_can_reach_zero() {
        assert_eq!(
            apply_movement(5, MovementType::Salida, MovementReason::Venta, 5).unwrap(),
            0
        );
    }

    #[test]
    fn salida_below_zero_is_rejected() {
        let err = apply_movement(3, MovementType::Salida, MovementReason::Venta, 4).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn ajuste_sets_the_absolute_quantity() {
        assert_eq!(
            apply_movement(42, MovementType::Ajuste, MovementReason::AjusteInventario, 7).unwrap(),
            7
        );
    }

    #[test]
    fn transferencia_follows_its_reason() {
        assert_eq!(
            apply_movement(
                10,
                MovementType::Transferencia,
                MovementReason::TransferenciaEntrada,
                3
            )
            .unwrap(),
            13
        );
        assert_eq!(
            apply_movement(
                10,
                MovementType::Transferencia,
                MovementReason::TransferenciaSalida,
                3
            )
            .unwrap(),
            7
        );
    }

    #[test]
    fn transferencia_with_non_transfer_reason_is_rejected() {
        let err = apply_movement(10, MovementType::Transferencia, MovementReason::Venta, 3)
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        for quantity in [0, -4] {
            let err = apply_movement(10, MovementType::Entrada, MovementReason::Compra, quantity)
                .unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)));
        }
    }

    #[test]
    fn reason_wire_names_match_the_ledger_vocabulary() {
        assert_eq!(
            serde_json::to_string(&MovementReason::ProductoDanado).unwrap(),
            "\"producto_dañado\""
        );
        assert_eq!(
            serde_json::to_string(&MovementReason::AjusteInventario).unwrap(),
            "\"ajuste_inventario\""
        );
        assert_eq!(
            serde_json::to_string(&MovementType::Entrada).unwrap(),
            "\"entrada\""
        );
    }
}
