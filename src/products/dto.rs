use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, FieldError},
    products::repo::{ProductStatus, ProductWithCategory, Unit},
};

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub low_stock: bool,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub items: Vec<ProductWithCategory>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    pub category_id: Uuid,
    pub price: f64,
    pub cost: f64,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default = "default_min_stock")]
    pub min_stock: i32,
    #[serde(default)]
    pub max_stock: Option<i32>,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
}

fn default_min_stock() -> i32 {
    5
}

/// Update body. Stock quantity is absent on purpose: it only moves through
/// the movements endpoint so every change lands in the ledger.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    pub category_id: Uuid,
    pub price: f64,
    pub cost: f64,
    #[serde(default = "default_min_stock")]
    pub min_stock: i32,
    #[serde(default)]
    pub max_stock: Option<i32>,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
}

fn common_checks(
    errors: &mut Vec<FieldError>,
    name: &str,
    description: Option<&str>,
    price: f64,
    cost: f64,
    min_stock: i32,
    max_stock: Option<i32>,
) {
    let name = name.trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", "name is required"));
    } else if name.len() > 100 {
        errors.push(FieldError::new("name", "name must be at most 100 characters"));
    }
    if let Some(description) = description {
        if description.len() > 500 {
            errors.push(FieldError::new(
                "description",
                "description must be at most 500 characters",
            ));
        }
    }
    if !price.is_finite() || price < 0.0 {
        errors.push(FieldError::new("price", "price must be a non-negative number"));
    }
    if !cost.is_finite() || cost < 0.0 {
        errors.push(FieldError::new("cost", "cost must be a non-negative number"));
    }
    if min_stock < 0 {
        errors.push(FieldError::new("min_stock", "min_stock cannot be negative"));
    }
    if let Some(max_stock) = max_stock {
        if max_stock < 0 {
            errors.push(FieldError::new("max_stock", "max_stock cannot be negative"));
        }
    }
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        common_checks(
            &mut errors,
            &self.name,
            self.description.as_deref(),
            self.price,
            self.cost,
            self.min_stock,
            self.max_stock,
        );
        if self.quantity < 0 {
            errors.push(FieldError::new("quantity", "quantity cannot be negative"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        common_checks(
            &mut errors,
            &self.name,
            self.description.as_deref(),
            self.price,
            self.cost,
            self.min_stock,
            self.max_stock,
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateProductRequest {
        CreateProductRequest {
            name: "Taladro".into(),
            description: None,
            sku: None,
            category_id: Uuid::new_v4(),
            price: 1299.0,
            cost: 850.0,
            quantity: 5,
            min_stock: 5,
            max_stock: None,
            unit: Unit::Piezas,
            barcode: None,
            supplier: None,
        }
    }

    #[test]
    fn accepts_a_well_formed_product() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn collects_every_failing_field() {
        let mut req = create_request();
        req.name = "".into();
        req.price = -1.0;
        req.cost = f64::NAN;
        req.quantity = -3;
        let err = req.validate().unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["name", "price", "cost", "quantity"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn zero_prices_and_quantities_are_fine() {
        let mut req = create_request();
        req.price = 0.0;
        req.cost = 0.0;
        req.quantity = 0;
        assert!(req.validate().is_ok());
    }
}
