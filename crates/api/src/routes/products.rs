//! Catalog route handlers.
//!
//! Listing and detail are public. Create, update, and delete require the
//! admin role. Stock is writable here via the full-replace update; customer
//! traffic only ever changes it through order placement and cancellation.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;

use protech_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductDraft};
use crate::state::AppState;

/// List all products, newest first.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// Fetch one product by ID.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;
    Ok(Json(product))
}

/// Create a product.
///
/// # Errors
///
/// Returns 400 if the draft is invalid.
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<Product>)> {
    validate_draft(&draft)?;

    let product = ProductRepository::new(state.pool()).create(&draft).await?;
    tracing::info!(product_id = %product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's catalog fields, including stock.
///
/// # Errors
///
/// Returns 400 if the draft is invalid, 404 if the product does not exist.
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>> {
    validate_draft(&draft)?;

    let product = ProductRepository::new(state.pool()).update(id, &draft).await?;
    Ok(Json(product))
}

/// Delete a product.
///
/// Existing order line items keep their snapshot; their product reference
/// goes dangling by design.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    let deleted = ProductRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("product".to_owned()));
    }

    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Reject drafts the database would refuse anyway, with a friendlier error.
fn validate_draft(draft: &ProductDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product name is required".to_owned()));
    }
    if draft.price < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Price must not be negative".to_owned(),
        ));
    }
    if draft.stock < 0 {
        return Err(AppError::BadRequest(
            "Stock must not be negative".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "iPhone 16 Pro".to_owned(),
            brand: "Apple".to_owned(),
            category: "Phones".to_owned(),
            description: "128GB, titanium".to_owned(),
            price: Decimal::new(99_900, 2),
            stock: 25,
            images: vec![],
        }
    }

    #[test]
    fn test_validate_draft_ok() {
        assert!(validate_draft(&draft()).is_ok());
    }

    #[test]
    fn test_validate_draft_rejects_blank_name() {
        let mut d = draft();
        d.name = "   ".to_owned();
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn test_validate_draft_rejects_negative_price() {
        let mut d = draft();
        d.price = Decimal::new(-1, 2);
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn test_validate_draft_rejects_negative_stock() {
        let mut d = draft();
        d.stock = -1;
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn test_validate_draft_allows_zero_stock() {
        let mut d = draft();
        d.stock = 0;
        assert!(validate_draft(&d).is_ok());
    }
}
