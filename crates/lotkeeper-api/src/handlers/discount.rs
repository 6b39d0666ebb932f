//! Discount handlers
//!
//! HTTP handlers for listing applicable discounts and applying one to a
//! vehicle's pending payment.

use crate::dto::discount::{
    ApplyDiscountRequest, DiscountApplicationResponse, DiscountListResponse,
};
use crate::dto::ApiResponse;
use crate::PgDiscountService;
use actix_web::{web, HttpResponse};
use lotkeeper_core::AppError;
use tracing::{debug, instrument, warn};
use validator::Validate;

/// List the discounts a vehicle currently qualifies for
///
/// GET /api/v1/discounts/applicable/{license_plate}
#[instrument(skip(service))]
pub async fn list_applicable(
    service: web::Data<PgDiscountService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let license_plate = path.into_inner();
    debug!(license_plate = %license_plate, "Listing applicable discounts");

    let listing = service.list_applicable(&license_plate).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(DiscountListResponse::from(listing))))
}

/// Apply a discount to the vehicle's pending payment
///
/// POST /api/v1/discounts/apply
#[instrument(skip(service, req))]
pub async fn apply_discount(
    service: web::Data<PgDiscountService>,
    req: web::Json<ApplyDiscountRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Discount application validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(
        license_plate = %req.license_plate,
        discount_id = req.discount_id,
        "Applying discount"
    );

    let application = service.apply(&req.license_plate, req.discount_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        DiscountApplicationResponse::from(application),
        "Discount applied",
    )))
}

/// Configure discount routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/discounts")
            .route("/applicable/{license_plate}", web::get().to(list_applicable))
            .route("/apply", web::post().to(apply_discount)),
    );
}
