//! Parking handlers
//!
//! HTTP handlers for the session lifecycle endpoints: entry, obligation
//! check, settlement, exit, and per-vehicle payment history.

use crate::dto::parking::{
    EntryRequest, EntryResponse, ExitResponse, ObligationResponse, PaymentHistoryResponse,
    SettlementResponse,
};
use crate::dto::ApiResponse;
use crate::PgParkingService;
use actix_web::{web, HttpResponse};
use lotkeeper_core::AppError;
use tracing::{debug, instrument, warn};
use validator::Validate;

use super::sessions;

/// Register a vehicle entry
///
/// POST /api/v1/parking/entries
#[instrument(skip(service, req))]
pub async fn create_entry(
    service: web::Data<PgParkingService>,
    req: web::Json<EntryRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Entry validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(license_plate = %req.license_plate, "Registering vehicle entry");

    let receipt = service
        .create_entry(&req.license_plate, req.image_path.as_deref())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        EntryResponse::from(receipt),
        "Vehicle entry recorded",
    )))
}

/// Check the current payment obligation for a vehicle
///
/// GET /api/v1/parking/obligation/{license_plate}
#[instrument(skip(service))]
pub async fn check_obligation(
    service: web::Data<PgParkingService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let license_plate = path.into_inner();
    debug!(license_plate = %license_plate, "Checking payment obligation");

    let status = service.check_obligation(&license_plate).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(ObligationResponse::from(status))))
}

/// Settle the pending payment for a vehicle
///
/// POST /api/v1/parking/payments/{license_plate}
#[instrument(skip(service))]
pub async fn settle_payment(
    service: web::Data<PgParkingService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let license_plate = path.into_inner();
    debug!(license_plate = %license_plate, "Settling pending payment");

    let receipt = service.settle_pending(&license_plate).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        SettlementResponse::from(receipt),
        "Payment settled",
    )))
}

/// Record a vehicle exit
///
/// POST /api/v1/parking/exits/{license_plate}
#[instrument(skip(service))]
pub async fn record_exit(
    service: web::Data<PgParkingService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let license_plate = path.into_inner();
    debug!(license_plate = %license_plate, "Recording vehicle exit");

    let receipt = service.record_exit(&license_plate).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        ExitResponse::from(receipt),
        "Vehicle exit recorded",
    )))
}

/// Full payment history for a vehicle
///
/// GET /api/v1/parking/history/{license_plate}
#[instrument(skip(service))]
pub async fn payment_history(
    service: web::Data<PgParkingService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let license_plate = path.into_inner();
    debug!(license_plate = %license_plate, "Loading payment history");

    let history = service.payment_history(&license_plate).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(PaymentHistoryResponse::from(history))))
}

/// Configure parking routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/parking")
            .route("/entries", web::post().to(create_entry))
            .route("/obligation/{license_plate}", web::get().to(check_obligation))
            .route("/payments/{license_plate}", web::post().to(settle_payment))
            .route("/exits/{license_plate}", web::post().to(record_exit))
            .route("/history/{license_plate}", web::get().to(payment_history))
            .route("/sessions/active", web::get().to(sessions::list_active))
            .route("/sessions/completed", web::get().to(sessions::list_completed)),
    );
}
