//! Unified error handling for lotkeeper
//!
//! This module provides a comprehensive error type that covers all possible
//! failure scenarios in the application, with automatic HTTP response mapping.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // ==================== Business Logic Errors ====================
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    #[error("No parking session found for vehicle: {0}")]
    SessionNotFound(String),

    #[error("No pending payment found for vehicle: {0}")]
    PendingPaymentNotFound(String),

    #[error("Discount not found or inactive: {0}")]
    DiscountNotFound(String),

    #[error("Discount not applicable: {0}")]
    DiscountNotApplicable(String),

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Vehicle already has an open session: {0}")]
    SessionAlreadyOpen(String),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_)
            | AppError::InvalidInput(_)
            | AppError::PaymentRequired(_)
            | AppError::DiscountNotApplicable(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::VehicleNotFound(_)
            | AppError::SessionNotFound(_)
            | AppError::PendingPaymentNotFound(_)
            | AppError::DiscountNotFound(_)
            | AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Conflict(_) | AppError::SessionAlreadyOpen(_) => StatusCode::CONFLICT,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::VehicleNotFound(_) => "vehicle_not_found",
            AppError::SessionNotFound(_) => "session_not_found",
            AppError::PendingPaymentNotFound(_) => "pending_payment_not_found",
            AppError::DiscountNotFound(_) => "discount_not_found",
            AppError::DiscountNotApplicable(_) => "discount_not_applicable",
            AppError::PaymentRequired(_) => "payment_required",
            AppError::SessionAlreadyOpen(_) => "session_already_open",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
