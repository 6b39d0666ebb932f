//! Lotkeeper Core Library
//!
//! This crate provides the foundational types for the lotkeeper parking
//! backend. It includes:
//!
//! - Domain models (Vehicle, ParkingSession, Payment, RateTier, etc.)
//! - Pure billing math (duration rounding, tiered fee calculation)
//! - Repository seams for rate/vehicle/discount lookups
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod billing;
pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
