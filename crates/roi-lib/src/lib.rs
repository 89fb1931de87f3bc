//! Core library for the rental ROI service
//!
//! This crate provides:
//! - Listing data models and prediction results
//! - Per-target model artifact registry with fallback behavior
//! - Feature alignment and ONNX inference
//! - Health checks and observability

pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod registry;

pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::RoiMetrics;
pub use predictor::{Estimate, FallbackReason, Predictor};
pub use registry::{ArtifactError, LoadedTarget, ModelRegistry};
