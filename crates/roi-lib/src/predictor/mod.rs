//! Rent and price estimation
//!
//! Turns listing records into rent and price estimates, preferring the
//! per-target ML model and substituting deterministic formulas so a
//! request can never fail outright.

mod features;
mod inference;

pub use features::FeatureSchema;
pub use inference::{fallback_estimate, RoiModel};

#[cfg(test)]
pub(crate) use inference::identity_onnx_bytes;

use crate::models::{ListingRecord, PredictionResult, Target};
use crate::registry::ModelRegistry;
use std::sync::Arc;
use tracing::warn;

/// Months per year used to annualize rent.
const MONTHS_PER_YEAR: f64 = 12.0;

/// Why a prediction fell back to the heuristic formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No model artifacts are loaded for the target.
    ModelUnavailable,
    /// The model ran but errored or produced an unusable output.
    InferenceFailed,
}

impl FallbackReason {
    /// Stable label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::ModelUnavailable => "model_unavailable",
            FallbackReason::InferenceFailed => "inference_failed",
        }
    }
}

/// A single rent or price estimate with its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimate {
    /// Produced by the target's ML model.
    Model { value: f64 },
    /// Produced by the deterministic fallback formula.
    Fallback { value: f64, reason: FallbackReason },
}

impl Estimate {
    /// The estimated amount, regardless of provenance.
    pub fn value(&self) -> f64 {
        match self {
            Estimate::Model { value } => *value,
            Estimate::Fallback { value, .. } => *value,
        }
    }

    /// Source label used in metrics.
    pub fn source(&self) -> &'static str {
        match self {
            Estimate::Model { .. } => "model",
            Estimate::Fallback { .. } => "fallback",
        }
    }
}

/// Combine already-computed rent and price estimates into the full ROI
/// figures. A zero price yields 0.0 rather than a division error.
pub fn compose_roi(predicted_rent: f64, predicted_price: f64) -> PredictionResult {
    let annual_rent = predicted_rent * MONTHS_PER_YEAR;
    let gross_yield = if predicted_price == 0.0 {
        0.0
    } else {
        annual_rent / predicted_price
    };
    let gross_yield_percent = gross_yield * 100.0;

    PredictionResult {
        predicted_rent,
        predicted_price,
        annual_rent,
        gross_yield,
        gross_yield_percent,
    }
}

/// Produces rent and price estimates from listing records.
pub struct Predictor {
    registry: Arc<ModelRegistry>,
}

impl Predictor {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Estimate one target for a record, with provenance.
    ///
    /// Model outputs are sanitized: a non-finite value counts as an
    /// inference failure, a finite negative value is clamped to 0.0.
    /// Fallback values pass through untouched.
    pub fn estimate(&self, record: &ListingRecord, target: Target) -> Estimate {
        let loaded = match self.registry.get(target) {
            Some(loaded) => loaded,
            None => {
                return Estimate::Fallback {
                    value: fallback_estimate(record, target),
                    reason: FallbackReason::ModelUnavailable,
                }
            }
        };

        let features = loaded.schema.align(record, target);
        match loaded.model.run(&features) {
            Ok(value) if value.is_finite() => Estimate::Model {
                value: value.max(0.0),
            },
            Ok(value) => {
                let reason = FallbackReason::InferenceFailed;
                warn!(
                    target = target.name(),
                    reason = reason.as_str(),
                    value,
                    "Model produced a non-finite estimate, using fallback formula"
                );
                Estimate::Fallback {
                    value: fallback_estimate(record, target),
                    reason,
                }
            }
            Err(e) => {
                let reason = FallbackReason::InferenceFailed;
                warn!(
                    target = target.name(),
                    reason = reason.as_str(),
                    error = %e,
                    "Inference failed, using fallback formula"
                );
                Estimate::Fallback {
                    value: fallback_estimate(record, target),
                    reason,
                }
            }
        }
    }

    /// Estimated monthly rent for a listing.
    pub fn predict_rent(&self, record: &ListingRecord) -> f64 {
        self.estimate(record, Target::Rent).value()
    }

    /// Estimated sale price for a listing.
    pub fn predict_price(&self, record: &ListingRecord) -> f64 {
        self.estimate(record, Target::Price).value()
    }

    /// Full rent, price and gross-yield figures for a listing.
    pub fn calculate_roi(&self, record: &ListingRecord) -> PredictionResult {
        let predicted_rent = self.predict_rent(record);
        let predicted_price = self.predict_price(record);
        compose_roi(predicted_rent, predicted_price)
    }
}
