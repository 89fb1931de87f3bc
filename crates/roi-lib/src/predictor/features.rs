//! Feature alignment for model inference
//!
//! Translates a loosely-typed listing record into the exact numeric
//! vector a model expects, following the column order captured at
//! training time.

use crate::models::{ListingRecord, Target, CATEGORICAL_ATTRIBUTES};

/// Record attributes read under a different schema name, per target. The
/// housing model was trained on `area` while the API accepts
/// `size_sq_ft`; the rent model has no such renames.
const FIELD_ALIASES: &[(Target, &str, &str)] = &[(Target::Price, "area", "size_sq_ft")];

/// One column of a model's training-time feature layout.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Column {
    /// Numeric passthrough, matched by attribute name.
    Numeric(String),
    /// One-hot indicator set when `attribute == category`.
    OneHot { attribute: String, category: String },
}

/// Ordered feature columns for one model.
///
/// Column names are classified once at load time; alignment afterwards is
/// a pure per-column lookup.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    columns: Vec<Column>,
}

impl FeatureSchema {
    /// Build a schema from the ordered column names stored alongside the
    /// model artifact.
    pub fn new(column_names: Vec<String>) -> Self {
        let columns = column_names.into_iter().map(classify).collect();
        Self { columns }
    }

    /// Number of features the model expects.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Resolve a record into the model's input vector.
    ///
    /// Missing numerics become 0.0 after alias resolution, one-hot columns
    /// are set iff the record's categorical value equals the column's
    /// category, and record attributes without a schema column are
    /// dropped. An unseen category therefore matches no column and leaves
    /// its attribute's indicators all zero.
    pub fn align(&self, record: &ListingRecord, target: Target) -> Vec<f32> {
        self.columns
            .iter()
            .map(|column| match column {
                Column::Numeric(name) => numeric_value(record, target, name) as f32,
                Column::OneHot {
                    attribute,
                    category,
                } => match record.categorical(attribute) {
                    Some(value) if value == category => 1.0,
                    _ => 0.0,
                },
            })
            .collect()
    }
}

/// Classify a training-time column name as numeric or one-hot.
///
/// One-hot columns are named `<attribute>_<category>` for the known
/// categorical attributes; everything else passes through numerically.
fn classify(name: String) -> Column {
    for attribute in CATEGORICAL_ATTRIBUTES {
        if let Some(category) = name
            .strip_prefix(attribute)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return Column::OneHot {
                attribute: attribute.to_string(),
                category: category.to_string(),
            };
        }
    }
    Column::Numeric(name)
}

fn numeric_value(record: &ListingRecord, target: Target, name: &str) -> f64 {
    if let Some(value) = record.numeric(name) {
        return value;
    }
    for (alias_target, schema_name, record_name) in FIELD_ALIASES {
        if *alias_target == target && *schema_name == name {
            if let Some(value) = record.numeric(record_name) {
                return value;
            }
        }
    }
    0.0
}
