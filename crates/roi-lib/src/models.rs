//! Core data models for the ROI service

use serde::{Deserialize, Serialize};

/// Categorical listing attributes, by wire name. One-hot feature columns
/// are named `<attribute>_<category>` by the training pipeline.
pub const CATEGORICAL_ATTRIBUTES: &[&str] = &[
    "propertyType",
    "localityName",
    "suburbName",
    "cityName",
    "companyName",
];

/// A property listing as submitted by callers.
///
/// Every attribute is optional; a missing value falls back to a
/// per-target default or zero during feature alignment. Unknown keys in
/// the incoming JSON are ignored rather than rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingRecord {
    pub size_sq_ft: Option<f64>,
    #[serde(rename = "propertyType")]
    pub property_type: Option<String>,
    pub bedrooms: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(rename = "localityName")]
    pub locality_name: Option<String>,
    #[serde(rename = "suburbName")]
    pub suburb_name: Option<String>,
    #[serde(rename = "cityName")]
    pub city_name: Option<String>,
    #[serde(rename = "companyName")]
    pub company_name: Option<String>,
    pub closest_metro_station_km: Option<f64>,
    #[serde(rename = "AP_dist_km")]
    pub ap_dist_km: Option<f64>,
    #[serde(rename = "Aiims_dist_km")]
    pub aiims_dist_km: Option<f64>,
    #[serde(rename = "NDRLW_dist_km")]
    pub ndrlw_dist_km: Option<f64>,
}

impl ListingRecord {
    /// Look up a numeric attribute by its wire name.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        match name {
            "size_sq_ft" => self.size_sq_ft,
            "bedrooms" => self.bedrooms,
            "latitude" => self.latitude,
            "longitude" => self.longitude,
            "closest_metro_station_km" => self.closest_metro_station_km,
            "AP_dist_km" => self.ap_dist_km,
            "Aiims_dist_km" => self.aiims_dist_km,
            "NDRLW_dist_km" => self.ndrlw_dist_km,
            _ => None,
        }
    }

    /// Look up a categorical attribute by its wire name.
    pub fn categorical(&self, name: &str) -> Option<&str> {
        match name {
            "propertyType" => self.property_type.as_deref(),
            "localityName" => self.locality_name.as_deref(),
            "suburbName" => self.suburb_name.as_deref(),
            "cityName" => self.city_name.as_deref(),
            "companyName" => self.company_name.as_deref(),
            _ => None,
        }
    }
}

/// Prediction target selecting a model and its fallback formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Monthly rent
    Rent,
    /// Sale price
    Price,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::Rent, Target::Price];

    /// Stable lowercase name used in logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Target::Rent => "rent",
            Target::Price => "price",
        }
    }
}

/// Combined rent, price and yield figures for one listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_rent: f64,
    pub predicted_price: f64,
    pub annual_rent: f64,
    pub gross_yield: f64,
    pub gross_yield_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_deserializes_wire_names() {
        let json = r#"{
            "size_sq_ft": 950.0,
            "propertyType": "Apartment",
            "bedrooms": 3,
            "latitude": 28.61,
            "longitude": 77.2,
            "localityName": "Saket",
            "suburbName": "South Delhi",
            "cityName": "New Delhi",
            "companyName": "Acme Homes",
            "closest_metro_station_km": 1.2,
            "AP_dist_km": 14.0,
            "Aiims_dist_km": 6.5,
            "NDRLW_dist_km": 9.1
        }"#;

        let record: ListingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.size_sq_ft, Some(950.0));
        assert_eq!(record.property_type.as_deref(), Some("Apartment"));
        assert_eq!(record.bedrooms, Some(3.0));
        assert_eq!(record.ap_dist_km, Some(14.0));
        assert_eq!(record.ndrlw_dist_km, Some(9.1));
    }

    #[test]
    fn test_listing_tolerates_missing_and_unknown_keys() {
        let json = r#"{ "bedrooms": 2, "pool": true, "agentNotes": "corner unit" }"#;
        let record: ListingRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.bedrooms, Some(2.0));
        assert_eq!(record.size_sq_ft, None);
        assert_eq!(record.city_name, None);
    }

    #[test]
    fn test_numeric_lookup_matches_fields() {
        let record = ListingRecord {
            size_sq_ft: Some(1200.0),
            closest_metro_station_km: Some(0.4),
            ..Default::default()
        };

        assert_eq!(record.numeric("size_sq_ft"), Some(1200.0));
        assert_eq!(record.numeric("closest_metro_station_km"), Some(0.4));
        assert_eq!(record.numeric("latitude"), None);
        assert_eq!(record.numeric("no_such_attribute"), None);
    }

    #[test]
    fn test_categorical_lookup_matches_fields() {
        let record = ListingRecord {
            city_name: Some("Mumbai".to_string()),
            ..Default::default()
        };

        assert_eq!(record.categorical("cityName"), Some("Mumbai"));
        assert_eq!(record.categorical("propertyType"), None);
        assert_eq!(record.categorical("size_sq_ft"), None);
    }

    #[test]
    fn test_prediction_result_serializes_all_fields() {
        let result = PredictionResult {
            predicted_rent: 27000.0,
            predicted_price: 15_600_000.0,
            annual_rent: 324_000.0,
            gross_yield: 0.0207,
            gross_yield_percent: 2.07,
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["predicted_rent"], 27000.0);
        assert_eq!(value["predicted_price"], 15_600_000.0);
        assert_eq!(value["annual_rent"], 324_000.0);
        assert!(value["gross_yield"].is_f64());
        assert!(value["gross_yield_percent"].is_f64());
    }

    #[test]
    fn test_target_names() {
        assert_eq!(Target::Rent.name(), "rent");
        assert_eq!(Target::Price.name(), "price");
        assert_eq!(Target::ALL.len(), 2);
    }
}
