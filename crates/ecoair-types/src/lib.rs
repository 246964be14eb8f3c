//! Platform-agnostic types for the Eco-Air air quality app.
//!
//! This crate provides the shared vocabulary used by the persistence core
//! (`ecoair-store`) on every platform, native or WebAssembly.
//!
//! # Features
//!
//! - AQI health bands with their labels and advice
//! - Pollutant concentrations attached to a reading
//! - Validated coordinates and city names
//! - The city key used for case-insensitive comparisons
//! - Notification preferences
//!
//! # Example
//!
//! ```
//! use ecoair_types::{AqiLevel, Pollutants, city_key};
//!
//! let level = AqiLevel::from_aqi(87).unwrap();
//! assert_eq!(level, AqiLevel::Moderate);
//!
//! let pollutants = Pollutants::new().pm25(12.5).no2(31.0);
//! assert!(!pollutants.is_empty());
//!
//! assert_eq!(city_key("Paris"), city_key("PARIS"));
//! ```

pub mod error;
pub mod types;

pub use error::{ValidationError, ValidationResult};
pub use types::{
    AqiLevel, Coordinates, NotificationSettings, Pollutants, city_key, validate_city_name,
    validate_latitude, validate_longitude,
};

#[cfg(test)]
mod tests {
    use super::*;

    // --- AqiLevel tests ---

    #[test]
    fn test_aqi_level_boundaries() {
        assert_eq!(AqiLevel::from_aqi(0), Some(AqiLevel::Good));
        assert_eq!(AqiLevel::from_aqi(50), Some(AqiLevel::Good));
        assert_eq!(AqiLevel::from_aqi(100), Some(AqiLevel::Moderate));
        assert_eq!(
            AqiLevel::from_aqi(101),
            Some(AqiLevel::UnhealthyForSensitiveGroups)
        );
        assert_eq!(AqiLevel::from_aqi(200), Some(AqiLevel::Unhealthy));
        assert_eq!(AqiLevel::from_aqi(300), Some(AqiLevel::VeryUnhealthy));
        assert_eq!(AqiLevel::from_aqi(301), Some(AqiLevel::Hazardous));
        assert_eq!(AqiLevel::from_aqi(i32::MAX), Some(AqiLevel::Hazardous));
    }

    #[test]
    fn test_aqi_level_negative_has_no_level() {
        assert_eq!(AqiLevel::from_aqi(-5), None);
        assert_eq!(AqiLevel::from_aqi(i32::MIN), None);
    }

    #[test]
    fn test_aqi_level_ranges_are_contiguous() {
        for pair in AqiLevel::ALL.windows(2) {
            let (_, upper) = pair[0].range();
            let (lower, _) = pair[1].range();
            assert_eq!(upper + 1, lower, "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_aqi_level_display_uses_label() {
        assert_eq!(AqiLevel::Good.to_string(), "Bon");
        assert_eq!(AqiLevel::Hazardous.to_string(), "Dangereux");
    }

    #[test]
    fn test_aqi_level_serialization() {
        let json = serde_json::to_string(&AqiLevel::VeryUnhealthy).unwrap();
        assert_eq!(json, "\"VeryUnhealthy\"");
    }

    // --- Pollutants tests ---

    #[test]
    fn test_pollutants_builder() {
        let p = Pollutants::new().pm25(10.0).pm10(20.0).o3(30.0).no2(40.0);
        assert_eq!(p.pm25, Some(10.0));
        assert_eq!(p.pm10, Some(20.0));
        assert_eq!(p.o3, Some(30.0));
        assert_eq!(p.no2, Some(40.0));
        assert!(Pollutants::new().is_empty());
    }

    #[test]
    fn test_pollutants_zero_is_kept() {
        let p = Pollutants::new().o3(0.0);
        assert_eq!(p.o3, Some(0.0));
        assert!(!p.is_empty());
    }

    #[test]
    fn test_pollutants_serialization_skips_missing() {
        let json = serde_json::to_string(&Pollutants::new().pm25(12.0)).unwrap();
        assert_eq!(json, r#"{"pm25":12.0}"#);

        let parsed: Pollutants = serde_json::from_str("{}").unwrap();
        assert!(parsed.is_empty());
    }

    // --- Coordinates and names ---

    #[test]
    fn test_coordinates_bounds() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
        assert_eq!(
            Coordinates::new(-90.5, 0.0),
            Err(ValidationError::LatitudeOutOfRange(-90.5))
        );
        assert_eq!(
            Coordinates::new(0.0, 180.5),
            Err(ValidationError::LongitudeOutOfRange(180.5))
        );
    }

    #[test]
    fn test_coordinates_reject_nan() {
        assert!(validate_latitude(f64::NAN).is_err());
        assert!(validate_longitude(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_city_name() {
        assert_eq!(validate_city_name("Tokyo"), Ok("Tokyo"));
        assert_eq!(validate_city_name("\tNice\n"), Ok("Nice"));
        assert_eq!(validate_city_name(""), Err(ValidationError::EmptyCityName));
    }

    #[test]
    fn test_city_key_unicode() {
        assert_eq!(city_key("SÃO PAULO"), "são paulo");
        assert_eq!(city_key("Zürich"), city_key("ZÜRICH"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::LatitudeOutOfRange(123.0);
        assert!(err.to_string().contains("123"));
        assert!(
            ValidationError::EmptyCityName
                .to_string()
                .contains("must not be empty")
        );
    }

    // --- NotificationSettings ---

    #[test]
    fn test_notification_defaults() {
        let settings = NotificationSettings::default();
        assert!(!settings.enabled);
        assert_eq!(settings.alert_threshold, 150);
        assert!(!settings.daily_reminder);
        assert_eq!(settings.reminder_time, "09:00");
    }

    #[test]
    fn test_notification_should_alert() {
        let mut settings = NotificationSettings::default();
        assert!(!settings.should_alert(400));

        settings.enabled = true;
        assert!(settings.should_alert(150));
        assert!(!settings.should_alert(149));
    }

    #[test]
    fn test_notification_settings_camel_case() {
        let json = serde_json::to_value(NotificationSettings::default()).unwrap();
        assert_eq!(json["alertThreshold"], 150);
        assert_eq!(json["reminderTime"], "09:00");
    }
}
