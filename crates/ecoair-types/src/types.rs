//! Core types for air quality data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

/// Health band of an AQI value.
///
/// Bands follow the US EPA scale. Labels are the French strings shown by the
/// app and stored alongside cached readings.
///
/// # Ordering
///
/// Levels are ordered by severity, so threshold checks read naturally:
///
/// ```
/// use ecoair_types::AqiLevel;
///
/// assert!(AqiLevel::Unhealthy > AqiLevel::Moderate);
/// assert_eq!(AqiLevel::from_aqi(42), Some(AqiLevel::Good));
/// assert_eq!(AqiLevel::Good.label(), "Bon");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum AqiLevel {
    /// 0 to 50.
    Good,
    /// 51 to 100.
    Moderate,
    /// 101 to 150.
    UnhealthyForSensitiveGroups,
    /// 151 to 200.
    Unhealthy,
    /// 201 to 300.
    VeryUnhealthy,
    /// Above 300.
    Hazardous,
}

impl AqiLevel {
    /// All levels from least to most severe.
    pub const ALL: [AqiLevel; 6] = [
        AqiLevel::Good,
        AqiLevel::Moderate,
        AqiLevel::UnhealthyForSensitiveGroups,
        AqiLevel::Unhealthy,
        AqiLevel::VeryUnhealthy,
        AqiLevel::Hazardous,
    ];

    /// Classify an AQI value. Negative values have no level.
    ///
    /// ```
    /// use ecoair_types::AqiLevel;
    ///
    /// assert_eq!(AqiLevel::from_aqi(50), Some(AqiLevel::Good));
    /// assert_eq!(AqiLevel::from_aqi(51), Some(AqiLevel::Moderate));
    /// assert_eq!(AqiLevel::from_aqi(450), Some(AqiLevel::Hazardous));
    /// assert_eq!(AqiLevel::from_aqi(-1), None);
    /// ```
    #[must_use]
    pub fn from_aqi(aqi: i32) -> Option<Self> {
        match aqi {
            i32::MIN..=-1 => None,
            0..=50 => Some(AqiLevel::Good),
            51..=100 => Some(AqiLevel::Moderate),
            101..=150 => Some(AqiLevel::UnhealthyForSensitiveGroups),
            151..=200 => Some(AqiLevel::Unhealthy),
            201..=300 => Some(AqiLevel::VeryUnhealthy),
            _ => Some(AqiLevel::Hazardous),
        }
    }

    /// Inclusive AQI range covered by this level.
    #[must_use]
    pub fn range(&self) -> (i32, i32) {
        match self {
            AqiLevel::Good => (0, 50),
            AqiLevel::Moderate => (51, 100),
            AqiLevel::UnhealthyForSensitiveGroups => (101, 150),
            AqiLevel::Unhealthy => (151, 200),
            AqiLevel::VeryUnhealthy => (201, 300),
            AqiLevel::Hazardous => (301, i32::MAX),
        }
    }

    /// Label stored with cached readings.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Bon",
            AqiLevel::Moderate => "Modéré",
            AqiLevel::UnhealthyForSensitiveGroups => "Mauvais pour groupes sensibles",
            AqiLevel::Unhealthy => "Mauvais",
            AqiLevel::VeryUnhealthy => "Très mauvais",
            AqiLevel::Hazardous => "Dangereux",
        }
    }

    /// Short health advice for the level.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Profitez de vos activités en plein air !",
            AqiLevel::Moderate => {
                "Les personnes sensibles devraient limiter les efforts prolongés."
            }
            AqiLevel::UnhealthyForSensitiveGroups => {
                "Les groupes sensibles devraient réduire les efforts prolongés."
            }
            AqiLevel::Unhealthy => "Tout le monde devrait limiter les efforts prolongés.",
            AqiLevel::VeryUnhealthy => "Évitez les efforts en extérieur.",
            AqiLevel::Hazardous => "Restez à l'intérieur et gardez les fenêtres fermées.",
        }
    }
}

impl fmt::Display for AqiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pollutant concentrations reported alongside an AQI value, in µg/m³.
///
/// Every field is optional; providers frequently omit some of them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pollutants {
    /// Fine particulate matter (PM2.5).
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub pm25: Option<f64>,
    /// Particulate matter (PM10).
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub pm10: Option<f64>,
    /// Ground-level ozone.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub o3: Option<f64>,
    /// Nitrogen dioxide.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub no2: Option<f64>,
}

impl Pollutants {
    /// No pollutant data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set PM2.5.
    pub fn pm25(mut self, value: f64) -> Self {
        self.pm25 = Some(value);
        self
    }

    /// Set PM10.
    pub fn pm10(mut self, value: f64) -> Self {
        self.pm10 = Some(value);
        self
    }

    /// Set ozone.
    pub fn o3(mut self, value: f64) -> Self {
        self.o3 = Some(value);
        self
    }

    /// Set nitrogen dioxide.
    pub fn no2(mut self, value: f64) -> Self {
        self.no2 = Some(value);
        self
    }

    /// True when no concentration is known.
    pub fn is_empty(&self) -> bool {
        self.pm25.is_none() && self.pm10.is_none() && self.o3.is_none() && self.no2.is_none()
    }
}

/// A validated geographic position.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinates {
    /// Degrees north, -90 to 90.
    pub latitude: f64,
    /// Degrees east, -180 to 180.
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting out-of-range values.
    ///
    /// ```
    /// use ecoair_types::Coordinates;
    ///
    /// assert!(Coordinates::new(48.85, 2.35).is_ok());
    /// assert!(Coordinates::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> ValidationResult<Self> {
        validate_latitude(latitude)?;
        validate_longitude(longitude)?;
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Check that a latitude lies within [-90, 90].
pub fn validate_latitude(latitude: f64) -> ValidationResult<f64> {
    // NaN fails the range check as well
    if (-90.0..=90.0).contains(&latitude) {
        Ok(latitude)
    } else {
        Err(ValidationError::LatitudeOutOfRange(latitude))
    }
}

/// Check that a longitude lies within [-180, 180].
pub fn validate_longitude(longitude: f64) -> ValidationResult<f64> {
    if (-180.0..=180.0).contains(&longitude) {
        Ok(longitude)
    } else {
        Err(ValidationError::LongitudeOutOfRange(longitude))
    }
}

/// Trim a city name and reject it if nothing is left.
///
/// ```
/// use ecoair_types::validate_city_name;
///
/// assert_eq!(validate_city_name("  Lyon ").unwrap(), "Lyon");
/// assert!(validate_city_name("   ").is_err());
/// ```
pub fn validate_city_name(name: &str) -> ValidationResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyCityName)
    } else {
        Ok(trimmed)
    }
}

/// Key under which a city name is compared and indexed.
///
/// Two names refer to the same city when their keys are equal. The key is the
/// trimmed name in Unicode lowercase, so `"ÉVRY"` and `"évry"` collide.
///
/// ```
/// use ecoair_types::city_key;
///
/// assert_eq!(city_key(" Paris "), city_key("PARIS"));
/// assert_eq!(city_key("ÉVRY"), "évry");
/// ```
#[must_use]
pub fn city_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Alert preferences kept on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct NotificationSettings {
    /// Whether notifications are enabled at all.
    pub enabled: bool,
    /// AQI at or above which an alert is raised.
    pub alert_threshold: i32,
    /// Whether a daily reminder is sent.
    pub daily_reminder: bool,
    /// Local time of the daily reminder, `HH:MM`.
    pub reminder_time: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            alert_threshold: 150,
            daily_reminder: false,
            reminder_time: "09:00".to_string(),
        }
    }
}

impl NotificationSettings {
    /// Whether a reading should trigger an alert under these settings.
    pub fn should_alert(&self, aqi: i32) -> bool {
        self.enabled && aqi >= self.alert_threshold
    }
}
