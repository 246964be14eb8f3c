//! Data models for stored data.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use ecoair_types::{
    AqiLevel, Pollutants, ValidationResult, validate_city_name, validate_latitude,
    validate_longitude,
};

/// A bookmarked city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteCity {
    /// Identifier assigned at creation.
    pub id: i64,
    /// City name as entered (trimmed).
    pub name: String,
    /// Country name or code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// When the city was bookmarked.
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
    /// Last modification.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Input for adding a favorite.
///
/// ```
/// use ecoair_store::NewFavorite;
///
/// let fav = NewFavorite::new("Tokyo").country("JP").coordinates(35.68, 139.69);
/// assert_eq!(fav.name, "Tokyo");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewFavorite {
    pub name: String,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NewFavorite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Trim the name and check the coordinates.
    pub(crate) fn validated(&self) -> ValidationResult<NewFavorite> {
        let name = validate_city_name(&self.name)?.to_string();
        if let Some(lat) = self.latitude {
            validate_latitude(lat)?;
        }
        if let Some(lon) = self.longitude {
            validate_longitude(lon)?;
        }
        Ok(NewFavorite {
            name,
            country: self.country.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

/// Partial update of a favorite. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoriteUpdate {
    pub name: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl FavoriteUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn latitude(mut self, latitude: f64) -> Self {
        self.latitude = Some(latitude);
        self
    }

    pub fn longitude(mut self, longitude: f64) -> Self {
        self.longitude = Some(longitude);
        self
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.country.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }

    pub(crate) fn validated(&self) -> ValidationResult<FavoriteUpdate> {
        let name = match &self.name {
            Some(name) => Some(validate_city_name(name)?.to_string()),
            None => None,
        };
        if let Some(lat) = self.latitude {
            validate_latitude(lat)?;
        }
        if let Some(lon) = self.longitude {
            validate_longitude(lon)?;
        }
        Ok(FavoriteUpdate {
            name,
            country: self.country.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }

    /// Apply the supplied fields to a favorite held in memory.
    pub(crate) fn apply_to(&self, favorite: &mut FavoriteCity, now: OffsetDateTime) {
        if let Some(name) = &self.name {
            favorite.name = name.clone();
        }
        if let Some(country) = &self.country {
            favorite.country = Some(country.clone());
        }
        if let Some(lat) = self.latitude {
            favorite.latitude = Some(lat);
        }
        if let Some(lon) = self.longitude {
            favorite.longitude = Some(lon);
        }
        favorite.updated_at = now;
    }
}

/// AQI payload handed to the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub city_name: String,
    pub aqi: i32,
    /// Level label stored verbatim.
    pub level: String,
    /// Provider response, stored as-is.
    pub data: serde_json::Value,
}

impl CacheEntry {
    /// Entry whose level is derived from the AQI value.
    ///
    /// Negative values get an empty label.
    pub fn new(city_name: impl Into<String>, aqi: i32, data: serde_json::Value) -> Self {
        let level = AqiLevel::from_aqi(aqi)
            .map(|l| l.label().to_string())
            .unwrap_or_default();
        Self {
            city_name: city_name.into(),
            aqi,
            level,
            data,
        }
    }

    /// Override the level label.
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

/// A cache hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAirQuality {
    pub city_name: String,
    pub aqi: i32,
    pub level: String,
    pub data: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub cached_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// Input for recording a measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub city_name: String,
    pub aqi: i32,
    pub pollutants: Pollutants,
    /// Defaults to now when absent.
    pub measured_at: Option<OffsetDateTime>,
}

impl NewMeasurement {
    pub fn new(city_name: impl Into<String>, aqi: i32) -> Self {
        Self {
            city_name: city_name.into(),
            aqi,
            pollutants: Pollutants::default(),
            measured_at: None,
        }
    }

    pub fn pollutants(mut self, pollutants: Pollutants) -> Self {
        self.pollutants = pollutants;
        self
    }

    /// Back-date the sample.
    pub fn measured_at(mut self, at: OffsetDateTime) -> Self {
        self.measured_at = Some(at);
        self
    }
}

/// A stored measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSample {
    pub id: i64,
    pub city_name: String,
    pub aqi: i32,
    #[serde(flatten)]
    pub pollutants: Pollutants,
    #[serde(with = "time::serde::rfc3339")]
    pub measured_at: OffsetDateTime,
}

impl MeasurementSample {
    /// Health band of the sample.
    pub fn level(&self) -> Option<AqiLevel> {
        AqiLevel::from_aqi(self.aqi)
    }
}

/// Row counts per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub favorites: u64,
    pub search_history: u64,
    pub cached: u64,
    pub measurements: u64,
}

impl StorageStats {
    pub fn total(&self) -> u64 {
        self.favorites + self.search_history + self.cached + self.measurements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoair_types::ValidationError;
    use time::macros::datetime;

    #[test]
    fn test_new_favorite_validation_trims() {
        let fav = NewFavorite::new("  Lyon ").validated().unwrap();
        assert_eq!(fav.name, "Lyon");
    }

    #[test]
    fn test_new_favorite_rejects_bad_coordinates() {
        let err = NewFavorite::new("Nowhere")
            .coordinates(95.0, 0.0)
            .validated()
            .unwrap_err();
        assert_eq!(err, ValidationError::LatitudeOutOfRange(95.0));
    }

    #[test]
    fn test_update_applies_only_supplied_fields() {
        let t0 = datetime!(2025-03-01 08:00:00 UTC);
        let t1 = datetime!(2025-03-02 08:00:00 UTC);
        let mut fav = FavoriteCity {
            id: 1,
            name: "Paris".into(),
            country: Some("FR".into()),
            latitude: Some(48.85),
            longitude: Some(2.35),
            added_at: t0,
            updated_at: t0,
        };

        FavoriteUpdate::new().latitude(48.9).apply_to(&mut fav, t1);

        assert_eq!(fav.name, "Paris");
        assert_eq!(fav.country.as_deref(), Some("FR"));
        assert_eq!(fav.latitude, Some(48.9));
        assert_eq!(fav.longitude, Some(2.35));
        assert_eq!(fav.added_at, t0);
        assert_eq!(fav.updated_at, t1);
    }

    #[test]
    fn test_update_rejects_blank_name() {
        assert!(FavoriteUpdate::new().name("   ").validated().is_err());
        assert!(FavoriteUpdate::new().is_empty());
    }

    #[test]
    fn test_cache_entry_derives_level() {
        let entry = CacheEntry::new("Paris", 42, serde_json::json!({"aqi": 42}));
        assert_eq!(entry.level, "Bon");

        let entry = CacheEntry::new("Delhi", 320, serde_json::Value::Null).level("custom");
        assert_eq!(entry.level, "custom");
    }

    #[test]
    fn test_favorite_serialization_roundtrip() {
        let fav = FavoriteCity {
            id: 7,
            name: "Tokyo".into(),
            country: None,
            latitude: None,
            longitude: None,
            added_at: datetime!(2025-01-01 00:00:00 UTC),
            updated_at: datetime!(2025-01-01 00:00:00 UTC),
        };
        let json = serde_json::to_string(&fav).unwrap();
        assert!(!json.contains("country"));
        let back: FavoriteCity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fav);
    }
}
