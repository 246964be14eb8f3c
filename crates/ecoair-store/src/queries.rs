//! Query builders for measurement history.

use time::OffsetDateTime;

use crate::retention;

/// Fluent query builder for measurement samples.
///
/// Use this with [`StorageFacade::query_measurements`](crate::StorageFacade::query_measurements).
/// All filter methods are optional and can be chained in any order.
///
/// By default, queries return results ordered by `measured_at` ascending
/// (oldest first), which is the order charts consume.
///
/// # Example
///
/// ```
/// use ecoair_store::MeasurementQuery;
/// use time::{Duration, OffsetDateTime};
///
/// let now = OffsetDateTime::now_utc();
///
/// // Last week for Paris
/// let query = MeasurementQuery::new()
///     .city("Paris")
///     .since(now - Duration::days(7));
///
/// // Ten latest samples, newest first
/// let latest = MeasurementQuery::new().city("Paris").newest_first().limit(10);
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeasurementQuery {
    /// Filter by city, compared case-insensitively (optional).
    pub city: Option<String>,
    /// Include only samples at or after this time (optional).
    pub since: Option<OffsetDateTime>,
    /// Include only samples at or before this time (optional).
    pub until: Option<OffsetDateTime>,
    /// Maximum number of results to return (optional).
    pub limit: Option<u32>,
    /// Number of results to skip for pagination (optional).
    pub offset: Option<u32>,
    /// If true, order by `measured_at` descending. Default: false.
    pub newest_first: bool,
}

impl MeasurementQuery {
    /// Create a new query: every city, no time bounds, oldest first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples of one city within the trailing `days` window ending at `now`.
    pub fn trailing(city: &str, days: i64, now: OffsetDateTime) -> Self {
        Self::new()
            .city(city)
            .since(retention::window_start(now, days))
    }

    /// Filter by city name.
    pub fn city(mut self, city: &str) -> Self {
        self.city = Some(city.to_string());
        self
    }

    /// Filter to samples at or after this time.
    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.since = Some(time);
        self
    }

    /// Filter to samples at or before this time.
    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.until = Some(time);
        self
    }

    /// Limit the maximum number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first N results.
    ///
    /// Use with `limit()` for pagination. Without a limit the offset still applies.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Order results newest first.
    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    /// Order results oldest first (the default).
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl MeasurementQuery {
    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref city) = self.city {
            conditions.push("city_key = ?");
            params.push(Box::new(ecoair_types::city_key(city)));
        }

        if let Some(since) = self.since {
            conditions.push("measured_at >= ?");
            params.push(Box::new(since.unix_timestamp()));
        }

        if let Some(until) = self.until {
            conditions.push("measured_at <= ?");
            params.push(Box::new(until.unix_timestamp()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();
        let order = if self.newest_first { "DESC" } else { "ASC" };

        let mut sql = format!(
            "SELECT id, city_name, aqi, pm25, pm10, o3, no2, measured_at \
             FROM air_quality_history {where_clause} ORDER BY measured_at {order}, id {order}"
        );

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // SQLite needs a LIMIT before OFFSET
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_query_new_defaults() {
        let query = MeasurementQuery::new();
        assert!(query.city.is_none());
        assert!(query.since.is_none());
        assert!(query.until.is_none());
        assert!(query.limit.is_none());
        assert!(query.offset.is_none());
        assert!(!query.newest_first);
    }

    #[test]
    fn test_query_chaining() {
        let since = datetime!(2025-01-01 00:00:00 UTC);
        let until = datetime!(2025-01-31 23:59:59 UTC);

        let query = MeasurementQuery::new()
            .city("Lyon")
            .since(since)
            .until(until)
            .limit(10)
            .offset(5)
            .newest_first();

        assert_eq!(query.city.as_deref(), Some("Lyon"));
        assert_eq!(query.since, Some(since));
        assert_eq!(query.until, Some(until));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(5));
        assert!(query.newest_first);
        assert!(!query.oldest_first().newest_first);
    }

    #[test]
    fn test_trailing_window() {
        let now = datetime!(2025-01-08 12:00:00 UTC);
        let query = MeasurementQuery::trailing("Paris", 7, now);
        assert_eq!(query.since, Some(datetime!(2025-01-01 12:00:00 UTC)));
        assert_eq!(query.city.as_deref(), Some("Paris"));
        assert!(query.until.is_none());
    }

    #[test]
    fn test_trailing_window_with_huge_days_does_not_overflow() {
        let now = datetime!(2025-01-08 12:00:00 UTC);
        let query = MeasurementQuery::trailing("Paris", 10_000_000, now);
        assert!(query.since.is_some_and(|since| since < now));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_build_sql_empty_query() {
        let (where_clause, params) = MeasurementQuery::new().build_where();
        assert!(where_clause.is_empty());
        assert!(params.is_empty());

        let sql = MeasurementQuery::new().build_sql();
        assert!(sql.contains("ORDER BY measured_at ASC"));
        assert!(!sql.contains("WHERE"));
        assert!(!sql.contains("LIMIT"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_build_sql_filters() {
        let query = MeasurementQuery::new()
            .city("PARIS")
            .since(datetime!(2025-01-01 00:00:00 UTC))
            .until(datetime!(2025-02-01 00:00:00 UTC))
            .newest_first()
            .limit(20);

        let (where_clause, params) = query.build_where();
        assert_eq!(
            where_clause,
            "WHERE city_key = ? AND measured_at >= ? AND measured_at <= ?"
        );
        assert_eq!(params.len(), 3);

        let sql = query.build_sql();
        assert!(sql.contains("ORDER BY measured_at DESC"));
        assert!(sql.ends_with("LIMIT 20"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_build_sql_offset_without_limit() {
        let sql = MeasurementQuery::new().offset(3).build_sql();
        assert!(sql.ends_with("LIMIT -1 OFFSET 3"));
    }
}
