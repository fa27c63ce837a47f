//! Geographic proximity filter.
//!
//! Distances come from the PostgreSQL `earthdistance` extension: the `<@>`
//! operator between two `point` values, in statute miles.

use crate::error::{SearchError, SearchResult};
use crate::expr::Expr;
use crate::query::SelectQuery;
use crate::types::GeoPoint;

use super::Filter;

/// Default latitude column.
pub const DEFAULT_LATITUDE_COLUMN: &str = "latitude";

/// Default longitude column.
pub const DEFAULT_LONGITUDE_COLUMN: &str = "longitude";

/// Matches rows less than `max_distance` miles from `center`.
#[derive(Debug, Clone, PartialEq)]
pub struct WithinRadius {
    max_distance: f64,
    center: GeoPoint,
    latitude_column: String,
    longitude_column: String,
}

impl WithinRadius {
    pub fn new(max_distance: f64, center: GeoPoint) -> Self {
        Self {
            max_distance,
            center,
            latitude_column: DEFAULT_LATITUDE_COLUMN.to_string(),
            longitude_column: DEFAULT_LONGITUDE_COLUMN.to_string(),
        }
    }

    /// Reads row coordinates from different columns.
    pub fn on_columns(
        mut self,
        latitude_column: impl Into<String>,
        longitude_column: impl Into<String>,
    ) -> Self {
        self.latitude_column = latitude_column.into();
        self.longitude_column = longitude_column.into();
        self
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }
}

/// Builds a PostgreSQL `point`.
///
/// `point(x, y)` takes longitude first and latitude second. Both the row point
/// and the center go through here so the order cannot diverge.
fn point(longitude: Expr, latitude: Expr) -> Expr {
    Expr::func("point", vec![longitude, latitude])
}

impl Filter for WithinRadius {
    fn name(&self) -> String {
        format!("within_radius({} mi of {})", self.max_distance, self.center)
    }

    fn apply(&self, query: SelectQuery) -> SearchResult<SelectQuery> {
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(SearchError::filter(
                self.name(),
                format!(
                    "distance {} must be a finite, non-negative number",
                    self.max_distance
                ),
            ));
        }
        self.center
            .validate()
            .map_err(|message| SearchError::filter(self.name(), message))?;

        let row = point(
            Expr::ident(self.longitude_column.clone()),
            Expr::ident(self.latitude_column.clone()),
        );
        let center = point(
            Expr::lit(self.center.longitude),
            Expr::lit(self.center.latitude),
        );

        Ok(query.and_where(row.earth_distance(center).lt(self.max_distance)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Postgres, SqlParam};

    #[test]
    fn test_point_is_longitude_first() {
        let filter = WithinRadius::new(3.0, GeoPoint::new(40.606536, -111.854952));
        let query = filter.apply(SelectQuery::from("businesses")).unwrap();
        let rendered = query.to_sql(&Postgres).unwrap();

        assert!(rendered.sql.ends_with(concat!(
            r#" WHERE (point("longitude", "latitude")"#,
            r#" <@> point($1::float8, $2::float8)) < $3::float8"#,
        )));
        assert_eq!(
            rendered.params,
            vec![
                SqlParam::Float(-111.854952),
                SqlParam::Float(40.606536),
                SqlParam::Float(3.0),
            ]
        );
    }

    #[test]
    fn test_custom_columns_keep_order() {
        let filter = WithinRadius::new(1.0, GeoPoint::new(0.0, 0.0)).on_columns("lat", "lng");
        let query = filter.apply(SelectQuery::from("places")).unwrap();
        let sql = query.to_sql(&Postgres).unwrap().sql;
        assert!(sql.contains(r#"point("lng", "lat")"#));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let center = GeoPoint::new(40.0, -111.0);
        for miles in [-1.0, f64::NAN, f64::INFINITY] {
            let err = WithinRadius::new(miles, center)
                .apply(SelectQuery::from("businesses"))
                .unwrap_err();
            assert!(matches!(err, SearchError::FilterApplication { .. }));
        }

        let err = WithinRadius::new(3.0, GeoPoint::new(-111.0, 40.0))
            .apply(SelectQuery::from("businesses"))
            .unwrap_err();
        assert!(err.to_string().contains("latitude -111 out of range"));
    }
}
