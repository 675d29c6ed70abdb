//! Routing provider types and traits

use std::fmt;

/// Which scalar of a route result gets cached and returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Travel time in seconds
    Duration,
    /// Travel distance in meters
    Distance,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Duration => write!(f, "duration"),
            MetricKind::Distance => write!(f, "distance"),
        }
    }
}

/// Result of a single route computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSummary {
    /// Travel distance in meters
    pub distance_meters: f64,
    /// Travel time in seconds
    pub duration_seconds: f64,
}

impl RouteSummary {
    /// Select the scalar for the given metric kind.
    #[inline]
    pub fn metric(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Duration => self.duration_seconds,
            MetricKind::Distance => self.distance_meters,
        }
    }
}

/// Errors that can occur during route computation.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteError {
    /// No route exists between the given coordinates
    NoRoute,
    /// Coordinate outside the engine's supported range
    InvalidCoordinate(f64),
    /// Engine-specific failure
    Engine(String),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::NoRoute => write!(f, "No route found between coordinates"),
            RouteError::InvalidCoordinate(value) => {
                write!(f, "Coordinate {} not supported by engine", value)
            }
            RouteError::Engine(msg) => write!(f, "Engine error: {}", msg),
        }
    }
}

impl std::error::Error for RouteError {}

/// Trait for route-computation engines.
///
/// Implementors wrap an actual routing engine (OSRM instance, HTTP routing
/// API, graph search over a local network, ...). The cache treats them as
/// black boxes: results are stored verbatim and failures are never cached.
pub trait RouteProvider: Send + Sync {
    /// Computes a single route.
    ///
    /// # Arguments
    ///
    /// * `src_lon`, `src_lat` - Source coordinates in degrees
    /// * `dst_lon`, `dst_lat` - Destination coordinates in degrees
    ///
    /// # Returns
    ///
    /// Distance and duration of the best route, or an error.
    fn route(
        &self,
        src_lon: f64,
        src_lat: f64,
        dst_lon: f64,
        dst_lat: f64,
    ) -> Result<RouteSummary, RouteError>;

    /// Computes a sources × destinations matrix of the requested metric.
    ///
    /// Coordinates are `(lon, lat)` pairs. The returned matrix has one row
    /// per source and one column per destination. Unroutable pairs may be
    /// reported as NaN cells rather than a whole-call error, matching the
    /// convention of table services.
    ///
    /// The default implementation issues one `route` call per pair; engines
    /// with a native many-to-many service should override it.
    fn table(
        &self,
        sources: &[(f64, f64)],
        destinations: &[(f64, f64)],
        metric: MetricKind,
    ) -> Result<Vec<Vec<f64>>, RouteError> {
        let mut matrix = Vec::with_capacity(sources.len());
        for &(src_lon, src_lat) in sources {
            let mut row = Vec::with_capacity(destinations.len());
            for &(dst_lon, dst_lat) in destinations {
                match self.route(src_lon, src_lat, dst_lon, dst_lat) {
                    Ok(summary) => row.push(summary.metric(metric)),
                    Err(RouteError::NoRoute) => row.push(f64::NAN),
                    Err(err) => return Err(err),
                }
            }
            matrix.push(row);
        }
        Ok(matrix)
    }

    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider that derives a deterministic metric from the coordinates.
    struct GridProvider {
        unroutable: Option<(f64, f64)>,
    }

    impl RouteProvider for GridProvider {
        fn route(
            &self,
            src_lon: f64,
            src_lat: f64,
            dst_lon: f64,
            dst_lat: f64,
        ) -> Result<RouteSummary, RouteError> {
            if let Some((lon, lat)) = self.unroutable {
                if dst_lon == lon && dst_lat == lat {
                    return Err(RouteError::NoRoute);
                }
            }
            let distance = ((dst_lon - src_lon).abs() + (dst_lat - src_lat).abs()) * 1000.0;
            Ok(RouteSummary {
                distance_meters: distance,
                duration_seconds: distance / 10.0,
            })
        }

        fn name(&self) -> &str {
            "grid"
        }
    }

    #[test]
    fn test_route_summary_metric_selection() {
        let summary = RouteSummary {
            distance_meters: 1500.0,
            duration_seconds: 120.0,
        };
        assert_eq!(summary.metric(MetricKind::Distance), 1500.0);
        assert_eq!(summary.metric(MetricKind::Duration), 120.0);
    }

    #[test]
    fn test_default_table_shape() {
        let provider = GridProvider { unroutable: None };
        let sources = vec![(0.0, 0.0), (1.0, 0.0)];
        let destinations = vec![(0.0, 1.0), (1.0, 1.0), (2.0, 1.0)];

        let matrix = provider
            .table(&sources, &destinations, MetricKind::Duration)
            .unwrap();

        assert_eq!(matrix.len(), 2);
        assert!(matrix.iter().all(|row| row.len() == 3));
    }

    #[test]
    fn test_default_table_matches_route() {
        let provider = GridProvider { unroutable: None };
        let matrix = provider
            .table(&[(0.0, 0.0)], &[(2.0, 1.0)], MetricKind::Distance)
            .unwrap();

        let summary = provider.route(0.0, 0.0, 2.0, 1.0).unwrap();
        assert_eq!(matrix[0][0], summary.distance_meters);
    }

    #[test]
    fn test_default_table_no_route_is_nan_cell() {
        let provider = GridProvider {
            unroutable: Some((2.0, 1.0)),
        };
        let matrix = provider
            .table(&[(0.0, 0.0)], &[(1.0, 1.0), (2.0, 1.0)], MetricKind::Duration)
            .unwrap();

        assert!(matrix[0][0].is_finite());
        assert!(matrix[0][1].is_nan());
    }

    #[test]
    fn test_route_error_display() {
        assert_eq!(
            RouteError::NoRoute.to_string(),
            "No route found between coordinates"
        );
        assert_eq!(
            RouteError::Engine("osrm: table failed".into()).to_string(),
            "Engine error: osrm: table failed"
        );
    }

    #[test]
    fn test_metric_kind_display() {
        assert_eq!(MetricKind::Duration.to_string(), "duration");
        assert_eq!(MetricKind::Distance.to_string(), "distance");
    }
}
