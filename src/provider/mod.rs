//! Routing engine abstraction
//!
//! This module defines the trait the cache uses to talk to an actual
//! route-computation engine, plus its result and error types. Concrete
//! engine bindings (an embedded OSRM instance, an HTTP routing API, a local
//! graph search) live outside this crate and implement [`RouteProvider`].

mod types;

pub use types::{MetricKind, RouteError, RouteProvider, RouteSummary};
