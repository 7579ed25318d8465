//! Domain types for the transit feed engine.
//!
//! These are the immutable entities held by a feed snapshot. Raw feed text
//! is validated into these types by the `feed` module; anything that fails
//! validation never reaches here.

mod ids;
mod route;
mod stop;
mod time;
mod trip;

pub use ids::{RouteId, ServiceId, ShapeId, StopId, TripId};
pub use route::{Route, RouteType};
pub use stop::{LatLon, Stop};
pub use time::{GtfsTime, TimeError};
pub use trip::{StopTime, Trip};
