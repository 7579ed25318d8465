//! GTFS static feed engine.
//!
//! Loads a directory of GTFS tables into an immutable in-memory snapshot and
//! answers: which stops does a route visit, which direct trips connect two
//! points soon, and what path does a trip follow between two stops.

pub mod answer;
pub mod cache;
pub mod calendar;
pub mod cancel;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod planner;
pub mod shapes;
pub mod spatial;

pub use answer::{Advisory, Answer};
pub use engine::{EngineConfig, LoadState, QueryError, TransitEngine};
pub use feed::{FeedError, OutcomeKind};
