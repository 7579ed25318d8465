//! Direct-trip suggestions.
//!
//! Answers "which single trip takes me from near here to near there, soon?"
//! by scanning every trip that runs today for a stop near the origin
//! followed later by a stop near the destination. No transfers.

mod config;
mod rank;
mod suggest;


pub use config::PlannerConfig;
pub use rank::{keep_earliest, rank_options};
pub use suggest::{Planner, SuggestError, SuggestRequest, SuggestedRouteOption};
