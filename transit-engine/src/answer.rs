//! Query answers.
//!
//! An empty answer is not a failure. It carries an [`Advisory`] that says
//! why nothing came back, so callers can show a sensible message.

use std::fmt;

use serde::Serialize;

use crate::feed::OutcomeKind;

/// Why an answer is empty or approximate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Advisory {
    NoStopsNearOrigin,
    NoStopsNearDestination,
    NoUpcomingRoutes,
    NoRoutesMatched,
    UnknownRoute,
    UnknownTrip,
    /// The route exists but none of its trips has stop times.
    NoStopsForRoute,
    /// The trip's shape could not be read, so the path joins its stops.
    ShapeApproximatedFromStops,
    /// Neither a shape nor stop coordinates are available.
    NoGeometry,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Advisory::NoStopsNearOrigin => "no stops near origin",
            Advisory::NoStopsNearDestination => "no stops near destination",
            Advisory::NoUpcomingRoutes => "no upcoming direct routes",
            Advisory::NoRoutesMatched => "no routes match the search",
            Advisory::UnknownRoute => "unknown route",
            Advisory::UnknownTrip => "unknown trip",
            Advisory::NoStopsForRoute => "route has no scheduled stops",
            Advisory::ShapeApproximatedFromStops => "path approximated from stop locations",
            Advisory::NoGeometry => "no path available",
        }
    }

    /// Outcome to report when this advisory accompanies an answer.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Advisory::ShapeApproximatedFromStops => OutcomeKind::Succeeded,
            _ => OutcomeKind::NoResults,
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Items plus an optional reason they are missing or approximate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer<T> {
    pub items: Vec<T>,
    pub advisory: Option<Advisory>,
}

impl<T> Answer<T> {
    /// A plain answer. An empty list gets no advisory; use [`Answer::empty`]
    /// to say why.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            advisory: None,
        }
    }

    pub fn empty(advisory: Advisory) -> Self {
        Self {
            items: Vec::new(),
            advisory: Some(advisory),
        }
    }

    /// `items`, or the advisory if there are none.
    pub fn or_advise(items: Vec<T>, advisory: Advisory) -> Self {
        if items.is_empty() {
            Self::empty(advisory)
        } else {
            Self::new(items)
        }
    }

    pub fn with_advisory(mut self, advisory: Advisory) -> Self {
        self.advisory = Some(advisory);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn kind(&self) -> OutcomeKind {
        match self.advisory {
            Some(advisory) => advisory.kind(),
            None if self.items.is_empty() => OutcomeKind::NoResults,
            None => OutcomeKind::Succeeded,
        }
    }
}
