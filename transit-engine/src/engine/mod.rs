//! The transit engine: owns the current feed snapshot and answers queries
//! against it.
//!
//! Loading builds a complete new [`FeedStore`] on a blocking worker and
//! swaps it in only once it is finished, so queries see either the old
//! feed or the new one. A failed or cancelled load leaves the old feed in
//! place, and so does dropping the load future. Queries take a reference
//! to whichever snapshot is current when they start and run on blocking
//! workers; dropping a query future cancels its scan.

mod config;
mod error;
mod state;

pub use config::EngineConfig;
pub use error::QueryError;
pub use state::LoadState;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use crate::answer::{Advisory, Answer};
use crate::cache::ShapeCache;
use crate::cancel::CancelFlag;
use crate::domain::{LatLon, Route, RouteId, Stop, TripId};
use crate::feed::{FeedError, FeedStore, FeedSummary, build_store};
use crate::planner::{Planner, SuggestRequest, SuggestedRouteOption};
use crate::shapes::{extract_segment, read_shape_file};

/// Thread-safe handle to the engine. Clones share the same feed.
#[derive(Clone)]
pub struct TransitEngine {
    inner: Arc<Inner>,
}

struct Inner {
    config: EngineConfig,
    snapshot: RwLock<Option<Arc<FeedStore>>>,
    shapes: ShapeCache,
    state: watch::Sender<LoadState>,
    refresh: Mutex<Refresh>,
}

impl Inner {
    fn refresh(&self) -> MutexGuard<'_, Refresh> {
        self.refresh.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Bookkeeping for feed loads.
#[derive(Default)]
struct Refresh {
    /// Bumped by every load. Only the newest load publishes its state.
    generation: u64,
    /// Cancel flag of the newest load while it runs.
    running: Option<CancelFlag>,
}

/// One load's claim on the published [`LoadState`].
///
/// Dropping it unfinished means the caller abandoned the load: the build
/// is cancelled and the state reports the cancellation.
struct LoadTicket {
    inner: Arc<Inner>,
    generation: u64,
    cancel: CancelFlag,
    finished: bool,
}

impl LoadTicket {
    fn finish(mut self, state: LoadState) {
        self.finished = true;
        self.publish(state);
    }

    /// Publish `state` unless a newer load has started since.
    fn publish(&self, state: LoadState) {
        let mut refresh = self.inner.refresh();
        if refresh.generation != self.generation {
            debug!("feed load superseded, not publishing its state");
            return;
        }
        refresh.running = None;
        self.inner.state.send_replace(state);
    }
}

impl Drop for LoadTicket {
    fn drop(&mut self) {
        if !self.finished {
            warn!("feed load abandoned by its caller");
            self.cancel.cancel();
            self.publish(LoadState::failed(&FeedError::Cancelled));
        }
    }
}

impl TransitEngine {
    /// Create an engine with no feed loaded.
    pub fn new(config: EngineConfig) -> Self {
        let shapes = ShapeCache::new(&config.shape_cache);
        let (state, _) = watch::channel(LoadState::Idle);
        Self {
            inner: Arc::new(Inner {
                config,
                snapshot: RwLock::new(None),
                shapes,
                state,
                refresh: Mutex::new(Refresh::default()),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Load the feed from the configured directory.
    ///
    /// Without `force_refresh`, an engine that already has a feed returns
    /// its summary without reading anything. Starting a load cancels one
    /// that is still running.
    pub async fn load_feed(&self, force_refresh: bool) -> Result<FeedSummary, FeedError> {
        if !force_refresh {
            if let Some(store) = self.snapshot().await {
                return Ok(store.summary());
            }
        }

        let ticket = self.begin_load();
        let dir = self.inner.config.feed_dir.clone();
        let ingest = self.inner.config.ingest.clone();
        let flag = ticket.cancel.clone();
        let built = tokio::task::spawn_blocking(move || build_store(&dir, &ingest, &flag))
            .await
            .map_err(|err| FeedError::Worker(err.to_string()))
            .and_then(|result| result)
            .and_then(|store| {
                // Superseded after the build finished but before publishing.
                if ticket.cancel.is_cancelled() {
                    Err(FeedError::Cancelled)
                } else {
                    Ok(store)
                }
            });

        match built {
            Ok(store) => {
                let summary = store.summary();
                *self.inner.snapshot.write().await = Some(Arc::new(store));
                self.inner.shapes.invalidate_all();
                info!(
                    dir = %self.inner.config.feed_dir.display(),
                    routes = summary.routes,
                    trips = summary.trips,
                    stops = summary.stops,
                    "feed published"
                );
                ticket.finish(LoadState::Ready { summary });
                Ok(summary)
            }
            Err(err) => {
                warn!(error = %err, kind = ?err.kind(), "feed load failed, keeping previous feed");
                ticket.finish(LoadState::failed(&err));
                Err(err)
            }
        }
    }

    /// Register a new load, cancelling the one in progress.
    fn begin_load(&self) -> LoadTicket {
        let mut refresh = self.inner.refresh();
        refresh.generation += 1;
        let cancel = CancelFlag::new();
        if let Some(previous) = refresh.running.replace(cancel.clone()) {
            info!("cancelling feed load in progress");
            previous.cancel();
        }
        self.inner.state.send_replace(LoadState::Loading);
        LoadTicket {
            inner: self.inner.clone(),
            generation: refresh.generation,
            cancel,
            finished: false,
        }
    }

    /// Cancel the load in progress. Returns whether there was one.
    pub fn cancel_refresh(&self) -> bool {
        match self.inner.refresh().running.take() {
            Some(flag) => {
                info!("feed load cancelled");
                flag.cancel();
                true
            }
            None => false,
        }
    }

    /// Receive every load state change.
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> LoadState {
        self.inner.state.borrow().clone()
    }

    /// The current feed, if one has been published.
    pub async fn snapshot(&self) -> Option<Arc<FeedStore>> {
        self.inner.snapshot.read().await.clone()
    }

    async fn loaded_store(&self) -> Result<Arc<FeedStore>, QueryError> {
        self.snapshot().await.ok_or(QueryError::NotReady)
    }

    /// Routes whose short or long name contains `query`, ignoring case.
    /// A blank query lists every route.
    pub async fn search_routes(&self, query: &str) -> Result<Answer<Route>, QueryError> {
        let store = self.loaded_store().await?;
        let needle = query.trim().to_lowercase();
        let routes: Vec<Route> = store
            .routes()
            .iter()
            .filter(|route| needle.is_empty() || route.matches_lowercase(&needle))
            .cloned()
            .collect();
        debug!(query, matched = routes.len(), "route search");
        Ok(Answer::or_advise(routes, Advisory::NoRoutesMatched))
    }

    /// Stops of a route in order, taken from its trip with the most stops.
    ///
    /// Stop ids missing from stops.txt come back as placeholder stops.
    pub async fn stop_sequence_for_route(
        &self,
        route_id: &RouteId,
    ) -> Result<Answer<Stop>, QueryError> {
        let store = self.loaded_store().await?;
        let route_id = route_id.clone();
        run_blocking(move |cancel| {
            if store.route(&route_id).is_none() {
                return Ok(Answer::empty(Advisory::UnknownRoute));
            }

            let mut representative: Option<&TripId> = None;
            let mut most = 0;
            for trip in store.trips_for_route(&route_id) {
                if cancel.is_cancelled() {
                    return Err(QueryError::Cancelled);
                }
                let count = store.stop_times(&trip.id).len();
                if count > most {
                    most = count;
                    representative = Some(&trip.id);
                }
            }
            let Some(trip_id) = representative else {
                return Ok(Answer::empty(Advisory::NoStopsForRoute));
            };

            debug!(route = %route_id, trip = %trip_id, stops = most, "representative trip");
            let stops = store
                .stop_times(trip_id)
                .iter()
                .map(|st| store.stop_or_placeholder(&st.stop_id).into_owned())
                .collect();
            Ok(Answer::new(stops))
        })
        .await
    }

    /// Direct trips from near `origin` to near `destination` leaving at or
    /// after `now`, earliest first.
    ///
    /// Unlike the other queries this needs every collection populated,
    /// calendars included.
    pub async fn suggest_direct_routes(
        &self,
        origin: LatLon,
        destination: LatLon,
        now: NaiveDateTime,
    ) -> Result<Answer<SuggestedRouteOption>, QueryError> {
        let store = self.loaded_store().await?;
        let config = self.inner.config.planner.clone();
        let request = SuggestRequest::new(origin, destination, now);
        run_blocking(move |cancel| {
            Ok(Planner::new(&store, &config).suggest(&request, cancel)?)
        })
        .await
    }

    /// The path a trip's vehicle follows.
    ///
    /// Reads the trip's shape from shapes.txt (or the shape cache). When the
    /// trip has no shape, or it cannot be read, the path joins the trip's
    /// stops instead and the answer says so.
    pub async fn shape_for_trip(&self, trip_id: &TripId) -> Result<Answer<LatLon>, QueryError> {
        let store = self.loaded_store().await?;
        let Some(trip) = store.trip(trip_id) else {
            return Ok(Answer::empty(Advisory::UnknownTrip));
        };

        if let Some(shape_id) = trip.shape_id.clone() {
            if let Some(points) = self.inner.shapes.get(&shape_id).await {
                return Ok(Answer::new(points.to_vec()));
            }

            let dir = self.inner.config.feed_dir.clone();
            let id = shape_id.clone();
            let read = run_blocking(move |cancel| {
                Ok(read_shape_file(&dir, &id, cancel))
            })
            .await?;
            match read {
                Ok(points) if !points.is_empty() => {
                    let points = Arc::new(points);
                    self.inner.shapes.insert(shape_id.clone(), points.clone()).await;
                    debug!(
                        shape = %shape_id,
                        points = points.len(),
                        cached = self.inner.shapes.entry_count(),
                        "shape cached"
                    );
                    return Ok(Answer::new(points.to_vec()));
                }
                Ok(_) => debug!(shape = %shape_id, trip = %trip_id, "shape has no points"),
                Err(FeedError::Cancelled) => return Err(QueryError::Cancelled),
                Err(err) => warn!(shape = %shape_id, error = %err, "shape unavailable"),
            }
        }

        let points: Vec<LatLon> = store
            .stop_times(trip_id)
            .iter()
            .filter_map(|st| store.stop(&st.stop_id).and_then(Stop::location))
            .collect();
        if points.is_empty() {
            return Ok(Answer::empty(Advisory::NoGeometry));
        }
        Ok(Answer::new(points).with_advisory(Advisory::ShapeApproximatedFromStops))
    }

    /// The stretch of the suggestion's trip path between its two stops.
    pub async fn segment_for_suggestion(
        &self,
        suggestion: &SuggestedRouteOption,
    ) -> Result<Answer<LatLon>, QueryError> {
        let Some(trip_id) = &suggestion.trip_id else {
            return Ok(Answer::empty(Advisory::UnknownTrip));
        };
        let path = self.shape_for_trip(trip_id).await?;
        let (Some(from), Some(to)) = (
            suggestion.origin_stop.location(),
            suggestion.destination_stop.location(),
        ) else {
            return Ok(path);
        };
        Ok(Answer {
            items: extract_segment(&path.items, from, to),
            advisory: path.advisory,
        })
    }
}

/// Run `work` on a blocking worker. Dropping the returned future cancels
/// the flag handed to `work`.
async fn run_blocking<T, F>(work: F) -> Result<T, QueryError>
where
    T: Send + 'static,
    F: FnOnce(&CancelFlag) -> Result<T, QueryError> + Send + 'static,
{
    let cancel = CancelFlag::new();
    let guard = cancel.cancel_on_drop();
    let result = tokio::task::spawn_blocking(move || work(&cancel)).await;
    guard.disarm();
    result.map_err(|err| QueryError::Worker(err.to_string()))?
}
