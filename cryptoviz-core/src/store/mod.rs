//! Market state store
//!
//! Holds the latest fetched batch together with the user's timeframe and
//! filter selection. Every committed change is followed by a [`StoreEvent`]
//! on a broadcast channel, sent before the commit call returns.
//!
//! Fetches are tagged with a monotonically increasing [`RequestId`]. Only
//! the most recently issued request may commit; anything older is stale and
//! dropped, so a slow response can never overwrite fresher state.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::market_data::{MarketDataRecord, Timeframe};
use crate::market_scanner::FilterCriteria;

pub type RequestId = u64;

const EVENT_BUFFER: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum MarketStatus {
    Idle,
    Loading { request_id: RequestId },
    Ready,
    Failed { message: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    StatusChanged(MarketStatus),
    RecordsReplaced { request_id: RequestId, count: usize },
    TimeframeChanged(Timeframe),
    CriteriaChanged(FilterCriteria),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitOutcome {
    Applied,
    Stale,
}

/// Point-in-time copy of the store
#[derive(Clone, Debug, Serialize)]
pub struct StoreSnapshot {
    pub status: MarketStatus,
    pub timeframe: Timeframe,
    pub criteria: FilterCriteria,
    pub record_count: usize,
    pub latest_request: RequestId,
    pub last_updated: Option<DateTime<Utc>>,
}

struct StoreState {
    status: MarketStatus,
    records: Arc<Vec<MarketDataRecord>>,
    timeframe: Timeframe,
    criteria: FilterCriteria,
    latest_request: RequestId,
    last_updated: Option<DateTime<Utc>>,
}

pub struct MarketStore {
    state: RwLock<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl MarketStore {
    pub fn new(timeframe: Timeframe, criteria: FilterCriteria) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            state: RwLock::new(StoreState {
                status: MarketStatus::Idle,
                records: Arc::new(Vec::new()),
                timeframe,
                criteria,
                latest_request: 0,
                last_updated: None,
            }),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Issue a new request id and enter the loading state.
    /// Any request issued earlier becomes stale.
    pub fn begin_request(&self) -> RequestId {
        let mut state = self.state.write();
        state.latest_request += 1;
        let request_id = state.latest_request;
        state.status = MarketStatus::Loading { request_id };
        self.emit(StoreEvent::StatusChanged(state.status.clone()));
        request_id
    }

    /// Commit the outcome of `request_id` unless a newer request was issued.
    pub fn complete_request(
        &self,
        request_id: RequestId,
        result: Result<Vec<MarketDataRecord>, String>,
    ) -> CommitOutcome {
        let mut state = self.state.write();
        if request_id != state.latest_request {
            debug!(request_id, latest = state.latest_request, "Discarding stale response");
            return CommitOutcome::Stale;
        }

        match result {
            Ok(records) => {
                let count = records.len();
                state.records = Arc::new(records);
                state.status = MarketStatus::Ready;
                state.last_updated = Some(Utc::now());
                self.emit(StoreEvent::RecordsReplaced { request_id, count });
            }
            Err(message) => {
                state.status = MarketStatus::Failed { message };
            }
        }
        self.emit(StoreEvent::StatusChanged(state.status.clone()));
        CommitOutcome::Applied
    }

    /// Returns false when the timeframe was already selected
    pub fn set_timeframe(&self, timeframe: Timeframe) -> bool {
        let mut state = self.state.write();
        if state.timeframe == timeframe {
            return false;
        }
        state.timeframe = timeframe;
        self.emit(StoreEvent::TimeframeChanged(timeframe));
        true
    }

    /// Returns false when the criteria are unchanged
    pub fn set_criteria(&self, criteria: FilterCriteria) -> bool {
        let mut state = self.state.write();
        if state.criteria == criteria {
            return false;
        }
        state.criteria = criteria.clone();
        self.emit(StoreEvent::CriteriaChanged(criteria));
        true
    }

    /// Restore the default timeframe and criteria in one commit.
    /// Returns true when the timeframe changed, so the caller knows to refetch.
    pub fn reset_selection(&self) -> bool {
        let mut state = self.state.write();
        let timeframe = Timeframe::default();
        let criteria = FilterCriteria::default();

        let timeframe_changed = state.timeframe != timeframe;
        if timeframe_changed {
            state.timeframe = timeframe;
            self.emit(StoreEvent::TimeframeChanged(timeframe));
        }
        if state.criteria != criteria {
            state.criteria = criteria.clone();
            self.emit(StoreEvent::CriteriaChanged(criteria));
        }
        timeframe_changed
    }

    pub fn records(&self) -> Arc<Vec<MarketDataRecord>> {
        self.state.read().records.clone()
    }

    pub fn status(&self) -> MarketStatus {
        self.state.read().status.clone()
    }

    pub fn timeframe(&self) -> Timeframe {
        self.state.read().timeframe
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.state.read().criteria.clone()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read();
        StoreSnapshot {
            status: state.status.clone(),
            timeframe: state.timeframe,
            criteria: state.criteria.clone(),
            record_count: state.records.len(),
            latest_request: state.latest_request,
            last_updated: state.last_updated,
        }
    }

    // Called with the state lock held so events leave in commit order.
    fn emit(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }
}

impl Default for MarketStore {
    fn default() -> Self {
        Self::new(Timeframe::default(), FilterCriteria::default())
    }
}
