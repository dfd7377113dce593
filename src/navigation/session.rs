//! One viewer session: the active dataset, the navigation state and the
//! derived view, plus bookkeeping for in-flight sheet loads.
//!
//! A load is started with [`CareerPathSession::begin_load`], runs elsewhere
//! (usually a tokio task), and is handed back through
//! [`CareerPathSession::finish_load`]. Only the most recently issued ticket
//! may change the session; older results are dropped, and everything is
//! dropped once the session has been closed.

use std::sync::Arc;

use log::{info, warn};
use time::OffsetDateTime;

use crate::graph_utils::graph::{CareerDataSet, CareerNode, Track};
use crate::ingest::loader::LoadError;
use super::state::{FilterSet, NavigationState, PathFilter, SubtrackSelection};
use super::view::{derive_view, resolve_detail, DerivedView, NodeDetail};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetOrigin {
    Fallback,
    Remote { loaded_at: OffsetDateTime },
}

/// Proof of which load attempt a result belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { nodes: usize, edges: usize },
    /// The previous dataset stays active; the error is kept as the session notice.
    Failed(LoadError),
    /// A newer load was started after this one.
    Superseded,
    /// The session was closed before the load finished.
    Discarded,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ViewKey {
    dataset_version: u64,
    state: NavigationState,
}

pub struct CareerPathSession {
    dataset: Arc<CareerDataSet>,
    dataset_version: u64,
    origin: DatasetOrigin,
    state: NavigationState,
    view: DerivedView,
    view_key: ViewKey,
    last_ticket: u64,
    in_flight: Option<u64>,
    notice: Option<LoadError>,
    closed: bool,
}

impl CareerPathSession {
    /// Start on `dataset` (normally the bundled fallback).
    pub fn new(dataset: Arc<CareerDataSet>) -> Self {
        Self::with_state(dataset, NavigationState::default())
    }

    pub fn with_state(dataset: Arc<CareerDataSet>, state: NavigationState) -> Self {
        let view = derive_view(&dataset, &state);
        let view_key = ViewKey { dataset_version: 0, state: state.clone() };
        Self {
            dataset,
            dataset_version: 0,
            origin: DatasetOrigin::Fallback,
            state,
            view,
            view_key,
            last_ticket: 0,
            in_flight: None,
            notice: None,
            closed: false,
        }
    }

    pub fn dataset(&self) -> &Arc<CareerDataSet> { &self.dataset }
    pub fn dataset_version(&self) -> u64 { self.dataset_version }
    pub fn origin(&self) -> DatasetOrigin { self.origin }
    pub fn state(&self) -> &NavigationState { &self.state }
    pub fn view(&self) -> &DerivedView { &self.view }

    pub fn active_track(&self) -> Track { self.state.active_track() }
    pub fn active_subtrack(&self) -> &SubtrackSelection { self.state.active_subtrack() }
    pub fn selected_node_id(&self) -> Option<&str> { self.state.selected_node_id() }
    pub fn search_query(&self) -> &str { self.state.search_query() }
    pub fn active_filters(&self) -> &FilterSet { self.state.active_filters() }

    pub fn selected_node(&self) -> Option<&CareerNode> {
        self.selected_node_id().and_then(|id| self.dataset.get_node(id))
    }

    pub fn selected_detail(&self) -> Option<NodeDetail<'_>> {
        self.selected_node_id().and_then(|id| resolve_detail(&self.dataset, id))
    }

    pub fn set_active_track(&mut self, track: Track) {
        self.state.set_active_track(track);
        self.refresh();
    }

    pub fn set_active_subtrack(&mut self, subtrack: impl Into<SubtrackSelection>) {
        self.state.set_active_subtrack(subtrack);
        self.refresh();
    }

    pub fn toggle_filter(&mut self, filter: impl Into<PathFilter>) {
        self.state.toggle_filter(filter);
        self.refresh();
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.state.set_search_query(query);
        self.refresh();
    }

    pub fn select_node(&mut self, id: &str) {
        self.state.select_node(id, &self.dataset);
        self.refresh();
    }

    pub fn clear_selection(&mut self) {
        self.state.clear_selection();
        self.refresh();
    }

    /// Inbound event from the graph canvas or a detail-panel link.
    pub fn on_node_activated(&mut self, id: &str) {
        self.select_node(id);
    }

    fn refresh(&mut self) {
        if self.view_key.dataset_version == self.dataset_version && self.view_key.state == self.state {
            return;
        }
        self.view = derive_view(&self.dataset, &self.state);
        self.view_key = ViewKey { dataset_version: self.dataset_version, state: self.state.clone() };
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Most recent load failure, kept until dismissed or a load succeeds.
    pub fn notice(&self) -> Option<&LoadError> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Register a new load attempt. Any attempt still in flight is superseded.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.last_ticket += 1;
        self.in_flight = Some(self.last_ticket);
        LoadTicket { generation: self.last_ticket }
    }

    /// Apply the result of the attempt identified by `ticket`.
    ///
    /// The dataset is swapped in one assignment, so readers only ever see the
    /// old or the new one. A failure leaves the current dataset active.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<CareerDataSet, LoadError>) -> LoadOutcome {
        if self.closed {
            info!("session closed, discarding load #{}", ticket.generation);
            return LoadOutcome::Discarded;
        }
        if ticket.generation != self.last_ticket {
            info!("load #{} superseded by #{}", ticket.generation, self.last_ticket);
            return LoadOutcome::Superseded;
        }
        self.in_flight = None;

        match result {
            Ok(dataset) => {
                let (nodes, edges) = (dataset.node_count(), dataset.edge_count());
                self.dataset = Arc::new(dataset);
                self.dataset_version += 1;
                self.origin = DatasetOrigin::Remote { loaded_at: OffsetDateTime::now_utc() };
                self.notice = None;
                self.refresh();
                info!("load #{} applied: {} nodes, {} edges", ticket.generation, nodes, edges);
                LoadOutcome::Applied { nodes, edges }
            }
            Err(e) => {
                warn!("load #{} failed, keeping current dataset: {}", ticket.generation, e);
                self.notice = Some(e.clone());
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Tear the session down. Loads still in flight will be discarded.
    pub fn close(&mut self) {
        self.closed = true;
        self.in_flight = None;
    }
}
