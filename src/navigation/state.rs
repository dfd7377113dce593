use std::collections::BTreeSet;
use std::fmt;

use crate::graph_utils::graph::{CareerDataSet, NodeId, PathType, Track};

/// Sentinel token the UI uses for "no narrowing" in subtrack and path filters.
pub const ALL_TOKEN: &str = "all";

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SubtrackSelection {
    #[default]
    All,
    Named(String),
}

impl SubtrackSelection {
    pub fn parse(raw: &str) -> Self {
        if raw == ALL_TOKEN {
            SubtrackSelection::All
        } else {
            SubtrackSelection::Named(raw.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, SubtrackSelection::All)
    }

    pub fn as_str(&self) -> &str {
        match self {
            SubtrackSelection::All => ALL_TOKEN,
            SubtrackSelection::Named(name) => name,
        }
    }
}

impl From<&str> for SubtrackSelection {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for SubtrackSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathFilter {
    All,
    Only(PathType),
}

impl PathFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == ALL_TOKEN {
            return Some(PathFilter::All);
        }
        PathType::from_token(raw).map(PathFilter::Only)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathFilter::All => ALL_TOKEN,
            PathFilter::Only(p) => p.as_str(),
        }
    }
}

impl From<PathType> for PathFilter {
    fn from(p: PathType) -> Self {
        PathFilter::Only(p)
    }
}

/// Active path-type filters.
///
/// Never empty, and `All` never sits alongside a concrete path type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FilterSet(BTreeSet<PathFilter>);

impl Default for FilterSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FilterSet {
    pub fn all() -> Self {
        Self(BTreeSet::from([PathFilter::All]))
    }

    pub fn is_all(&self) -> bool {
        self.0.contains(&PathFilter::All)
    }

    pub fn contains(&self, filter: PathFilter) -> bool {
        self.0.contains(&filter)
    }

    pub fn allows(&self, path_type: PathType) -> bool {
        self.is_all() || self.0.contains(&PathFilter::Only(path_type))
    }

    pub fn toggle(&mut self, filter: PathFilter) {
        if filter == PathFilter::All {
            *self = Self::all();
            return;
        }
        self.0.remove(&PathFilter::All);
        if !self.0.remove(&filter) {
            self.0.insert(filter);
        }
        if self.0.is_empty() {
            *self = Self::all();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = PathFilter> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// Everything the views depend on besides the dataset itself.
///
/// All transitions are synchronous and total.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NavigationState {
    active_track: Track,
    active_subtrack: SubtrackSelection,
    selected_node_id: Option<NodeId>,
    search_query: String,
    active_filters: FilterSet,
}

impl NavigationState {
    pub fn new(track: Track) -> Self {
        Self { active_track: track, ..Self::default() }
    }

    pub fn active_track(&self) -> Track { self.active_track }
    pub fn active_subtrack(&self) -> &SubtrackSelection { &self.active_subtrack }
    pub fn selected_node_id(&self) -> Option<&str> { self.selected_node_id.as_deref() }
    pub fn search_query(&self) -> &str { &self.search_query }
    pub fn active_filters(&self) -> &FilterSet { &self.active_filters }

    /// Switching track drops the subtrack and the selection of the old track.
    pub fn set_active_track(&mut self, track: Track) {
        self.active_track = track;
        self.active_subtrack = SubtrackSelection::All;
        self.selected_node_id = None;
    }

    pub fn set_active_subtrack(&mut self, subtrack: impl Into<SubtrackSelection>) {
        self.active_subtrack = subtrack.into();
        self.selected_node_id = None;
    }

    pub fn toggle_filter(&mut self, filter: impl Into<PathFilter>) {
        self.active_filters.toggle(filter.into());
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    /// Select `id`, jumping to its track first when it lives elsewhere.
    ///
    /// Ids missing from `dataset` are still recorded; the detail view shows
    /// its placeholder for them.
    pub fn select_node(&mut self, id: &str, dataset: &CareerDataSet) {
        if let Some(node) = dataset.get_node(id)
            && node.track != self.active_track
        {
            self.set_active_track(node.track);
        }
        self.selected_node_id = Some(id.to_string());
    }

    pub fn clear_selection(&mut self) {
        self.selected_node_id = None;
    }
}
