//! Pure derivation of what the graph canvas and detail panel show.
//!
//! Nothing here mutates; every function is a deterministic function of the
//! dataset and a `NavigationState`, cheap enough to rerun on every change.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use crate::graph_utils::graph::{CareerDataSet, CareerEdge, CareerNode, NodeId, Track};
use super::state::{NavigationState, SubtrackSelection};

/// Subtrack tabs offered when a track has no subtrack data at all.
pub fn default_subtracks(track: Track) -> &'static [&'static str] {
    match track {
        Track::Development => &["Webアプリケーション", "モバイルアプリ"],
        Track::Infrastructure => &["サーバー", "ネットワーク"],
        Track::ItSupport => &["ITサポート", "情シス支援", "PMO支援"],
    }
}

/// Case-folded code-point order with the raw text as tie-break, so the order
/// is total. This is not Japanese collation: kana and kanji sort by code point.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

pub fn has_subtrack_data(dataset: &CareerDataSet, track: Track) -> bool {
    dataset.nodes_in_track(track).any(CareerNode::has_subtrack)
}

/// Distinct non-empty subtracks in `track`, sorted, or the track's defaults.
pub fn available_subtracks(dataset: &CareerDataSet, track: Track) -> Vec<String> {
    let mut labels: Vec<String> = dataset
        .nodes_in_track(track)
        .filter_map(|n| n.subtrack.as_deref())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    if labels.is_empty() {
        return default_subtracks(track).iter().map(|s| s.to_string()).collect();
    }
    labels.sort_by(|a, b| compare_labels(a, b));
    labels
}

/// Case-insensitive substring match over the searchable text of a node.
/// `needle` must already be lower-cased.
pub fn matches_query(node: &CareerNode, needle: &str) -> bool {
    let hit = |text: &str| text.to_lowercase().contains(needle);
    hit(&node.title_ja)
        || hit(&node.short_label)
        || hit(&node.summary)
        || node.subtrack.as_deref().is_some_and(hit)
        || node.required_skills.iter().any(|s| hit(s.as_str()))
        || node.tags.iter().any(|s| hit(s.as_str()))
        || node.recommended_certs.iter().any(|s| hit(s.as_str()))
        || node.tools_environments_languages.iter().any(|s| hit(s.as_str()))
}

/// Track, subtrack, path-type and search filters, applied in that order.
pub fn visible_nodes<'a>(dataset: &'a CareerDataSet, state: &NavigationState) -> Vec<&'a CareerNode> {
    let track = state.active_track();
    let mut nodes: Vec<&CareerNode> = dataset.nodes_in_track(track).collect();

    // Only narrow by subtrack when the track actually carries subtrack data
    if let SubtrackSelection::Named(name) = state.active_subtrack()
        && has_subtrack_data(dataset, track)
    {
        nodes.retain(|n| n.subtrack_is(name));
    }

    let filters = state.active_filters();
    if !filters.is_all() {
        nodes.retain(|n| filters.allows(n.path_type));
    }

    let query = state.search_query().trim();
    if !query.is_empty() {
        let needle = query.to_lowercase();
        nodes.retain(|n| matches_query(n, &needle));
    }
    nodes
}

/// Edges whose endpoints are BOTH among `nodes`.
pub fn visible_edges<'a>(dataset: &'a CareerDataSet, nodes: &[&CareerNode]) -> Vec<&'a CareerEdge> {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    dataset
        .edges
        .iter()
        .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
        .collect()
}

/// Opposite endpoints of every edge touching `selected`, over the full edge set.
pub fn connected_ids(dataset: &CareerDataSet, selected: Option<&str>) -> BTreeSet<NodeId> {
    let Some(selected) = selected else {
        return BTreeSet::new();
    };
    dataset
        .edges
        .iter()
        .filter_map(|e| e.opposite(selected))
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileHighlight {
    Selected,
    Connected,
    Plain,
}

/// Everything the presentation layer renders for one navigation state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DerivedView {
    pub visible_nodes: Vec<CareerNode>,
    pub visible_edges: Vec<CareerEdge>,
    pub connected_ids: BTreeSet<NodeId>,
    pub available_subtracks: Vec<String>,
    pub selected_node_id: Option<NodeId>,
}

impl DerivedView {
    pub fn contains_node(&self, id: &str) -> bool {
        self.visible_nodes.iter().any(|n| n.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.visible_nodes.len()
    }

    pub fn highlight(&self, id: &str) -> TileHighlight {
        if self.selected_node_id.as_deref() == Some(id) {
            TileHighlight::Selected
        } else if self.connected_ids.contains(id) {
            TileHighlight::Connected
        } else {
            TileHighlight::Plain
        }
    }
}

pub fn derive_view(dataset: &CareerDataSet, state: &NavigationState) -> DerivedView {
    let nodes = visible_nodes(dataset, state);
    let edges = visible_edges(dataset, &nodes);
    DerivedView {
        visible_edges: edges.into_iter().cloned().collect(),
        visible_nodes: nodes.into_iter().cloned().collect(),
        connected_ids: connected_ids(dataset, state.selected_node_id()),
        available_subtracks: available_subtracks(dataset, state.active_track()),
        selected_node_id: state.selected_node_id().map(str::to_string),
    }
}

/// The selected node with its cross-references resolved for display.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetail<'a> {
    pub node: &'a CareerNode,
    pub related: Vec<&'a CareerNode>,
    pub coexist: Vec<&'a CareerNode>,
}

/// `None` for ids that do not resolve; dangling cross-references are dropped.
pub fn resolve_detail<'a>(dataset: &'a CareerDataSet, id: &str) -> Option<NodeDetail<'a>> {
    let node = dataset.get_node(id)?;
    Some(NodeDetail {
        node,
        related: dataset.resolve_ids(&node.related_node_ids),
        coexist: dataset.resolve_ids(&node.can_coexist_with),
    })
}
