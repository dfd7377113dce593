use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// Node ids are the spreadsheet's own keys, e.g. "dev-web-sp-3"
pub type NodeId = String;

/// Top-level career domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Track {
    #[default]
    Development,
    Infrastructure,
    ItSupport,
}

impl Track {
    pub const ALL: [Track; 3] = [Track::Development, Track::Infrastructure, Track::ItSupport];

    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Development => "development",
            Track::Infrastructure => "infrastructure",
            Track::ItSupport => "it-support",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Track::Development => "開発",
            Track::Infrastructure => "インフラ",
            Track::ItSupport => "ITサポート",
        }
    }

    /// Exact, case-sensitive match on the canonical token.
    pub fn from_token(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Match on the localized display label used in hand-edited sheets.
    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == s)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    Specialist,
    Manager,
    #[default]
    Common,
}

impl PathType {
    pub const ALL: [PathType; 3] = [PathType::Specialist, PathType::Manager, PathType::Common];

    pub fn as_str(&self) -> &'static str {
        match self {
            PathType::Specialist => "specialist",
            PathType::Manager => "manager",
            PathType::Common => "common",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PathType::Specialist => "Specialist",
            PathType::Manager => "Manager",
            PathType::Common => "共通",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seniority level, always within 1..=6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stage(u8);

impl Stage {
    pub const MIN: Stage = Stage(1);
    pub const MAX: Stage = Stage(6);

    // Vertical lane layout shared by the bundled dataset: stage 6 sits on top
    const LANE_Y_BASE: f64 = 50.0;
    const LANE_Y_GAP: f64 = 150.0;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN.0..=Self::MAX.0).contains(&value).then_some(Stage(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> String {
        format!("段階{}", self.0)
    }

    pub fn lane_y(&self) -> f64 {
        Self::LANE_Y_BASE + f64::from(Self::MAX.0 - self.0) * Self::LANE_Y_GAP
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<u8> for Stage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Stage::new(value).ok_or_else(|| format!("stage {} is outside 1..=6", value))
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> Self {
        stage.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
    #[default]
    Normal,
    Optional,
    CrossTrack,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Normal => "normal",
            EdgeType::Optional => "optional",
            EdgeType::CrossTrack => "cross-track",
        }
    }
}

/// Layout hint in virtual canvas space. Supplied by the data, never computed here.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const FALLBACK: Position = Position { x: 180.0, y: 50.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::FALLBACK
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerNode {
    pub id: NodeId,
    pub track: Track,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtrack: Option<String>,
    pub stage: Stage,
    pub path_type: PathType,
    pub title_ja: String,
    pub short_label: String,
    pub summary: String,
    pub required_skills: Vec<String>,
    pub required_experience: Vec<String>,
    pub recommended_certs: Vec<String>,
    pub tools_environments_languages: Vec<String>,
    pub next_step_conditions: Vec<String>,
    pub tags: Vec<String>,
    // Stored one-directionally; never mirrored onto the referenced node
    pub can_coexist_with: Vec<NodeId>,
    pub related_node_ids: Vec<NodeId>,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_note: Option<String>,
}

impl CareerNode {
    pub fn has_subtrack(&self) -> bool {
        self.subtrack.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn subtrack_is(&self, name: &str) -> bool {
        self.subtrack.as_deref() == Some(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerEdge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CareerEdge {
    /// The endpoint opposite `id`, if this edge touches `id` at all.
    pub fn opposite(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(&self.target)
        } else if self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// A complete, immutable snapshot of the career graph.
///
/// Built once per successful load and replaced wholesale on reload. Edge
/// endpoints and cross-reference ids are not checked against the node set;
/// lookups simply come back empty for dangling ids.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerDataSet {
    pub nodes: Vec<CareerNode>,
    pub edges: Vec<CareerEdge>,
}

impl CareerDataSet {
    /// Assemble a dataset, keeping the first node for any repeated id.
    /// Returns the dataset plus the ids that were dropped as duplicates.
    pub fn with_unique_ids(nodes: Vec<CareerNode>, edges: Vec<CareerEdge>) -> (Self, Vec<NodeId>) {
        let mut seen: HashSet<NodeId> = HashSet::with_capacity(nodes.len());
        let mut duplicates = Vec::new();
        let mut kept = Vec::with_capacity(nodes.len());
        for node in nodes {
            if seen.insert(node.id.clone()) {
                kept.push(node);
            } else {
                duplicates.push(node.id);
            }
        }
        (Self { nodes: kept, edges }, duplicates)
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.edges.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub fn get_node(&self, id: &str) -> Option<&CareerNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn index_by_id(&self) -> HashMap<&str, &CareerNode> {
        self.nodes.iter().map(|n| (n.id.as_str(), n)).collect()
    }

    /// Resolve ids to nodes in order, silently skipping dangling ids.
    pub fn resolve_ids<'a, I>(&'a self, ids: I) -> Vec<&'a CareerNode>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let index = self.index_by_id();
        ids.into_iter()
            .filter_map(|id| index.get(id.as_ref()).copied())
            .collect()
    }

    pub fn nodes_in_track(&self, track: Track) -> impl Iterator<Item = &CareerNode> {
        self.nodes.iter().filter(move |n| n.track == track)
    }
}
