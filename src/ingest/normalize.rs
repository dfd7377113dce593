use log::debug;
use serde::{Deserialize, Serialize};

use crate::graph_utils::graph::{
    CareerDataSet, CareerEdge, CareerNode, EdgeType, NodeId, PathType, Position, Stage, Track,
};
use super::csv_table::CsvRecord;

// Leading list markers people type into sheet cells
const BULLETS: &[char] = &['・', '-', '*', '•', '●', '○', '◯', '□', '■'];

/// Columns a nodes sheet must carry for any row to survive normalization.
pub const NODE_KEY_COLUMNS: [&str; 3] = ["id", "track", "pathType"];
pub const EDGE_KEY_COLUMNS: [&str; 2] = ["source", "target"];

/// Fallbacks for cells that hold an unrecognized track or path type.
///
/// Defaults to development / common, which is how the published sheets
/// have always been read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizePolicy {
    pub default_track: Track,
    pub default_path_type: PathType,
}

impl Default for NormalizePolicy {
    fn default() -> Self {
        Self { default_track: Track::Development, default_path_type: PathType::Common }
    }
}

/// Split a multi-valued cell on line breaks and `|`.
///
/// Pieces keep their order of appearance (lines first, then pipe segments
/// within a line), are trimmed and lose any leading bullet run. Empty pieces
/// are discarded.
pub fn split_list(cell: &str) -> Vec<String> {
    cell.split(['\n', '\r'])
        .flat_map(|line| line.split('|'))
        .map(strip_bullet)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_bullet(piece: &str) -> &str {
    piece.trim().trim_start_matches(BULLETS).trim()
}

/// Finite number or nothing. A blank cell reads as 0, like an empty
/// spreadsheet value does.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// First digit 1-6 anywhere in the text ("6", "G6", "段階6"), else stage 1.
pub fn parse_stage(raw: &str) -> Stage {
    raw.chars()
        .find_map(|c| c.to_digit(10).and_then(|d| u8::try_from(d).ok()).and_then(Stage::new))
        .unwrap_or_default()
}

pub fn parse_track(raw: &str, policy: &NormalizePolicy) -> Track {
    let s = raw.trim();
    Track::from_token(s)
        .or_else(|| Track::from_label(s))
        .unwrap_or(policy.default_track)
}

pub fn parse_path_type(raw: &str, policy: &NormalizePolicy) -> PathType {
    let s = raw.trim().to_lowercase();
    if let Some(p) = PathType::from_token(&s) {
        return p;
    }
    match s.as_str() {
        "sp" | "特化" | "スペシャリスト" => PathType::Specialist,
        "mg" | "管理" | "マネージャー" => PathType::Manager,
        "共通" => PathType::Common,
        _ => policy.default_path_type,
    }
}

pub fn parse_edge_type(raw: &str) -> EdgeType {
    match raw.trim().to_lowercase().as_str() {
        "optional" => EdgeType::Optional,
        "cross-track" | "cross_track" | "crosstrack" => EdgeType::CrossTrack,
        _ => EdgeType::Normal,
    }
}

fn optional_text(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_string())
}

/// Build a node from one sheet row; `None` when it lacks an id, track or path type.
pub fn normalize_node(record: &CsvRecord, policy: &NormalizePolicy) -> Option<CareerNode> {
    if !NODE_KEY_COLUMNS.iter().all(|c| record.has(c)) {
        return None;
    }
    let position = Position::new(
        parse_number(record.get("position_x")).unwrap_or(Position::FALLBACK.x),
        parse_number(record.get("position_y")).unwrap_or(Position::FALLBACK.y),
    );
    Some(CareerNode {
        id: record.get("id").to_string(),
        track: parse_track(record.get("track"), policy),
        subtrack: optional_text(record.get("subtrack")),
        stage: parse_stage(record.get("stage")),
        path_type: parse_path_type(record.get("pathType"), policy),
        title_ja: record.get("titleJa").to_string(),
        short_label: record.get("shortLabel").to_string(),
        summary: record.get("summary").to_string(),
        required_skills: split_list(record.get("requiredSkills")),
        required_experience: split_list(record.get("requiredExperience")),
        recommended_certs: split_list(record.get("recommendedCerts")),
        tools_environments_languages: split_list(record.get("toolsEnvironmentsLanguages")),
        next_step_conditions: split_list(record.get("nextStepConditions")),
        tags: split_list(record.get("tags")),
        can_coexist_with: split_list(record.get("canCoexistWith")),
        related_node_ids: split_list(record.get("relatedNodeIds")),
        position,
        style_key: optional_text(record.get("styleKey")),
        branch_note: optional_text(record.get("branchNote")),
    })
}

/// Build an edge from one sheet row; `None` when either endpoint is blank.
pub fn normalize_edge(record: &CsvRecord) -> Option<CareerEdge> {
    if !EDGE_KEY_COLUMNS.iter().all(|c| record.has(c)) {
        return None;
    }
    Some(CareerEdge {
        source: record.get("source").to_string(),
        target: record.get("target").to_string(),
        edge_type: parse_edge_type(record.get("type")),
        label: optional_text(record.get("label")),
    })
}

/// Counts of what normalization threw away. Never surfaced per row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub rejected_nodes: usize,
    pub rejected_edges: usize,
    pub duplicate_ids: Vec<NodeId>,
}

pub fn normalize_dataset(
    node_records: &[CsvRecord],
    edge_records: &[CsvRecord],
    policy: &NormalizePolicy,
) -> (CareerDataSet, NormalizeReport) {
    let nodes: Vec<CareerNode> = node_records.iter().filter_map(|r| normalize_node(r, policy)).collect();
    let edges: Vec<CareerEdge> = edge_records.iter().filter_map(normalize_edge).collect();
    let rejected_nodes = node_records.len() - nodes.len();
    let rejected_edges = edge_records.len() - edges.len();
    if rejected_nodes > 0 || rejected_edges > 0 {
        debug!("normalization dropped {} node rows and {} edge rows", rejected_nodes, rejected_edges);
    }
    let (dataset, duplicate_ids) = CareerDataSet::with_unique_ids(nodes, edges);
    (dataset, NormalizeReport { rejected_nodes, rejected_edges, duplicate_ids })
}
