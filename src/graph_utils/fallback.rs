//! Bundled dataset shown before the first sheet load completes, and kept for
//! good if loading never succeeds.
//!
//! Development and infrastructure are authored once as templates and cloned
//! into one copy per subtrack; IT support and the cross-track links are fixed.

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::graph::{CareerDataSet, CareerEdge, CareerNode, PathType, Position, Track};
use crate::ingest::csv_table::CsvTable;
use crate::ingest::normalize::{normalize_edge, normalize_node, NormalizePolicy};

const TEMPLATE_NODES_CSV: &str = include_str!("../../assets/fallback/template_nodes.csv");
const TEMPLATE_EDGES_CSV: &str = include_str!("../../assets/fallback/template_edges.csv");
const IT_SUPPORT_NODES_CSV: &str = include_str!("../../assets/fallback/it_support_nodes.csv");
const FIXED_EDGES_CSV: &str = include_str!("../../assets/fallback/fixed_edges.csv");

struct SubtrackVariant {
    track: Track,
    template_prefix: &'static str,
    id_prefix: &'static str,
    subtrack: &'static str,
    specialist_x: f64,
    manager_x: f64,
}

const VARIANTS: [SubtrackVariant; 4] = [
    SubtrackVariant {
        track: Track::Development,
        template_prefix: "dev",
        id_prefix: "dev-web",
        subtrack: "Webアプリケーション",
        specialist_x: 80.0,
        manager_x: 260.0,
    },
    SubtrackVariant {
        track: Track::Development,
        template_prefix: "dev",
        id_prefix: "dev-mobile",
        subtrack: "モバイルアプリ",
        specialist_x: 500.0,
        manager_x: 680.0,
    },
    SubtrackVariant {
        track: Track::Infrastructure,
        template_prefix: "infra",
        id_prefix: "infra-server",
        subtrack: "サーバー",
        specialist_x: 80.0,
        manager_x: 260.0,
    },
    SubtrackVariant {
        track: Track::Infrastructure,
        template_prefix: "infra",
        id_prefix: "infra-network",
        subtrack: "ネットワーク",
        specialist_x: 500.0,
        manager_x: 680.0,
    },
];

impl SubtrackVariant {
    fn owns(&self, id: &str) -> bool {
        self.template_rest(id).is_some()
    }

    fn template_rest<'a>(&self, id: &'a str) -> Option<&'a str> {
        id.strip_prefix(self.template_prefix)?.strip_prefix('-')
    }

    // Ids from other tracks pass through untouched
    fn rewrite_id(&self, id: &str) -> String {
        match self.template_rest(id) {
            Some(rest) => format!("{}-{}", self.id_prefix, rest),
            None => id.to_string(),
        }
    }

    fn clone_node(&self, node: &CareerNode) -> CareerNode {
        let x = if node.path_type == PathType::Specialist { self.specialist_x } else { self.manager_x };
        CareerNode {
            id: self.rewrite_id(&node.id),
            subtrack: Some(self.subtrack.to_string()),
            can_coexist_with: node.can_coexist_with.iter().map(|id| self.rewrite_id(id)).collect(),
            related_node_ids: node.related_node_ids.iter().map(|id| self.rewrite_id(id)).collect(),
            position: Position::new(x, node.stage.lane_y()),
            ..node.clone()
        }
    }

    fn clone_edge(&self, edge: &CareerEdge) -> CareerEdge {
        CareerEdge {
            source: self.rewrite_id(&edge.source),
            target: self.rewrite_id(&edge.target),
            ..edge.clone()
        }
    }
}

fn read_nodes(text: &str) -> Vec<CareerNode> {
    let policy = NormalizePolicy::default();
    CsvTable::parse(text)
        .records
        .iter()
        .filter_map(|r| normalize_node(r, &policy))
        .collect()
}

fn read_edges(text: &str) -> Vec<CareerEdge> {
    CsvTable::parse(text).records.iter().filter_map(normalize_edge).collect()
}

fn build_fallback() -> CareerDataSet {
    let template_nodes = read_nodes(TEMPLATE_NODES_CSV);
    let template_edges = read_edges(TEMPLATE_EDGES_CSV);

    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for variant in &VARIANTS {
        nodes.extend(
            template_nodes
                .iter()
                .filter(|n| n.track == variant.track)
                .map(|n| variant.clone_node(n)),
        );
        edges.extend(
            template_edges
                .iter()
                .filter(|e| variant.owns(&e.source))
                .map(|e| variant.clone_edge(e)),
        );
    }
    nodes.extend(read_nodes(IT_SUPPORT_NODES_CSV));
    edges.extend(read_edges(FIXED_EDGES_CSV));

    let (dataset, duplicates) = CareerDataSet::with_unique_ids(nodes, edges);
    debug_assert!(duplicates.is_empty(), "bundled dataset repeats ids: {:?}", duplicates);
    dataset
}

static FALLBACK: Lazy<Arc<CareerDataSet>> = Lazy::new(|| Arc::new(build_fallback()));

/// Shared handle to the bundled dataset.
pub fn fallback_dataset() -> Arc<CareerDataSet> {
    Arc::clone(&FALLBACK)
}
