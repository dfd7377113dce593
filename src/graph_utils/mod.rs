pub mod fallback;
pub mod graph;
